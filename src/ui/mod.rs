use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use gpui::{
    AnyElement, App, AppContext, Context, FocusHandle, InteractiveElement, IntoElement,
    KeyDownEvent, ObjectFit, ParentElement, Render, RenderImage, Styled, StyledImage,
    TitlebarOptions, Window, WindowOptions, div, img, px,
};
use gpui_component::Root;

use crate::{
    game::GameCommand,
    pipeline::{ComposedFrame, Hud},
};

mod hud;
mod render_util;

use render_util::frame_to_image;

pub const WINDOW_TITLE: &str = "Fitness Circle Game";

/// Opens the game window. Frames arrive on `frame_rx`; key presses leave on `command_tx`.
pub fn launch_ui(
    app: &mut App,
    frame_rx: Receiver<ComposedFrame>,
    command_tx: Sender<GameCommand>,
) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some(WINDOW_TITLE.into()),
            appears_transparent: false,
            traffic_light_position: None,
        }),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|cx| GameView::new(frame_rx, command_tx, cx));
        app.new(|cx| Root::new(view, window, cx))
    })?;

    app.on_window_closed(|cx| cx.quit()).detach();
    Ok(())
}

struct GameView {
    frame_rx: Receiver<ComposedFrame>,
    command_tx: Sender<GameCommand>,
    focus_handle: FocusHandle,
    latest_image: Option<Arc<RenderImage>>,
    latest_hud: Option<Hud>,
    frame_size: Option<(u32, u32)>,
}

impl GameView {
    fn new(
        frame_rx: Receiver<ComposedFrame>,
        command_tx: Sender<GameCommand>,
        cx: &mut Context<'_, Self>,
    ) -> Self {
        Self {
            frame_rx,
            command_tx,
            focus_handle: cx.focus_handle(),
            latest_image: None,
            latest_hud: None,
            frame_size: None,
        }
    }

    fn drain_frames(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        loop {
            match self.frame_rx.try_recv() {
                Ok(composed) => {
                    if let Some(image) = frame_to_image(&composed.frame) {
                        self.replace_latest_image(image, window, cx);
                    }
                    self.frame_size = Some((composed.frame.width, composed.frame.height));
                    self.latest_hud = Some(composed.hud);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("game loop finished, closing window");
                    cx.quit();
                    break;
                }
            }
        }
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // Without this the sprite atlas keeps every frame.
            cx.drop_image(old_image, Some(window));
        }
    }

    fn on_key(&mut self, event: &KeyDownEvent, _: &mut Window, cx: &mut Context<'_, Self>) {
        let Some(command) = GameCommand::from_key(&event.keystroke.key) else {
            return;
        };
        if self.command_tx.send(command).is_err() {
            cx.quit();
        }
    }

    fn render_stage(&self, window: &Window) -> AnyElement {
        let (Some(image), Some((width, height))) = (&self.latest_image, self.frame_size) else {
            return div()
                .text_sm()
                .text_color(gpui::rgb(0x8b95a5))
                .child("Waiting for camera...")
                .into_any_element();
        };

        let viewport = window.viewport_size();
        let scale = (f32::from(viewport.width) / width as f32)
            .min(f32::from(viewport.height) / height as f32)
            .max(f32::EPSILON);

        let mut stage = div()
            .relative()
            .w(px(width as f32 * scale))
            .h(px(height as f32 * scale))
            .child(
                img(image.clone())
                    .size_full()
                    .object_fit(ObjectFit::Contain),
            );
        if let Some(hud) = &self.latest_hud {
            stage = stage.children(hud::render_hud(hud, scale));
        }
        stage.into_any_element()
    }
}

impl Render for GameView {
    fn render(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) -> impl IntoElement {
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        self.drain_frames(window, cx);
        if !self.focus_handle.is_focused(window) {
            window.focus(&self.focus_handle);
        }

        div()
            .track_focus(&self.focus_handle)
            .on_key_down(cx.listener(Self::on_key))
            .size_full()
            .flex()
            .items_center()
            .justify_center()
            .bg(gpui::rgb(0x000000))
            .child(self.render_stage(window))
    }
}
