use gpui::{AnyElement, IntoElement, ParentElement, Styled, div, px};

use crate::pipeline::{Hud, display::INSTRUCTIONS};

const SCORE_BADGE: (f32, f32) = (72.0, 24.0);

/// Text layered over the stage. `scale` maps frame pixels to window pixels.
pub(super) fn render_hud(hud: &Hud, scale: f32) -> Vec<AnyElement> {
    let status_color = if hud.body_detected {
        gpui::rgb(0x22c55e)
    } else {
        gpui::rgb(0xef4444)
    };

    let stats = div()
        .absolute()
        .top(px(10.0))
        .left(px(10.0))
        .flex()
        .flex_col()
        .gap_1()
        .child(
            div()
                .text_xl()
                .text_color(gpui::rgb(0x22c55e))
                .child(hud.score_line()),
        )
        .child(
            div()
                .text_sm()
                .text_color(gpui::rgb(0xfacc15))
                .child(hud.fps_line()),
        )
        .child(
            div()
                .text_sm()
                .text_color(status_color)
                .child(hud.status_line()),
        );

    let instructions = div()
        .absolute()
        .bottom(px(10.0))
        .left(px(10.0))
        .flex()
        .flex_col()
        .children(INSTRUCTIONS.iter().map(|line| {
            div()
                .text_xs()
                .text_color(gpui::rgb(0xe5e7eb))
                .child(*line)
        }));

    let center = hud.target.center;
    let score_on_target = div()
        .absolute()
        .left(px(center.x as f32 * scale - SCORE_BADGE.0 / 2.0))
        .top(px(center.y as f32 * scale - SCORE_BADGE.1 / 2.0))
        .w(px(SCORE_BADGE.0))
        .h(px(SCORE_BADGE.1))
        .flex()
        .items_center()
        .justify_center()
        .text_base()
        .text_color(gpui::rgb(0xffffff))
        .child(hud.score.to_string());

    vec![
        stats.into_any_element(),
        instructions.into_any_element(),
        score_on_target.into_any_element(),
    ]
}
