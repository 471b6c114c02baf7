#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::thread;

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use gpui::Application;
use pose_circle_game::{
    config::AppConfig,
    game::GameCommand,
    pipeline::{ChannelPresenter, ComposedFrame},
    ui,
};

fn main() -> Result<()> {
    env_logger::init();

    let config = AppConfig::default();
    let (frame_tx, frame_rx) = bounded(1);
    let (command_tx, command_rx) = unbounded();

    let game_handle = spawn_game_loop(config, frame_tx, command_rx)?;

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, frame_rx, command_tx) {
                log::error!("failed to launch ui: {err:?}");
                app.quit();
            }
        });

    if game_handle.join().is_err() {
        return Err(anyhow!("game loop thread panicked"));
    }
    Ok(())
}

/// Opens the camera and the pose model on a dedicated thread and starts the loop there.
/// Returns once both are open, or with the error that prevented it.
fn spawn_game_loop(
    config: AppConfig,
    frame_tx: Sender<ComposedFrame>,
    command_rx: Receiver<GameCommand>,
) -> Result<thread::JoinHandle<()>> {
    let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
    let handle = thread::Builder::new()
        .name("game-loop".into())
        .spawn(move || {
            let presenter =
                ChannelPresenter::new(frame_tx, command_rx, config.game.command_poll_timeout);
            match game::open(&config, presenter) {
                Ok(mut orchestrator) => {
                    let _ = ready_tx.send(Ok(()));
                    orchestrator.run();
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            }
        })
        .context("failed to spawn game loop thread")?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(err)) => {
            let _ = handle.join();
            Err(err)
        }
        Err(_) => Err(anyhow!("game loop thread exited before it was ready")),
    }
}

#[cfg(feature = "camera-nokhwa")]
mod game {
    use anyhow::{Context, Result};
    use nokhwa::utils::CameraIndex;
    use pose_circle_game::{
        config::AppConfig,
        pipeline::{
            CameraCapture, ChannelPresenter, FrameOrchestrator, available_cameras,
            pose::OrtPoseEstimator,
        },
    };

    pub type Orchestrator = FrameOrchestrator<CameraCapture, OrtPoseEstimator, ChannelPresenter>;

    pub fn open(config: &AppConfig, presenter: ChannelPresenter) -> Result<Orchestrator> {
        match available_cameras() {
            Ok(cameras) => {
                for camera in cameras {
                    log::info!("found camera {}", camera.label);
                }
            }
            Err(err) => log::warn!("failed to list cameras: {err:?}"),
        }

        let camera = CameraCapture::open(CameraIndex::Index(config.camera_index))
            .with_context(|| format!("failed to open camera {}", config.camera_index))?;
        let estimator = OrtPoseEstimator::open(config.estimator.clone())
            .context("failed to load pose estimator")?;

        FrameOrchestrator::new(camera, estimator, presenter, config.game.clone())
            .context("failed to start game")
    }
}

#[cfg(not(feature = "camera-nokhwa"))]
mod game {
    use anyhow::{Result, bail};
    use pose_circle_game::{config::AppConfig, pipeline::ChannelPresenter};

    pub struct Orchestrator;

    impl Orchestrator {
        pub fn run(&mut self) {}
    }

    pub fn open(_config: &AppConfig, _presenter: ChannelPresenter) -> Result<Orchestrator> {
        bail!("built without a camera backend; enable the `camera-nokhwa` feature")
    }
}
