use std::time::Instant;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{
    FrameSource, KeypointSource,
    display::{ComposedFrame, Hud, Presenter},
    fps::FrameRateMeter,
    overlay::{Annotation, render_annotations},
};
use crate::{
    config::GameConfig,
    error::GameError,
    game::{Arena, GameCommand, HandPosition, TargetManager, is_colliding, locate_hand},
    types::{HandSide, Skeleton},
};

/// Loop lifecycle. Initialization happens inside the constructors, which either return a
/// running loop or an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Quit,
    CaptureFailed,
}

/// What happened during one processed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutcome {
    pub body_detected: bool,
    /// Right hand first, then left.
    pub hands: [(HandSide, HandPosition); 2],
    pub hit: bool,
    pub score: u32,
    pub fps: f32,
    pub command: Option<GameCommand>,
}

/// Drives capture, estimation, scoring and presentation one frame at a time.
pub struct FrameOrchestrator<S, K, P, R = StdRng>
where
    S: FrameSource,
    K: KeypointSource,
    P: Presenter,
    R: Rng,
{
    source: S,
    estimator: K,
    presenter: P,
    manager: TargetManager<R>,
    meter: FrameRateMeter,
    config: GameConfig,
    state: LoopState,
    stop_reason: Option<StopReason>,
    frames: u64,
}

impl<S, K, P> FrameOrchestrator<S, K, P, StdRng>
where
    S: FrameSource,
    K: KeypointSource,
    P: Presenter,
{
    pub fn new(source: S, estimator: K, presenter: P, config: GameConfig) -> Result<Self, GameError> {
        Self::with_rng(source, estimator, presenter, config, StdRng::from_entropy())
    }
}

impl<S, K, P, R> FrameOrchestrator<S, K, P, R>
where
    S: FrameSource,
    K: KeypointSource,
    P: Presenter,
    R: Rng,
{
    /// Places the first target inside the capture resolution; fails if the camera image
    /// cannot fit a target.
    pub fn with_rng(
        source: S,
        estimator: K,
        presenter: P,
        config: GameConfig,
        rng: R,
    ) -> Result<Self, GameError> {
        let (width, height) = source.resolution();
        let arena = Arena::new(width, height, config.target_radius, config.target_margin)?;
        let manager = TargetManager::new(arena, rng);
        log::info!(
            "game ready on {width}x{height}, first target at ({}, {})",
            manager.center().x,
            manager.center().y
        );
        Ok(Self {
            source,
            estimator,
            presenter,
            manager,
            meter: FrameRateMeter::new(config.fps_window, Instant::now()),
            config,
            state: LoopState::Running,
            stop_reason: None,
            frames: 0,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn manager(&self) -> &TargetManager<R> {
        &self.manager
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Runs until quit or capture failure and returns why it stopped.
    pub fn run(&mut self) -> StopReason {
        while self.state == LoopState::Running {
            self.step();
        }
        let reason = self.stop_reason.unwrap_or(StopReason::Quit);
        log::info!(
            "game stopped ({reason:?}) after {} frames, final score {}",
            self.frames,
            self.manager.score()
        );
        reason
    }

    /// Processes one frame. Returns `None` once the loop has stopped or the frame could not
    /// be captured.
    pub fn step(&mut self) -> Option<FrameOutcome> {
        if self.state != LoopState::Running {
            return None;
        }

        let mut frame = match self.source.read() {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("failed to grab frame: {err}");
                self.stop(StopReason::CaptureFailed);
                return None;
            }
        };
        frame.mirror_horizontal();
        self.frames += 1;

        let skeleton = match self.estimator.estimate(&frame) {
            Ok(skeleton) => skeleton,
            Err(err) => {
                log::warn!("pose estimation failed, treating frame as empty: {err:?}");
                None
            }
        };

        let (width, height) = (frame.width, frame.height);
        let hands = HandSide::BOTH.map(|side| {
            let position = locate_hand(skeleton.as_ref(), side, width, height);
            if let Some(err) = position.malformed() {
                log::warn!("{} position unusable: {err}", side.label());
            }
            (side, position)
        });

        let target = self.manager.target();
        let mut annotations = Vec::with_capacity(8);
        if let Some(skeleton) = skeleton.as_ref() {
            annotations.push(pose_annotation(skeleton, width, height));
        }

        let mut hit = false;
        for (side, position) in &hands {
            let Some(at) = position.point() else {
                continue;
            };
            annotations.push(Annotation::HandMarker {
                side: *side,
                at,
                radius: self.config.hand_marker_radius,
            });
            if is_colliding(position, &target) {
                annotations.push(Annotation::Burst {
                    center: at,
                    radius: self.config.hand_effect_radius,
                });
                hit = true;
            }
        }

        if hit {
            self.manager.register_hit();
            log::debug!(
                "hit, score {} and new target at ({}, {})",
                self.manager.score(),
                self.manager.center().x,
                self.manager.center().y
            );
            annotations.push(Annotation::Burst {
                center: self.manager.center(),
                radius: self.manager.radius(),
            });
        }
        annotations.push(Annotation::Target(self.manager.target()));
        render_annotations(&mut frame, &annotations);

        let fps = self.meter.tick(Instant::now());
        let hud = Hud {
            score: self.manager.score(),
            fps,
            body_detected: skeleton.is_some(),
            target: self.manager.target(),
        };
        self.presenter.present(ComposedFrame { frame, hud });

        let command = self.presenter.poll_command();
        if let Some(command) = command {
            self.apply(command);
        }

        Some(FrameOutcome {
            body_detected: skeleton.is_some(),
            hands,
            hit,
            score: self.manager.score(),
            fps,
            command,
        })
    }

    fn apply(&mut self, command: GameCommand) {
        log::debug!("command {command:?}");
        match command {
            GameCommand::Quit => self.stop(StopReason::Quit),
            GameCommand::Reset => self.manager.reset_score(),
            GameCommand::NewTarget => self.manager.place_new_target(),
        }
    }

    fn stop(&mut self, reason: StopReason) {
        self.state = LoopState::Stopped;
        self.stop_reason = Some(reason);
    }
}

fn pose_annotation(skeleton: &Skeleton, width: u32, height: u32) -> Annotation {
    Annotation::Pose {
        points: skeleton.projected(width, height),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{
        error::CaptureError,
        types::{Frame, Landmark, PoseJoint},
    };

    struct OneShotSource {
        frames: usize,
    }

    impl FrameSource for OneShotSource {
        fn resolution(&self) -> (u32, u32) {
            (160, 120)
        }

        fn read(&mut self) -> Result<Frame, CaptureError> {
            if self.frames == 0 {
                return Err(CaptureError::Closed);
            }
            self.frames -= 1;
            Ok(Frame::new(vec![0u8; 160 * 120 * 4], 160, 120))
        }
    }

    struct Fixed(Option<Skeleton>);

    impl KeypointSource for Fixed {
        fn estimate(&mut self, _frame: &Frame) -> anyhow::Result<Option<Skeleton>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        shown: Vec<Hud>,
        commands: VecDeque<GameCommand>,
    }

    impl Presenter for Recorder {
        fn present(&mut self, composed: ComposedFrame) {
            self.shown.push(composed.hud);
        }

        fn poll_command(&mut self) -> Option<GameCommand> {
            self.commands.pop_front()
        }
    }

    fn orchestrator(
        frames: usize,
        skeleton: Option<Skeleton>,
    ) -> FrameOrchestrator<OneShotSource, Fixed, Recorder, StdRng> {
        FrameOrchestrator::with_rng(
            OneShotSource { frames },
            Fixed(skeleton),
            Recorder::default(),
            GameConfig::default(),
            StdRng::seed_from_u64(11),
        )
        .unwrap()
    }

    #[test]
    fn construction_starts_running() {
        let game = orchestrator(1, None);
        assert_eq!(game.state(), LoopState::Running);
        assert_eq!(game.stop_reason(), None);
        assert_eq!(game.manager().score(), 0);
    }

    #[test]
    fn too_small_camera_is_rejected() {
        struct Tiny;
        impl FrameSource for Tiny {
            fn resolution(&self) -> (u32, u32) {
                (100, 100)
            }
            fn read(&mut self) -> Result<Frame, CaptureError> {
                Err(CaptureError::Closed)
            }
        }

        let result = FrameOrchestrator::with_rng(
            Tiny,
            Fixed(None),
            Recorder::default(),
            GameConfig::default(),
            StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(GameError::ArenaTooSmall { .. })));
    }

    #[test]
    fn capture_failure_stops_loop() {
        let mut game = orchestrator(2, None);
        assert!(game.step().is_some());
        assert!(game.step().is_some());
        assert!(game.step().is_none());
        assert_eq!(game.state(), LoopState::Stopped);
        assert_eq!(game.stop_reason(), Some(StopReason::CaptureFailed));
        assert!(game.step().is_none());
        assert_eq!(game.frames_processed(), 2);
    }

    #[test]
    fn wrist_is_mapped_in_frame_pixels() {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0, 1.0); PoseJoint::COUNT];
        landmarks[PoseJoint::LeftWrist.index()] = Landmark::new(0.25, 0.5, 0.0, 1.0);
        let mut game = orchestrator(1, Some(Skeleton::new(landmarks, 0.9)));

        let outcome = game.step().unwrap();
        assert!(outcome.body_detected);
        assert_eq!(outcome.hands[0].0, HandSide::Right);
        assert_eq!(
            outcome.hands[1],
            (
                HandSide::Left,
                HandPosition::Located(crate::types::PixelPoint::new(40, 60))
            )
        );
    }
}
