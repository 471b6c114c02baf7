use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::{
    game::{GameCommand, Target},
    types::Frame,
};

pub const INSTRUCTIONS: [&str; 4] = [
    "Touch the circle with your hands!",
    "Press 'R' to reset score",
    "Press 'N' for a new circle",
    "Press 'Q' to quit",
];

/// Text drawn over the frame by the window.
#[derive(Clone, Debug, PartialEq)]
pub struct Hud {
    pub score: u32,
    pub fps: f32,
    pub body_detected: bool,
    /// Where the score is repeated, centered on the circle.
    pub target: Target,
}

impl Hud {
    pub fn score_line(&self) -> String {
        format!("Score: {}", self.score)
    }

    pub fn fps_line(&self) -> String {
        format!("FPS: {:.1}", self.fps)
    }

    pub fn status_line(&self) -> &'static str {
        if self.body_detected {
            "Body Detected"
        } else {
            "No Body Detected"
        }
    }
}

/// A rendered frame plus the text that goes on top of it.
#[derive(Clone, Debug)]
pub struct ComposedFrame {
    pub frame: Frame,
    pub hud: Hud,
}

/// Where composed frames are shown and key commands come from.
pub trait Presenter {
    fn present(&mut self, composed: ComposedFrame);

    /// Waits briefly for at most one command.
    fn poll_command(&mut self) -> Option<GameCommand>;
}

/// Hands frames to a window running on another thread.
pub struct ChannelPresenter {
    frame_tx: Sender<ComposedFrame>,
    command_rx: Receiver<GameCommand>,
    poll_timeout: Duration,
}

impl ChannelPresenter {
    pub fn new(
        frame_tx: Sender<ComposedFrame>,
        command_rx: Receiver<GameCommand>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            frame_tx,
            command_rx,
            poll_timeout,
        }
    }
}

impl Presenter for ChannelPresenter {
    fn present(&mut self, composed: ComposedFrame) {
        match self.frame_tx.try_send(composed) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("window gone, composed frame dropped");
            }
        }
    }

    fn poll_command(&mut self) -> Option<GameCommand> {
        match self.command_rx.recv_timeout(self.poll_timeout) {
            Ok(command) => Some(command),
            Err(RecvTimeoutError::Timeout) => None,
            // Closing the window is the same as asking to quit.
            Err(RecvTimeoutError::Disconnected) => Some(GameCommand::Quit),
        }
    }
}
