#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod display;
pub mod fps;
pub mod orchestrator;
pub mod overlay;
pub mod pose;
#[cfg(feature = "camera-nokhwa")]
pub mod rgba_converter;

use crate::{error::CaptureError, types::Frame};

// Re-exports for convenience
#[cfg(feature = "camera-nokhwa")]
pub use camera::{CameraCapture, CameraDevice, available_cameras};
pub use display::{ChannelPresenter, ComposedFrame, Hud, Presenter};
pub use fps::FrameRateMeter;
pub use orchestrator::{FrameOrchestrator, FrameOutcome, LoopState, StopReason};
pub use pose::{KeypointSource, ModelComplexity, PoseEstimatorConfig};

/// A video device the game loop pulls frames from. Implementations release the device when
/// dropped.
pub trait FrameSource {
    /// Pixel size of the frames `read` will return.
    fn resolution(&self) -> (u32, u32);

    fn read(&mut self) -> Result<Frame, CaptureError>;
}
