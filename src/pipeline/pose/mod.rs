mod common;
mod ort;

use std::path::PathBuf;

use crate::types::{Frame, Skeleton};

pub use self::common::{POSE_INPUT_SIZE, POSE_OUTPUT_LANDMARKS};
pub use self::ort::OrtPoseEstimator;

/// Anything that can find a body in a frame.
pub trait KeypointSource {
    /// `Ok(None)` means nothing was detected; `Err` means inference itself failed.
    fn estimate(&mut self, frame: &Frame) -> anyhow::Result<Option<Skeleton>>;
}

/// Latency/accuracy trade-off; each tier is a different landmark model file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ModelComplexity {
    Lite,
    #[default]
    Full,
    Heavy,
}

impl ModelComplexity {
    pub fn model_filename(self) -> &'static str {
        match self {
            ModelComplexity::Lite => "pose_landmark_lite.onnx",
            ModelComplexity::Full => "pose_estimation_mediapipe_2023mar.onnx",
            ModelComplexity::Heavy => "pose_landmark_heavy.onnx",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PoseEstimatorConfig {
    pub min_detection_confidence: f32,
    /// Confidence needed to keep following the body found in the previous frame.
    pub min_tracking_confidence: f32,
    pub complexity: ModelComplexity,
    /// Treat every frame as unrelated to the previous one.
    pub static_image_mode: bool,
    pub enable_segmentation: bool,
    pub model_dir: PathBuf,
}

impl Default for PoseEstimatorConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            complexity: ModelComplexity::Full,
            static_image_mode: false,
            enable_segmentation: false,
            model_dir: PathBuf::from("models"),
        }
    }
}

impl PoseEstimatorConfig {
    /// Settings for annotating a single still image.
    pub fn static_image() -> Self {
        Self {
            static_image_mode: true,
            enable_segmentation: true,
            complexity: ModelComplexity::Heavy,
            ..Self::default()
        }
    }
}
