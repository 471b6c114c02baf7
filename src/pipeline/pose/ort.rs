use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    KeypointSource, PoseEstimatorConfig,
    common::{self, POSE_INPUT_SIZE, Projection, RawLandmark},
};
use crate::{
    model_download::resolve_pose_model,
    types::{Frame, Skeleton},
};

/// Square region in frame pixels plus rotation, derived from the last skeleton.
type TrackingRoi = (f32, f32, f32, f32);

struct RawPose {
    landmarks: Vec<RawLandmark>,
    confidence: f32,
    mask: Option<Vec<f32>>,
}

/// MediaPipe pose landmark model on ONNX Runtime.
pub struct OrtPoseEstimator {
    session: Session,
    config: PoseEstimatorConfig,
    roi: Option<TrackingRoi>,
}

impl OrtPoseEstimator {
    /// Resolves (downloading if needed) the model for `config.complexity` and loads it.
    pub fn open(config: PoseEstimatorConfig) -> Result<Self> {
        let model_path = resolve_pose_model(&config.model_dir, config.complexity, |_evt| {})
            .with_context(|| {
                format!(
                    "failed to prepare pose model in {}",
                    config.model_dir.display()
                )
            })?;
        Self::from_model_path(&model_path, config)
    }

    pub fn from_model_path(model_path: &Path, config: PoseEstimatorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load ORT session from {}", model_path.display()))?;

        log::info!(
            "pose ORT backend ready using {} ({:?}, static={}, segmentation={})",
            model_path.display(),
            config.complexity,
            config.static_image_mode,
            config.enable_segmentation
        );

        Ok(Self {
            session,
            config,
            roi: None,
        })
    }

    fn run(&mut self, input: Array4<f32>, want_mask: bool) -> Result<RawPose> {
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run ORT session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "pose model returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let landmarks = common::decode_landmarks(&flattened)?;

        let confidence = outputs[1]
            .try_extract_array::<f32>()
            .ok()
            .and_then(|arr| arr.iter().next().copied())
            .unwrap_or(0.0);

        let mask = if want_mask && outputs.len() > 2 {
            outputs[2]
                .try_extract_array::<f32>()
                .ok()
                .map(|arr| arr.iter().copied().collect())
        } else {
            None
        };

        Ok(RawPose {
            landmarks,
            confidence,
            mask,
        })
    }

    fn track(&mut self, frame: &Frame, roi: TrackingRoi) -> Result<Option<Skeleton>> {
        let (cx, cy, side, angle) = roi;
        let (input, transform) =
            common::prepare_rotated_crop(frame, (cx, cy), side, angle, POSE_INPUT_SIZE)?;
        let raw = self.run(input, false)?;
        if raw.confidence < self.config.min_tracking_confidence {
            log::debug!(
                "tracking confidence {:.2} below {:.2}, redetecting",
                raw.confidence,
                self.config.min_tracking_confidence
            );
            return Ok(None);
        }

        Ok(Some(common::build_skeleton(
            &raw.landmarks,
            raw.confidence,
            &Projection::Crop(transform),
            frame,
        )))
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<Skeleton>> {
        let (input, letterbox) = common::prepare_letterbox(frame, POSE_INPUT_SIZE)?;
        let raw = self.run(input, self.config.enable_segmentation)?;
        if raw.confidence < self.config.min_detection_confidence {
            return Ok(None);
        }

        let mut skeleton = common::build_skeleton(
            &raw.landmarks,
            raw.confidence,
            &Projection::Letterbox(letterbox.clone()),
            frame,
        );
        if let Some(logits) = raw.mask {
            skeleton = skeleton.with_segmentation(common::resample_mask(
                &logits,
                POSE_INPUT_SIZE,
                &letterbox,
            ));
        }
        Ok(Some(skeleton))
    }
}

impl KeypointSource for OrtPoseEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<Skeleton>> {
        let tracked = match self.roi.take() {
            Some(roi) if !self.config.static_image_mode => self.track(frame, roi)?,
            _ => None,
        };

        let skeleton = match tracked {
            Some(skeleton) => Some(skeleton),
            None => self.detect(frame)?,
        };

        if !self.config.static_image_mode {
            self.roi = skeleton
                .as_ref()
                .and_then(|s| common::tracking_roi(s, frame.width, frame.height));
        }
        Ok(skeleton)
    }
}
