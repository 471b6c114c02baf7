use thiserror::Error;

use crate::types::PoseJoint;

/// Frame acquisition failures. Any of these ends the game session.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera frame read failed: {0}")]
    Read(String),
    #[error("could not decode camera frame after {attempts} attempts: {reason}")]
    Decode { attempts: u32, reason: String },
    #[error("capture stream closed")]
    Closed,
}

/// Joint data that exists but cannot be turned into a pixel position.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("{joint:?} has non-finite coordinates ({x}, {y})")]
    NonFinite { joint: PoseJoint, x: f32, y: f32 },
    #[error("frame has no pixels ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("{joint:?} maps outside the representable pixel range")]
    Overflow { joint: PoseJoint },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error(
        "arena {width}x{height} is too small for targets needing {required}px per axis"
    )]
    ArenaTooSmall {
        width: u32,
        height: u32,
        required: u32,
    },
}
