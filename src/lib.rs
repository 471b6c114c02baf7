//! Touch-the-circle fitness game driven by body pose estimation.

pub mod config;
pub mod error;
pub mod game;
pub mod model_download;
pub mod pipeline;
pub mod types;
pub mod ui;
