use std::time::Duration;

use crate::pipeline::pose::PoseEstimatorConfig;

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub target_radius: u32,
    /// Gap kept between a target's edge and the frame border.
    pub target_margin: u32,
    pub fps_window: u32,
    pub command_poll_timeout: Duration,
    pub hand_marker_radius: i32,
    pub hand_effect_radius: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            target_radius: 40,
            target_margin: 20,
            fps_window: 30,
            command_poll_timeout: Duration::from_millis(5),
            hand_marker_radius: 15,
            hand_effect_radius: 20,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub camera_index: u32,
    pub game: GameConfig,
    pub estimator: PoseEstimatorConfig,
}
