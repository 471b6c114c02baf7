//! Game rules built on top of detected wrists: where the target is, whether a hand touches
//! it, and how the score evolves.

pub mod collision;
pub mod mapper;
pub mod target;

pub use collision::{distance, is_colliding};
pub use mapper::{Absence, HandPosition, locate_hand, locate_joint};
pub use target::{Arena, Target, TargetManager};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameCommand {
    Quit,
    Reset,
    NewTarget,
}

impl GameCommand {
    /// Maps a pressed key (as reported by the window) to a command.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "q" | "escape" => Some(GameCommand::Quit),
            "r" => Some(GameCommand::Reset),
            "n" => Some(GameCommand::NewTarget),
            _ => None,
        }
    }
}
