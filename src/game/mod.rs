//! Game simulation modules

pub mod engine;
pub mod physics;
pub mod session;
pub mod snapshot;

pub use engine::GameEngine;
pub use session::{GameSession, SessionPhase};
pub use snapshot::FrameSnapshot;

/// Lifecycle notifications emitted by the simulation, in frame order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A pipe was passed; carries the new running score
    Score(u32),
    /// The run's score exceeded the stored best; carries the new best
    HighScore(u32),
    /// The run ended
    GameOver {
        score: u32,
        best: u32,
        is_new_high_score: bool,
    },
}
