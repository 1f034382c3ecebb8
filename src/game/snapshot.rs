//! Per-frame render snapshots for the view layer

use serde::{Deserialize, Serialize};

use super::session::{GameSession, SessionPhase};

/// Bird state as rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirdSnapshot {
    pub y: f32,
    pub velocity: f32,
}

/// Pipe state as rendered (gap height and width are constants)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeSnapshot {
    pub x: f32,
    pub top: f32,
    pub passed: bool,
}

/// What the view layer needs to draw one frame. Broadcast every frame;
/// the engine never waits for subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub phase: FramePhase,
    pub bird: BirdSnapshot,
    pub pipes: Vec<PipeSnapshot>,
    pub score: u32,
    pub best: u32,
}

/// Serializable mirror of the session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePhase {
    Idle,
    Running,
    GameOver,
}

impl From<SessionPhase> for FramePhase {
    fn from(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::Idle => FramePhase::Idle,
            SessionPhase::Running => FramePhase::Running,
            SessionPhase::GameOver => FramePhase::GameOver,
        }
    }
}

impl FrameSnapshot {
    /// Capture the current session state
    pub fn of(session: &GameSession) -> Self {
        Self {
            frame: session.frame(),
            phase: session.phase().into(),
            bird: BirdSnapshot {
                y: session.bird().y,
                velocity: session.bird().velocity,
            },
            pipes: session
                .pipes()
                .iter()
                .map(|p| PipeSnapshot {
                    x: p.x,
                    top: p.top,
                    passed: p.passed,
                })
                .collect(),
            score: session.score(),
            best: session.best(),
        }
    }
}
