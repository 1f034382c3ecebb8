//! Application orchestration: screens, modes, remote mediation

pub mod events;
pub mod machine;
pub mod state;

pub use events::UiEvent;
pub use machine::{AppError, AppMachine};
pub use state::{AppState, GameMode, Screen};
