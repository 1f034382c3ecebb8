//! Notifications consumed by the view layer

use crate::store::{AuthUser, LeaderboardEntry, Tournament};

use super::state::{GameMode, Screen};

/// View-layer notifications. Broadcast on a channel; the machine never
/// waits for subscribers.
#[derive(Debug, Clone)]
pub enum UiEvent {
    ScreenChanged {
        from: Screen,
        to: Screen,
    },
    ModeChanged {
        from: Option<GameMode>,
        to: Option<GameMode>,
    },
    /// Fired on login, session restore and logout
    AuthStateChanged {
        user: Option<AuthUser>,
    },
    /// Current leaderboard in remote rank order
    LeaderboardUpdated(Vec<LeaderboardEntry>),
    /// Tournament list in display order (pinned first)
    TournamentsUpdated(Vec<Tournament>),
    /// Mode-appropriate best score to display
    PlayerBest(u32),
    /// 1-based rank on the current leaderboard, None when unranked
    PlayerRank(Option<usize>),
    /// User-facing message (validation problems, status gates, results)
    Notice(String),
    /// The bootstrap connection failed; only a manual retry proceeds
    ConnectionFailed(String),
}
