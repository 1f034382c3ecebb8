//! Cross-screen application state

use crate::store::{AuthUser, LeaderboardEntry, Tournament};

/// Screens of the client, as a state machine. There is no terminal
/// screen: logout returns to `InitialLoading` and re-runs the bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    InitialLoading,
    Auth,
    ModeSelection,
    Game,
    TournamentList,
    TournamentCreation,
}

/// Selected play mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Free play against the personal-best leaderboard
    Practice,
    /// Time-boxed competitive event
    Tournament,
}

/// The single source of truth for cross-screen concerns. Mutated only by
/// the app machine; the view layer observes it through `UiEvent`s.
pub struct AppState {
    pub screen: Screen,
    pub mode: Option<GameMode>,
    pub user: Option<AuthUser>,
    pub tournaments: Vec<Tournament>,
    pub active_tournament: Option<Tournament>,
    /// Current leaderboard in remote rank order
    pub leaderboard: Vec<LeaderboardEntry>,
    /// 1-based rank of the player on the current leaderboard
    pub rank: Option<usize>,
    pub practice_best: u32,
    pub practice_scores: Vec<u32>,
    pub tournament_best: u32,
    pub bootstrap_complete: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::InitialLoading,
            mode: None,
            user: None,
            tournaments: Vec::new(),
            active_tournament: None,
            leaderboard: Vec::new(),
            rank: None,
            practice_best: 0,
            practice_scores: Vec::new(),
            tournament_best: 0,
            bootstrap_complete: false,
        }
    }

    pub fn player_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin())
    }

    /// Tournaments the player has joined, derived by membership
    pub fn player_tournaments(&self) -> Vec<&Tournament> {
        let Some(name) = self.player_name() else {
            return Vec::new();
        };
        self.tournaments
            .iter()
            .filter(|t| t.has_participant(name))
            .collect()
    }

    /// Best score for the current mode, shown after each game over
    pub fn mode_best(&self) -> u32 {
        match self.mode {
            Some(GameMode::Tournament) if self.active_tournament.is_some() => self.tournament_best,
            _ => self.practice_best,
        }
    }

    /// Reset everything tied to the authenticated user
    pub fn clear_user_state(&mut self) {
        self.user = None;
        self.mode = None;
        self.active_tournament = None;
        self.leaderboard.clear();
        self.rank = None;
        self.practice_best = 0;
        self.practice_scores.clear();
        self.tournament_best = 0;
        self.bootstrap_complete = false;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
