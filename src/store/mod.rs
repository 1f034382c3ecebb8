//! Remote service wrappers and local persistence

pub mod auth;
pub mod cache;
pub mod graphql;
pub mod leaderboard;
pub mod session;
pub mod tournaments;

pub use auth::{AuthService, AuthUser, GraphQlAuthService, UserRole};
pub use cache::FallbackCache;
pub use graphql::{GraphQlClient, GraphQlError};
pub use leaderboard::{GraphQlLeaderboardService, LeaderboardEntry, LeaderboardService};
pub use session::{SessionRecord, SessionStore};
pub use tournaments::{
    GraphQlTournamentService, NewTournament, Tournament, TournamentService, TournamentStatus,
    TournamentUpdate,
};
