//! Tournament model and remote tournament operations

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::time::time_left_short;

use super::graphql::{GraphQlClient, GraphQlError};
use super::leaderboard::LeaderboardEntry;

/// Local validation limits for tournament creation
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Canonical tournament status. The service is the authority and has
/// historically emitted several spellings ("Scheduled", "REGISTRATION",
/// "Active", "ENDED", ...); all of them normalize here at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TournamentStatus {
    /// Scheduled, joinable, gameplay not yet open
    Registration,
    Active,
    Ended,
}

impl From<String> for TournamentStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "active" => TournamentStatus::Active,
            "ended" => TournamentStatus::Ended,
            _ => TournamentStatus::Registration,
        }
    }
}

impl From<TournamentStatus> for String {
    fn from(status: TournamentStatus) -> Self {
        match status {
            TournamentStatus::Registration => "REGISTRATION".to_string(),
            TournamentStatus::Active => "ACTIVE".to_string(),
            TournamentStatus::Ended => "ENDED".to_string(),
        }
    }
}

impl TournamentStatus {
    /// Derive the status from the schedule when the remote omits it
    pub fn from_schedule(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start {
            TournamentStatus::Registration
        } else if now < end {
            TournamentStatus::Active
        } else {
            TournamentStatus::Ended
        }
    }

    /// Display ordering weight: active events sort before scheduled, ended last
    fn priority(self) -> u8 {
        match self {
            TournamentStatus::Active => 3,
            TournamentStatus::Registration => 2,
            TournamentStatus::Ended => 1,
        }
    }
}

/// A tournament as known to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: TournamentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub player_count: u32,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default, alias = "isPinned")]
    pub pinned: bool,
    #[serde(default)]
    pub created_by: String,
}

impl Tournament {
    /// Participation is a derived membership check, never stored separately
    pub fn has_participant(&self, username: &str) -> bool {
        self.participants.iter().any(|p| p == username)
    }

    /// Compact remaining-time string for tournament cards
    pub fn time_left(&self, now: DateTime<Utc>) -> String {
        time_left_short(self.end_time, now)
    }
}

/// Fields for creating a tournament
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTournament {
    pub name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Partial update applied by an admin
#[derive(Debug, Clone, Default, Serialize)]
pub struct TournamentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Sort a tournament list for display: pinned first, then by status
/// priority, preserving remote order within each group.
pub fn sorted_for_display(mut tournaments: Vec<Tournament>) -> Vec<Tournament> {
    tournaments.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then(b.status.priority().cmp(&a.status.priority()))
    });
    tournaments
}

/// Remote tournament collaborator
pub trait TournamentService {
    fn tournaments(&self) -> impl Future<Output = Result<Vec<Tournament>, GraphQlError>> + Send;

    /// Tournaments the player participates in. The default derives the
    /// answer from the full list via membership.
    fn my_tournaments(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<Tournament>, GraphQlError>> + Send
    where
        Self: Sync,
    {
        async move {
            Ok(self
                .tournaments()
                .await?
                .into_iter()
                .filter(|t| t.has_participant(username))
                .collect())
        }
    }

    fn create_tournament(
        &self,
        data: &NewTournament,
    ) -> impl Future<Output = Result<(), GraphQlError>> + Send;

    fn join_tournament(
        &self,
        id: &str,
        username: &str,
    ) -> impl Future<Output = Result<(), GraphQlError>> + Send;

    fn is_participant(
        &self,
        id: &str,
        username: &str,
    ) -> impl Future<Output = Result<bool, GraphQlError>> + Send;

    fn submit_score(
        &self,
        id: &str,
        username: &str,
        score: u32,
    ) -> impl Future<Output = Result<(), GraphQlError>> + Send;

    fn leaderboard(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, GraphQlError>> + Send;

    fn delete_tournament(&self, id: &str) -> impl Future<Output = Result<(), GraphQlError>> + Send;

    fn update_tournament(
        &self,
        id: &str,
        updates: &TournamentUpdate,
    ) -> impl Future<Output = Result<(), GraphQlError>> + Send;

    fn toggle_pin(
        &self,
        id: &str,
        pinned: bool,
    ) -> impl Future<Output = Result<(), GraphQlError>> + Send;
}

/// GraphQL implementation of the tournament contract
#[derive(Clone)]
pub struct GraphQlTournamentService {
    client: GraphQlClient,
    caller_chain_id: String,
}

impl GraphQlTournamentService {
    pub fn new(client: GraphQlClient, caller_chain_id: String) -> Self {
        Self {
            client,
            caller_chain_id,
        }
    }
}

impl TournamentService for GraphQlTournamentService {
    async fn tournaments(&self) -> Result<Vec<Tournament>, GraphQlError> {
        let query = r#"query { tournaments { id name description status startTime endTime playerCount participants isPinned createdBy } }"#;
        self.client.query(query, "tournaments").await
    }

    async fn create_tournament(&self, data: &NewTournament) -> Result<(), GraphQlError> {
        let mutation = format!(
            r#"mutation {{ createTournament(callerChainId: "{}", name: "{}", description: "{}", startTime: "{}", endTime: "{}") }}"#,
            self.caller_chain_id,
            data.name,
            data.description,
            data.start_time.to_rfc3339(),
            data.end_time.to_rfc3339()
        );
        self.client.mutate(&mutation).await
    }

    async fn join_tournament(&self, id: &str, username: &str) -> Result<(), GraphQlError> {
        let mutation = format!(
            r#"mutation {{ joinTournament(tournamentId: "{}", username: "{}") }}"#,
            id, username
        );
        self.client.mutate(&mutation).await
    }

    async fn is_participant(&self, id: &str, username: &str) -> Result<bool, GraphQlError> {
        let query = format!(
            r#"query {{ isTournamentParticipant(tournamentId: "{}", username: "{}") }}"#,
            id, username
        );
        self.client.query(&query, "isTournamentParticipant").await
    }

    async fn submit_score(&self, id: &str, username: &str, score: u32) -> Result<(), GraphQlError> {
        let mutation = format!(
            r#"mutation {{ submitTournamentScore(tournamentId: "{}", username: "{}", score: {}) }}"#,
            id, username, score
        );
        self.client.mutate(&mutation).await
    }

    async fn leaderboard(&self, id: &str) -> Result<Vec<LeaderboardEntry>, GraphQlError> {
        let query = format!(
            r#"query {{ tournamentLeaderboard(tournamentId: "{}") {{ username score rank }} }}"#,
            id
        );
        self.client.query(&query, "tournamentLeaderboard").await
    }

    async fn delete_tournament(&self, id: &str) -> Result<(), GraphQlError> {
        let mutation = format!(
            r#"mutation {{ deleteTournament(callerChainId: "{}", tournamentId: "{}") }}"#,
            self.caller_chain_id, id
        );
        self.client.mutate(&mutation).await
    }

    async fn update_tournament(
        &self,
        id: &str,
        updates: &TournamentUpdate,
    ) -> Result<(), GraphQlError> {
        let mut fields = Vec::new();
        if let Some(name) = &updates.name {
            fields.push(format!(r#"name: "{}""#, name));
        }
        if let Some(description) = &updates.description {
            fields.push(format!(r#"description: "{}""#, description));
        }
        let mutation = format!(
            r#"mutation {{ updateTournament(callerChainId: "{}", tournamentId: "{}"{}{}) }}"#,
            self.caller_chain_id,
            id,
            if fields.is_empty() { "" } else { ", " },
            fields.join(", ")
        );
        self.client.mutate(&mutation).await
    }

    async fn toggle_pin(&self, id: &str, pinned: bool) -> Result<(), GraphQlError> {
        let mutation = format!(
            r#"mutation {{ pinTournament(tournamentId: "{}", pinned: {}) }}"#,
            id, pinned
        );
        self.client.mutate(&mutation).await
    }
}
