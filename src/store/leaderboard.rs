//! Practice leaderboard operations

use std::future::Future;

use serde::{Deserialize, Serialize};

use super::graphql::{GraphQlClient, GraphQlError};

/// One row of a leaderboard, in rank order as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u32,
    /// Tournament boards carry an explicit rank from the service
    #[serde(default)]
    pub rank: Option<u32>,
}

/// A player's own practice history
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PracticeData {
    pub scores: Vec<u32>,
    pub best: u32,
}

/// Remote practice-leaderboard collaborator
pub trait LeaderboardService {
    /// Full practice leaderboard, best score per player, rank order
    fn practice_leaderboard(
        &self,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, GraphQlError>> + Send;

    /// Record a practice score for the player
    fn submit_practice_score(
        &self,
        username: &str,
        score: u32,
    ) -> impl Future<Output = Result<(), GraphQlError>> + Send;

    /// The calling player's practice scores and best
    fn my_practice_data(&self) -> impl Future<Output = Result<PracticeData, GraphQlError>> + Send;
}

/// GraphQL implementation of the practice leaderboard contract
#[derive(Clone)]
pub struct GraphQlLeaderboardService {
    client: GraphQlClient,
}

impl GraphQlLeaderboardService {
    pub fn new(client: GraphQlClient) -> Self {
        Self { client }
    }
}

impl LeaderboardService for GraphQlLeaderboardService {
    async fn practice_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, GraphQlError> {
        let query = r#"query { practiceLeaderboard { username score } }"#;
        self.client.query(query, "practiceLeaderboard").await
    }

    async fn submit_practice_score(&self, username: &str, score: u32) -> Result<(), GraphQlError> {
        let mutation = format!(
            r#"mutation {{ submitPracticeScore(username: "{}", score: {}) }}"#,
            username, score
        );
        self.client.mutate(&mutation).await
    }

    async fn my_practice_data(&self) -> Result<PracticeData, GraphQlError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct MyPracticeData {
            #[serde(default)]
            my_practice_scores: Vec<u32>,
            #[serde(default)]
            my_practice_best: u32,
        }

        let query = r#"query { myPracticeScores myPracticeBest }"#;
        let data: MyPracticeData = self.client.query_data(query).await?;
        Ok(PracticeData {
            scores: data.my_practice_scores,
            best: data.my_practice_best,
        })
    }
}
