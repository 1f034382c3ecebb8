//! GraphQL-over-HTTP client for the remote leaderboard service

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Client for the blockchain-backed leaderboard/tournament service.
/// All operations are plain POSTed GraphQL documents.
#[derive(Clone)]
pub struct GraphQlClient {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlResponseError>>,
}

#[derive(Deserialize)]
struct GraphQlResponseError {
    message: String,
}

impl GraphQlClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.graphql_endpoint(),
        }
    }

    /// Execute a document and return the raw `data` object
    async fn execute(&self, query: &str) -> Result<serde_json::Value, GraphQlError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GraphQlRequest { query })
            .send()
            .await
            .map_err(GraphQlError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphQlError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphQlResponse = response.json().await.map_err(GraphQlError::Transport)?;

        if let Some(errors) = envelope.errors {
            if let Some(first) = errors.into_iter().next() {
                return Err(GraphQlError::Api(first.message));
            }
        }

        envelope.data.ok_or(GraphQlError::MissingData("data"))
    }

    /// Run a query and extract one field of `data`
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        field: &'static str,
    ) -> Result<T, GraphQlError> {
        let data = self.execute(query).await?;
        let value = data
            .get(field)
            .cloned()
            .ok_or(GraphQlError::MissingData(field))?;
        serde_json::from_value(value).map_err(GraphQlError::Decode)
    }

    /// Run a query and deserialize the whole `data` object
    pub async fn query_data<T: DeserializeOwned>(&self, query: &str) -> Result<T, GraphQlError> {
        let data = self.execute(query).await?;
        serde_json::from_value(data).map_err(GraphQlError::Decode)
    }

    /// Run a mutation, surfacing service errors and discarding the payload
    pub async fn mutate(&self, query: &str) -> Result<(), GraphQlError> {
        self.execute(query).await.map(|_| ())
    }
}

/// GraphQL service errors
#[derive(Debug, thiserror::Error)]
pub enum GraphQlError {
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("service error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("{0}")]
    Api(String),

    #[error("failed to read response: {0}")]
    Transport(reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing field `{0}` in response")]
    MissingData(&'static str),
}

impl GraphQlError {
    /// The service reports a duplicate tournament join with an error
    /// string; the machine treats that as success.
    pub fn is_already_joined(&self) -> bool {
        matches!(self, GraphQlError::Api(message) if message.contains("already joined"))
    }
}
