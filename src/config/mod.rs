//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the blockchain node's GraphQL service
    pub service_url: String,
    /// Application id on the service
    pub app_id: String,
    /// Chain id this client calls from
    pub chain_id: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory for the session file and fallback caches
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            service_url: env::var("SERVICE_URL").map_err(|_| ConfigError::Missing("SERVICE_URL"))?,
            app_id: env::var("APP_ID").map_err(|_| ConfigError::Missing("APP_ID"))?,
            chain_id: env::var("CHAIN_ID").map_err(|_| ConfigError::Missing("CHAIN_ID"))?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".flappy")),
        })
    }

    /// Full GraphQL endpoint for the configured application
    pub fn graphql_endpoint(&self) -> String {
        format!(
            "{}/applications/{}",
            self.service_url.trim_end_matches('/'),
            self.app_id
        )
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn tournament_cache_file(&self) -> PathBuf {
        self.data_dir.join("tournaments.json")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_url_and_app_id() {
        let config = Config {
            service_url: "http://localhost:8080/".to_string(),
            app_id: "abc123".to_string(),
            chain_id: "chain-1".to_string(),
            log_level: "info".to_string(),
            data_dir: PathBuf::from(".flappy"),
        };
        assert_eq!(
            config.graphql_endpoint(),
            "http://localhost:8080/applications/abc123"
        );
    }
}
