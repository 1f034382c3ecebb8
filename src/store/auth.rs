//! Authentication against the remote login-or-register RPC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::graphql::{GraphQlClient, GraphQlError};

/// Local credential policy, checked before any remote call
pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Role attached to an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Player,
    Admin,
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            UserRole::Admin
        } else {
            UserRole::Player
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => "ADMIN".to_string(),
            UserRole::Player => "player".to_string(),
        }
    }
}

/// Authenticated user record returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub username: String,
    pub role: UserRole,
    pub chain_id: String,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Deterministic credential hash: the same credentials always produce the
/// same hash, with the username doubling as the salt.
pub fn credential_hash(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(username.as_bytes());
    hex::encode(hasher.finalize())
}

/// Remote authentication collaborator
pub trait AuthService {
    /// Verify credentials, registering the user on first sight
    fn login_or_register(
        &self,
        username: &str,
        hash: &str,
    ) -> impl std::future::Future<Output = Result<AuthUser, GraphQlError>> + Send;
}

/// GraphQL implementation speaking the service's login contract
#[derive(Clone)]
pub struct GraphQlAuthService {
    client: GraphQlClient,
    requester_chain_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResult {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl GraphQlAuthService {
    pub fn new(client: GraphQlClient, requester_chain_id: String) -> Self {
        Self {
            client,
            requester_chain_id,
        }
    }
}

impl AuthService for GraphQlAuthService {
    async fn login_or_register(
        &self,
        username: &str,
        hash: &str,
    ) -> Result<AuthUser, GraphQlError> {
        let mutation = format!(
            r#"mutation {{ loginOrRegister(username: "{}", hash: "{}", requesterChainId: "{}") }}"#,
            username, hash, self.requester_chain_id
        );
        self.client.mutate(&mutation).await?;

        let query = format!(
            r#"query {{ loginResultFor(chainId: "{}") {{ success message user {{ username role chainId createdAt }} }} }}"#,
            self.requester_chain_id
        );
        let result: LoginResult = self.client.query(&query, "loginResultFor").await?;

        if !result.success {
            return Err(GraphQlError::Api(
                result
                    .message
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            ));
        }
        result.user.ok_or(GraphQlError::MissingData("user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_hash_is_deterministic() {
        let a = credential_hash("alice", "hunter42");
        let b = credential_hash("alice", "hunter42");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, credential_hash("alice", "hunter43"));
        assert_ne!(a, credential_hash("bob", "hunter42"));
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(UserRole::from("ADMIN".to_string()), UserRole::Admin);
        assert_eq!(UserRole::from("admin".to_string()), UserRole::Admin);
        assert_eq!(UserRole::from("player".to_string()), UserRole::Player);
        assert_eq!(UserRole::from("anything".to_string()), UserRole::Player);
    }
}
