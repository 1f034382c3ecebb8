//! Persisted login session for silent re-authentication

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::auth::UserRole;

/// Sessions expire after this many hours
pub const SESSION_DURATION_HOURS: i64 = 24;

/// The session record written to disk. The credential hash is stored so
/// the client can re-run the login RPC without prompting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub username: String,
    pub role: UserRole,
    pub last_login: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub credentials_hash: String,
}

impl SessionRecord {
    pub fn new(username: String, role: UserRole, credentials_hash: String) -> Self {
        let now = Utc::now();
        Self {
            username,
            role,
            last_login: now,
            expiry: now + Duration::hours(SESSION_DURATION_HOURS),
            credentials_hash,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }
}

/// File-backed session storage under the configured data directory
#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, record: &SessionRecord) {
        match serde_json::to_vec_pretty(record) {
            Ok(bytes) => {
                if let Err(error) = fs::write(&self.path, bytes) {
                    warn!(path = %self.path.display(), %error, "failed to persist session");
                }
            }
            Err(error) => warn!(%error, "failed to encode session"),
        }
    }

    /// Load the stored session. Expired or unreadable records are
    /// discarded and removed.
    pub fn load(&self) -> Option<SessionRecord> {
        let bytes = fs::read(&self.path).ok()?;
        let record: SessionRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "discarding corrupt session file");
                self.clear();
                return None;
            }
        };

        if !record.is_valid(Utc::now()) {
            self.clear();
            return None;
        }
        Some(record)
    }

    pub fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(name: &str) -> SessionStore {
        let mut path = std::env::temp_dir();
        path.push(format!("flappy-session-{}-{}", name, std::process::id()));
        let store = SessionStore::new(path);
        store.clear();
        store
    }

    #[test]
    fn save_load_round_trip() {
        let store = store("roundtrip");
        let record = SessionRecord::new("alice".into(), UserRole::Player, "abc123".into());
        store.save(&record);

        let loaded = store.load().expect("session should load");
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.role, UserRole::Player);
        assert_eq!(loaded.credentials_hash, "abc123");
        store.clear();
    }

    #[test]
    fn expired_session_is_discarded() {
        let store = store("expired");
        let mut record = SessionRecord::new("alice".into(), UserRole::Player, "abc123".into());
        record.expiry = Utc::now() - Duration::hours(1);
        store.save(&record);

        assert!(store.load().is_none());
        // The expired file was removed, not just skipped
        assert!(store.load().is_none());
        store.clear();
    }

    #[test]
    fn missing_file_is_none() {
        let store = store("missing");
        assert!(store.load().is_none());
    }
}
