//! Local fallback cache for tournament data
//!
//! Used only when the remote service is unavailable; every successful
//! remote read overwrites the cache, so it never diverges once the
//! service recovers.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::warn;

use super::tournaments::{Tournament, TournamentStatus};

#[derive(Clone)]
pub struct FallbackCache {
    path: PathBuf,
}

impl FallbackCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Overwrite the cache with the latest remote tournament list
    pub fn store_tournaments(&self, tournaments: &[Tournament]) {
        match serde_json::to_vec_pretty(tournaments) {
            Ok(bytes) => {
                if let Err(error) = fs::write(&self.path, bytes) {
                    warn!(path = %self.path.display(), %error, "failed to write tournament cache");
                }
            }
            Err(error) => warn!(%error, "failed to encode tournament cache"),
        }
    }

    /// Last-known tournament list, statuses recomputed from the schedule
    /// since the cached copies are stale. Empty when nothing was cached.
    pub fn load_tournaments(&self) -> Vec<Tournament> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Vec::new(),
        };
        let mut tournaments: Vec<Tournament> = match serde_json::from_slice(&bytes) {
            Ok(tournaments) => tournaments,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "discarding corrupt tournament cache");
                return Vec::new();
            }
        };

        let now = Utc::now();
        for tournament in &mut tournaments {
            tournament.status =
                TournamentStatus::from_schedule(tournament.start_time, tournament.end_time, now);
        }
        tournaments
    }
}
