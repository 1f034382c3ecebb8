//! End-to-end practice round driven through the real frame loop

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use flappy_core::app::{AppMachine, Screen};
use flappy_core::game::SessionEvent;
use flappy_core::store::auth::{AuthService, AuthUser, UserRole};
use flappy_core::store::leaderboard::{LeaderboardEntry, LeaderboardService, PracticeData};
use flappy_core::store::tournaments::{NewTournament, TournamentService, TournamentUpdate};
use flappy_core::store::{FallbackCache, GraphQlError, SessionStore, Tournament};

#[derive(Clone, Default)]
struct FakeAuth;

impl AuthService for FakeAuth {
    async fn login_or_register(
        &self,
        username: &str,
        _hash: &str,
    ) -> Result<AuthUser, GraphQlError> {
        Ok(AuthUser {
            username: username.to_string(),
            role: UserRole::Player,
            chain_id: "chain-1".to_string(),
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Default)]
struct FakeLeaderboard {
    board: Arc<Mutex<Vec<LeaderboardEntry>>>,
    submissions: Arc<Mutex<Vec<(String, u32)>>>,
}

impl LeaderboardService for FakeLeaderboard {
    async fn practice_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, GraphQlError> {
        Ok(self.board.lock().clone())
    }

    async fn submit_practice_score(&self, username: &str, score: u32) -> Result<(), GraphQlError> {
        self.submissions.lock().push((username.to_string(), score));
        let mut board = self.board.lock();
        match board.iter_mut().find(|e| e.username == username) {
            Some(entry) => entry.score = entry.score.max(score),
            None => board.push(LeaderboardEntry {
                username: username.to_string(),
                score,
                rank: None,
            }),
        }
        board.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(())
    }

    async fn my_practice_data(&self) -> Result<PracticeData, GraphQlError> {
        Ok(PracticeData::default())
    }
}

#[derive(Clone, Default)]
struct FakeTournaments;

impl TournamentService for FakeTournaments {
    async fn tournaments(&self) -> Result<Vec<Tournament>, GraphQlError> {
        Ok(Vec::new())
    }

    async fn create_tournament(&self, _data: &NewTournament) -> Result<(), GraphQlError> {
        Ok(())
    }

    async fn join_tournament(&self, _id: &str, _username: &str) -> Result<(), GraphQlError> {
        Ok(())
    }

    async fn is_participant(&self, _id: &str, _username: &str) -> Result<bool, GraphQlError> {
        Ok(false)
    }

    async fn submit_score(
        &self,
        _id: &str,
        _username: &str,
        _score: u32,
    ) -> Result<(), GraphQlError> {
        Ok(())
    }

    async fn leaderboard(&self, _id: &str) -> Result<Vec<LeaderboardEntry>, GraphQlError> {
        Ok(Vec::new())
    }

    async fn delete_tournament(&self, _id: &str) -> Result<(), GraphQlError> {
        Ok(())
    }

    async fn update_tournament(
        &self,
        _id: &str,
        _updates: &TournamentUpdate,
    ) -> Result<(), GraphQlError> {
        Ok(())
    }

    async fn toggle_pin(&self, _id: &str, _pinned: bool) -> Result<(), GraphQlError> {
        Ok(())
    }
}

fn stores(name: &str) -> (SessionStore, FallbackCache) {
    let dir = std::env::temp_dir();
    let session = SessionStore::new(dir.join(format!(
        "flappy-e2e-session-{}-{}",
        name,
        std::process::id()
    )));
    session.clear();
    let cache_path = dir.join(format!("flappy-e2e-cache-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_file(&cache_path);
    (session, FallbackCache::new(cache_path))
}

#[tokio::test]
async fn full_practice_round_submits_and_restarts() {
    let leaderboard = FakeLeaderboard::default();
    let (session, cache) = stores("round");
    let mut machine = AppMachine::new(
        FakeAuth,
        leaderboard.clone(),
        FakeTournaments,
        session,
        cache,
    );

    machine.bootstrap().await;
    assert_eq!(machine.state().screen, Screen::Auth);

    machine.authenticate("alice", "secret99").await.unwrap();
    assert_eq!(machine.state().screen, Screen::ModeSelection);

    machine.select_practice_mode().await;
    assert_eq!(machine.state().screen, Screen::Game);
    assert!(machine.engine().is_running());

    // Start button: the bird starts falling and, with zero jumps, the run
    // terminates on its own within a few hundred frames.
    machine.start_game();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
    let (final_score, was_high_score) = loop {
        let event = tokio::time::timeout_at(deadline, machine.recv_engine_event())
            .await
            .expect("run did not finish in time")
            .expect("engine event channel closed");

        let game_over = match &event {
            SessionEvent::GameOver {
                score,
                is_new_high_score,
                ..
            } => Some((*score, *is_new_high_score)),
            _ => None,
        };
        machine.handle_engine_event(event).await;
        if let Some(result) = game_over {
            break result;
        }
    };

    // The loop unschedules itself after the game-over frame
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!machine.engine().is_running());

    let submissions = leaderboard.submissions.lock().clone();
    if final_score > 0 {
        // A positive score on a fresh account is always a new high score
        // and is submitted to the practice leaderboard exactly once
        assert!(was_high_score);
        assert_eq!(submissions, vec![("alice".to_string(), final_score)]);
        assert_eq!(machine.state().practice_best, final_score);
        assert_eq!(machine.state().rank, Some(1));
    } else {
        assert!(!was_high_score);
        assert!(submissions.is_empty());
    }

    // Restart gives a fresh session under a new frame loop
    machine.restart_game();
    assert!(machine.engine().is_running());
    assert_eq!(machine.engine().score(), 0);
    assert!(machine.engine().controls_enabled());

    // Leaving the screen cancels the loop
    machine.back_to_mode_selection();
    assert!(!machine.engine().is_running());
    assert_eq!(machine.state().screen, Screen::ModeSelection);
}
