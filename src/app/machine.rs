//! Application state machine: screens, modes and remote-service mediation

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::game::{FrameSnapshot, GameEngine, SessionEvent};
use crate::store::auth::{
    credential_hash, AuthService, AuthUser, MAX_USERNAME_LEN, MIN_PASSWORD_LEN, MIN_USERNAME_LEN,
};
use crate::store::tournaments::{
    sorted_for_display, NewTournament, TournamentService, TournamentStatus, TournamentUpdate,
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN,
};
use crate::store::{
    FallbackCache, GraphQlError, LeaderboardEntry, LeaderboardService, SessionRecord, SessionStore,
};

use super::events::UiEvent;
use super::state::{AppState, GameMode, Screen};

/// Errors surfaced to the caller of a machine operation. Remote failures
/// that have a fallback path never appear here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("tournament not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Remote(#[from] GraphQlError),
}

/// Owns the authoritative cross-screen state, reacts to engine lifecycle
/// events, and mediates every call to the remote service. Collaborators
/// are injected so tests can substitute in-memory fakes.
pub struct AppMachine<A, L, T> {
    auth: A,
    leaderboard: L,
    tournaments: T,
    session_store: SessionStore,
    cache: FallbackCache,
    state: AppState,
    engine: GameEngine,
    engine_events: mpsc::Receiver<SessionEvent>,
    ui_tx: broadcast::Sender<UiEvent>,
}

impl<A, L, T> AppMachine<A, L, T>
where
    A: AuthService,
    L: LeaderboardService,
    T: TournamentService,
{
    pub fn new(
        auth: A,
        leaderboard: L,
        tournaments: T,
        session_store: SessionStore,
        cache: FallbackCache,
    ) -> Self {
        let (event_tx, engine_events) = mpsc::channel(256);
        let (ui_tx, _) = broadcast::channel(64);
        Self {
            auth,
            leaderboard,
            tournaments,
            session_store,
            cache,
            state: AppState::new(),
            engine: GameEngine::new(rand::random::<u64>(), event_tx),
            engine_events,
            ui_tx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn subscribe_ui(&self) -> broadcast::Receiver<UiEvent> {
        self.ui_tx.subscribe()
    }

    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<FrameSnapshot> {
        self.engine.subscribe_snapshots()
    }

    /// Next lifecycle event from the frame loop
    pub async fn recv_engine_event(&mut self) -> Option<SessionEvent> {
        self.engine_events.recv().await
    }

    // ------------------------------------------------------------------
    // Bootstrap and authentication
    // ------------------------------------------------------------------

    /// Initial-loading sequence: probe the remote service, then either
    /// restore the persisted session or fall through to the auth screen.
    /// A probe failure is the one fatal path; the user must retry.
    pub async fn bootstrap(&mut self) {
        info!("bootstrap: connecting to leaderboard service");
        match self.tournaments.tournaments().await {
            Ok(list) => {
                self.cache.store_tournaments(&list);
                self.apply_tournaments(list);
                self.state.bootstrap_complete = true;
            }
            Err(err) => {
                error!(error = %err, "bootstrap connection failed");
                self.emit(UiEvent::ConnectionFailed(err.to_string()));
                return;
            }
        }
        self.restore_session().await;
    }

    /// Manual retry after a bootstrap failure
    pub async fn retry_connection(&mut self) {
        self.set_screen(Screen::InitialLoading);
        self.bootstrap().await;
    }

    async fn restore_session(&mut self) {
        if let Some(record) = self.session_store.load() {
            match self
                .auth
                .login_or_register(&record.username, &record.credentials_hash)
                .await
            {
                Ok(user) => {
                    info!(username = %user.username, "session restored");
                    self.finish_login(user).await;
                    self.set_screen(Screen::ModeSelection);
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "stored session re-auth failed");
                    self.session_store.clear();
                }
            }
        }
        self.set_screen(Screen::Auth);
    }

    /// Verify credentials against the remote service. Validation happens
    /// locally first so bad input never costs a round trip.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please enter both username and password".to_string(),
            ));
        }
        if username.len() < MIN_USERNAME_LEN || username.len() > MAX_USERNAME_LEN {
            return Err(AppError::Validation(format!(
                "Username must be {}-{} characters",
                MIN_USERNAME_LEN, MAX_USERNAME_LEN
            )));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let hash = credential_hash(username, password);
        match self.auth.login_or_register(username, &hash).await {
            Ok(user) => {
                self.session_store
                    .save(&SessionRecord::new(user.username.clone(), user.role, hash));
                self.finish_login(user).await;
                self.set_screen(Screen::ModeSelection);
                Ok(())
            }
            Err(err) => {
                // Surface the message; the auth screen stays up
                self.emit(UiEvent::Notice(err.to_string()));
                Err(err.into())
            }
        }
    }

    async fn finish_login(&mut self, user: AuthUser) {
        self.state.user = Some(user.clone());
        self.emit(UiEvent::AuthStateChanged { user: Some(user) });

        // Seed personal practice stats; purely best-effort
        match self.leaderboard.my_practice_data().await {
            Ok(data) => {
                self.state.practice_best = data.best;
                self.state.practice_scores = data.scores;
                self.emit(UiEvent::PlayerBest(data.best));
            }
            Err(err) => debug!(error = %err, "personal practice stats unavailable"),
        }
    }

    /// Clear everything and restart the loading flow from scratch
    pub async fn logout(&mut self) {
        self.session_store.clear();
        self.engine.stop_loop();
        self.engine.reset();
        self.engine.set_best(0);
        self.state.clear_user_state();
        self.emit(UiEvent::AuthStateChanged { user: None });
        self.set_screen(Screen::InitialLoading);
        self.bootstrap().await;
    }

    // ------------------------------------------------------------------
    // Mode selection and gameplay control
    // ------------------------------------------------------------------

    /// Enter practice mode: fresh session, game screen, leaderboard load.
    /// Any previous frame loop is fully cancelled before the new one
    /// starts; overlapping loops must never exist.
    pub async fn select_practice_mode(&mut self) {
        self.engine.stop_loop();
        self.engine.reset();
        self.state.active_tournament = None;
        self.set_mode(Some(GameMode::Practice));
        self.set_screen(Screen::Game);
        self.load_practice_leaderboard().await;
        self.engine.start_loop();
    }

    /// Enter tournament mode: show the tournament list
    pub async fn select_tournament_mode(&mut self) {
        self.set_mode(Some(GameMode::Tournament));
        self.set_screen(Screen::TournamentList);
        self.load_tournaments().await;
    }

    /// Join (idempotently) and, when the tournament is live, enter it
    pub async fn select_tournament(&mut self, id: &str) -> Result<(), AppError> {
        let Some(player) = self.state.player_name().map(str::to_string) else {
            return Err(AppError::Unauthorized("Not signed in".to_string()));
        };
        let Some(tournament) = self.state.tournaments.iter().find(|t| t.id == id).cloned() else {
            return Err(AppError::NotFound(id.to_string()));
        };

        if tournament.status == TournamentStatus::Ended {
            self.emit(UiEvent::Notice(format!(
                "Tournament \"{}\" has ended. You can no longer play in this tournament.",
                tournament.name
            )));
            return Ok(());
        }

        // Check membership first so a duplicate join is never surfaced as
        // a failure.
        let already_joined = match self.tournaments.is_participant(id, &player).await {
            Ok(joined) => joined,
            Err(err) => {
                warn!(error = %err, "participant check failed, attempting join");
                false
            }
        };

        if !already_joined {
            match self.tournaments.join_tournament(id, &player).await {
                Ok(()) => info!(tournament = id, "joined tournament"),
                Err(err) if err.is_already_joined() => {
                    info!(tournament = id, "already joined, proceeding");
                }
                Err(err) => {
                    self.emit(UiEvent::Notice(
                        "Failed to join tournament. Please try again.".to_string(),
                    ));
                    return Err(err.into());
                }
            }
        }

        // Pick up the updated participant list and counts
        self.load_tournaments().await;
        let tournament = self
            .state
            .tournaments
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap_or(tournament);

        match tournament.status {
            TournamentStatus::Registration => {
                let message = if already_joined {
                    format!(
                        "Welcome back to \"{}\"! You are already registered. Gameplay opens once the tournament becomes active.",
                        tournament.name
                    )
                } else {
                    format!(
                        "Welcome to \"{}\"! You have joined; gameplay opens once the tournament becomes active.",
                        tournament.name
                    )
                };
                self.emit(UiEvent::Notice(message));
            }
            TournamentStatus::Active => {
                self.engine.stop_loop();
                self.engine.reset();
                self.state.active_tournament = Some(tournament.clone());
                self.set_mode(Some(GameMode::Tournament));
                self.set_screen(Screen::Game);
                self.emit(UiEvent::Notice(if already_joined {
                    "You are already in this tournament! Welcome back.".to_string()
                } else {
                    "Successfully joined tournament!".to_string()
                }));
                self.engine.start_loop();
                // Play works even when the leaderboard read fails
                self.load_tournament_leaderboard(&tournament.id).await;
            }
            TournamentStatus::Ended => {
                self.emit(UiEvent::Notice(format!(
                    "Tournament \"{}\" has ended. You can no longer play in this tournament.",
                    tournament.name
                )));
            }
        }
        Ok(())
    }

    /// Start button: enable controls once the mode's status gate allows it
    pub fn start_game(&mut self) {
        if self.tournament_gate_blocks() {
            return;
        }
        self.engine.enable_controls();
    }

    /// Restart after a game over: fresh session state, new frame loop
    pub fn restart_game(&mut self) {
        if self.tournament_gate_blocks() {
            return;
        }
        self.engine.reset();
        self.engine.start_loop();
        self.engine.enable_controls();
    }

    /// Jump input from the view layer
    pub fn handle_jump(&mut self) {
        if self.state.screen != Screen::Game {
            return;
        }
        if self.state.mode == Some(GameMode::Tournament) {
            if let Some(tournament) = &self.state.active_tournament {
                if tournament.status != TournamentStatus::Active {
                    // Silent: the start/restart gate already messaged
                    return;
                }
            }
        }
        self.engine.handle_jump();
    }

    /// Leave the game screen back to mode selection
    pub fn back_to_mode_selection(&mut self) {
        self.engine.stop_loop();
        self.engine.reset();
        self.set_screen(Screen::ModeSelection);
    }

    fn tournament_gate_blocks(&mut self) -> bool {
        if self.state.mode != Some(GameMode::Tournament) {
            return false;
        }
        let Some(tournament) = &self.state.active_tournament else {
            return false;
        };
        match tournament.status {
            TournamentStatus::Active => false,
            TournamentStatus::Registration => {
                let message = format!(
                    "Tournament \"{}\" is still in registration phase. Please wait until it becomes active to start playing.",
                    tournament.name
                );
                self.emit(UiEvent::Notice(message));
                true
            }
            TournamentStatus::Ended => {
                let message = format!(
                    "Tournament \"{}\" has ended. You can no longer play in this tournament.",
                    tournament.name
                );
                self.emit(UiEvent::Notice(message));
                true
            }
        }
    }

    // ------------------------------------------------------------------
    // Engine lifecycle events
    // ------------------------------------------------------------------

    /// Pump one lifecycle event from the frame loop, in frame order
    pub async fn handle_engine_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Score(score) => debug!(score, "score update"),
            SessionEvent::HighScore(score) => self.on_high_score(score).await,
            SessionEvent::GameOver { score, .. } => self.on_game_over(score).await,
        }
    }

    /// Fired only when a run beats the stored best. Practice submission
    /// lives here. Tournament submission belongs to the game-over hook:
    /// every tournament attempt counts, not just personal bests.
    async fn on_high_score(&mut self, score: u32) {
        if self.state.mode != Some(GameMode::Practice) {
            return;
        }
        let Some(player) = self.state.player_name().map(str::to_string) else {
            return;
        };

        match self.leaderboard.submit_practice_score(&player, score).await {
            Ok(()) => {
                info!(score, "practice score submitted");
                self.state.practice_scores.push(score);
                if score > self.state.practice_best {
                    self.state.practice_best = score;
                }
                self.load_practice_leaderboard().await;
            }
            Err(err) => warn!(error = %err, "failed to submit practice score"),
        }
    }

    /// Every game over lands here. Tournament scores are submitted
    /// unconditionally while the bound tournament is live and the player
    /// participates; practice merely refreshes the board (submission is
    /// the high-score hook's job).
    async fn on_game_over(&mut self, score: u32) {
        let submission = match (self.state.mode, &self.state.active_tournament) {
            (Some(GameMode::Tournament), Some(tournament))
                if tournament.status == TournamentStatus::Active =>
            {
                self.state
                    .player_name()
                    .filter(|p| tournament.has_participant(p))
                    .map(|p| (tournament.id.clone(), p.to_string()))
            }
            _ => None,
        };

        if let Some((tournament_id, player)) = submission {
            match self
                .tournaments
                .submit_score(&tournament_id, &player, score)
                .await
            {
                Ok(()) => {
                    info!(score, tournament = %tournament_id, "tournament score submitted");
                    if score > self.state.tournament_best {
                        self.state.tournament_best = score;
                    }
                }
                Err(err) => warn!(error = %err, "failed to submit tournament score"),
            }
            self.load_tournament_leaderboard(&tournament_id).await;
        } else if self.state.mode == Some(GameMode::Practice) {
            self.load_practice_leaderboard().await;
        }

        self.emit(UiEvent::PlayerBest(self.state.mode_best()));
    }

    // ------------------------------------------------------------------
    // Leaderboards and tournaments
    // ------------------------------------------------------------------

    /// Re-fetch the leaderboard appropriate to the current mode
    pub async fn refresh_leaderboard(&mut self) {
        match self.state.mode {
            Some(GameMode::Practice) => self.load_practice_leaderboard().await,
            Some(GameMode::Tournament) => {
                let Some(id) = self.state.active_tournament.as_ref().map(|t| t.id.clone()) else {
                    warn!("no active tournament to refresh leaderboard for");
                    return;
                };
                self.load_tournament_leaderboard(&id).await;
            }
            None => warn!("no mode selected, nothing to refresh"),
        }
    }

    async fn load_practice_leaderboard(&mut self) {
        match self.leaderboard.practice_leaderboard().await {
            Ok(entries) => self.apply_leaderboard(entries, GameMode::Practice),
            Err(err) => {
                warn!(error = %err, "failed to load practice leaderboard");
                self.apply_leaderboard(Vec::new(), GameMode::Practice);
            }
        }
    }

    async fn load_tournament_leaderboard(&mut self, id: &str) {
        match self.tournaments.leaderboard(id).await {
            Ok(entries) => self.apply_leaderboard(entries, GameMode::Tournament),
            Err(err) => {
                warn!(error = %err, tournament = id, "failed to load tournament leaderboard");
                self.apply_leaderboard(Vec::new(), GameMode::Tournament);
            }
        }
    }

    /// Install a fresh leaderboard, derive rank and best, and seed the
    /// engine's best so the high-score hook fires against remote truth.
    fn apply_leaderboard(&mut self, entries: Vec<LeaderboardEntry>, scope: GameMode) {
        let rank = self.state.player_name().and_then(|name| {
            entries
                .iter()
                .position(|entry| entry.username == name)
                .map(|i| i + 1)
        });
        let best = rank
            .and_then(|r| entries.get(r - 1))
            .map(|entry| entry.score)
            .unwrap_or(0);

        self.state.leaderboard = entries.clone();
        self.state.rank = rank;
        match scope {
            GameMode::Practice => self.state.practice_best = best,
            GameMode::Tournament => self.state.tournament_best = best,
        }
        self.engine.set_best(best);

        self.emit(UiEvent::LeaderboardUpdated(entries));
        self.emit(UiEvent::PlayerRank(rank));
        self.emit(UiEvent::PlayerBest(best));
    }

    /// Fetch the tournament list, falling back to the local cache when the
    /// remote is unavailable. A later successful read overwrites the cache.
    pub async fn load_tournaments(&mut self) {
        match self.tournaments.tournaments().await {
            Ok(list) => {
                self.cache.store_tournaments(&list);
                self.apply_tournaments(list);
            }
            Err(err) => {
                warn!(error = %err, "tournament fetch failed, using cached list");
                let fallback = self.cache.load_tournaments();
                self.apply_tournaments(fallback);
            }
        }
    }

    fn apply_tournaments(&mut self, list: Vec<crate::store::Tournament>) {
        self.state.tournaments = list;

        // The remote is authoritative for the bound tournament too
        if let Some(active_id) = self.state.active_tournament.as_ref().map(|t| t.id.clone()) {
            if let Some(updated) = self
                .state
                .tournaments
                .iter()
                .find(|t| t.id == active_id)
                .cloned()
            {
                self.state.active_tournament = Some(updated);
            }
        }

        self.emit(UiEvent::TournamentsUpdated(sorted_for_display(
            self.state.tournaments.clone(),
        )));
    }

    // ------------------------------------------------------------------
    // Admin operations
    // ------------------------------------------------------------------

    fn require_admin(&self, action: &str) -> Result<(), AppError> {
        if self.state.is_admin() {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "Only administrators can {}.",
                action
            )))
        }
    }

    /// Navigate to the creation form (admin only)
    pub fn open_tournament_creation(&mut self) -> Result<(), AppError> {
        self.require_admin("create tournaments")?;
        self.set_screen(Screen::TournamentCreation);
        Ok(())
    }

    pub async fn create_tournament(&mut self, data: NewTournament) -> Result<(), AppError> {
        self.require_admin("create tournaments")?;

        let name = data.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Please fill in all required fields.".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Tournament name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        if data.description.len() > MAX_DESCRIPTION_LEN {
            return Err(AppError::Validation(format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        let now = Utc::now();
        if data.start_time <= now {
            return Err(AppError::Validation(
                "Start date must be in the future.".to_string(),
            ));
        }
        if data.end_time <= data.start_time {
            return Err(AppError::Validation(
                "End date must be after start date.".to_string(),
            ));
        }

        self.tournaments.create_tournament(&data).await?;
        self.load_tournaments().await;
        self.set_screen(Screen::TournamentList);
        self.emit(UiEvent::Notice(format!(
            "Tournament \"{}\" created successfully!",
            name
        )));
        Ok(())
    }

    pub async fn delete_tournament(&mut self, id: &str) -> Result<(), AppError> {
        self.require_admin("delete tournaments")?;
        self.tournaments.delete_tournament(id).await?;
        self.load_tournaments().await;
        Ok(())
    }

    pub async fn update_tournament(
        &mut self,
        id: &str,
        updates: TournamentUpdate,
    ) -> Result<(), AppError> {
        self.require_admin("update tournaments")?;
        self.tournaments.update_tournament(id, &updates).await?;
        self.load_tournaments().await;
        Ok(())
    }

    pub async fn toggle_tournament_pin(&mut self, id: &str) -> Result<(), AppError> {
        self.require_admin("pin tournaments")?;
        let pinned = self
            .state
            .tournaments
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.pinned)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        self.tournaments.toggle_pin(id, !pinned).await?;
        self.load_tournaments().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn set_screen(&mut self, to: Screen) {
        let from = self.state.screen;
        self.state.screen = to;

        // Leaving the game screen always cancels the frame loop
        if from == Screen::Game && to != Screen::Game {
            self.engine.stop_loop();
        }
        self.emit(UiEvent::ScreenChanged { from, to });
    }

    fn set_mode(&mut self, to: Option<GameMode>) {
        let from = self.state.mode;
        self.state.mode = to;
        self.emit(UiEvent::ModeChanged { from, to });
    }

    fn emit(&self, event: UiEvent) {
        // No subscribers is fine; the machine never waits on the view
        let _ = self.ui_tx.send(event);
    }
}
