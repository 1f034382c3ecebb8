//! Flappy arcade client core - headless driver
//!
//! Boots the app state machine against the remote GraphQL leaderboard
//! service and drives it from line-based input commands, logging UI
//! events as they happen. A real front end would subscribe to the same
//! event and snapshot streams.

use std::fs;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flappy_core::app::{AppMachine, UiEvent};
use flappy_core::config::Config;
use flappy_core::store::{
    FallbackCache, GraphQlAuthService, GraphQlClient, GraphQlLeaderboardService,
    GraphQlTournamentService, SessionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Flappy arcade core");
    info!("Service endpoint: {}", config.graphql_endpoint());

    fs::create_dir_all(&config.data_dir)?;

    // Construct remote collaborators and local stores
    let client = GraphQlClient::new(&config);
    let auth = GraphQlAuthService::new(client.clone(), config.chain_id.clone());
    let leaderboard = GraphQlLeaderboardService::new(client.clone());
    let tournaments = GraphQlTournamentService::new(client, config.chain_id.clone());
    let session_store = SessionStore::new(config.session_file());
    let cache = FallbackCache::new(config.tournament_cache_file());

    let mut machine = AppMachine::new(auth, leaderboard, tournaments, session_store, cache);

    // Log UI notifications as they happen
    let mut ui_rx = machine.subscribe_ui();
    tokio::spawn(async move {
        while let Ok(event) = ui_rx.recv().await {
            match event {
                UiEvent::ScreenChanged { from, to } => info!(?from, ?to, "screen changed"),
                UiEvent::ModeChanged { to, .. } => info!(?to, "mode changed"),
                UiEvent::AuthStateChanged { user } => match user {
                    Some(user) => info!(username = %user.username, "signed in"),
                    None => info!("signed out"),
                },
                UiEvent::LeaderboardUpdated(entries) => {
                    info!(entries = entries.len(), "leaderboard updated")
                }
                UiEvent::TournamentsUpdated(tournaments) => {
                    info!(tournaments = tournaments.len(), "tournament list updated")
                }
                UiEvent::PlayerBest(best) => info!(best, "best updated"),
                UiEvent::PlayerRank(rank) => info!(?rank, "rank updated"),
                UiEvent::Notice(message) => info!("{message}"),
                UiEvent::ConnectionFailed(message) => {
                    warn!("connection failed: {message} (type `retry` to try again)")
                }
            }
        }
    });

    machine.bootstrap().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = machine.recv_engine_event() => {
                if let Some(event) = event {
                    machine.handle_engine_event(event).await;
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !dispatch(&mut machine, line.trim()).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}

type Machine =
    AppMachine<GraphQlAuthService, GraphQlLeaderboardService, GraphQlTournamentService>;

/// Map one input line to a machine operation. Returns false to quit.
async fn dispatch(machine: &mut Machine, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();

    let result = match command {
        "" => Ok(()),
        "quit" | "exit" => return false,
        "retry" => {
            machine.retry_connection().await;
            Ok(())
        }
        "login" => match (parts.next(), parts.next()) {
            (Some(username), Some(password)) => machine.authenticate(username, password).await,
            _ => {
                warn!("usage: login <username> <password>");
                Ok(())
            }
        },
        "logout" => {
            machine.logout().await;
            Ok(())
        }
        "practice" => {
            machine.select_practice_mode().await;
            Ok(())
        }
        "tournaments" => {
            machine.select_tournament_mode().await;
            Ok(())
        }
        "join" => match parts.next() {
            Some(id) => machine.select_tournament(id).await,
            None => {
                warn!("usage: join <tournament-id>");
                Ok(())
            }
        },
        "start" => {
            machine.start_game();
            Ok(())
        }
        "jump" | "j" => {
            machine.handle_jump();
            Ok(())
        }
        "restart" => {
            machine.restart_game();
            Ok(())
        }
        "back" => {
            machine.back_to_mode_selection();
            Ok(())
        }
        "refresh" => {
            machine.refresh_leaderboard().await;
            Ok(())
        }
        "pin" => match parts.next() {
            Some(id) => machine.toggle_tournament_pin(id).await,
            None => {
                warn!("usage: pin <tournament-id>");
                Ok(())
            }
        },
        "delete" => match parts.next() {
            Some(id) => machine.delete_tournament(id).await,
            None => {
                warn!("usage: delete <tournament-id>");
                Ok(())
            }
        },
        other => {
            warn!("unknown command: {other}");
            Ok(())
        }
    };

    if let Err(error) = result {
        warn!("{error}");
    }
    true
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
