//! Frame-loop driver around a [`GameSession`]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::util::time::FRAME_DURATION_MICROS;

use super::session::GameSession;
use super::snapshot::FrameSnapshot;
use super::SessionEvent;

/// Drives a session one frame at a time on a tokio task.
///
/// At most one frame task is scheduled at any time: `start_loop` refuses to
/// double-schedule, and both scheduling and every tick check the shared
/// running flag, so a stale tick that fires after `stop_loop` exits without
/// side effects.
pub struct GameEngine {
    session: Arc<Mutex<GameSession>>,
    running: Arc<AtomicBool>,
    loop_task: Option<JoinHandle<()>>,
    event_tx: mpsc::Sender<SessionEvent>,
    snapshot_tx: broadcast::Sender<FrameSnapshot>,
}

impl GameEngine {
    pub fn new(seed: u64, event_tx: mpsc::Sender<SessionEvent>) -> Self {
        let (snapshot_tx, _) = broadcast::channel(64);
        Self {
            session: Arc::new(Mutex::new(GameSession::new(seed))),
            running: Arc::new(AtomicBool::new(false)),
            loop_task: None,
            event_tx,
            snapshot_tx,
        }
    }

    /// Subscribe to per-frame render snapshots
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<FrameSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start scheduling frames. No-op when a loop is already scheduled.
    pub fn start_loop(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let session = self.session.clone();
        let running = self.running.clone();
        let event_tx = self.event_tx.clone();
        let snapshot_tx = self.snapshot_tx.clone();

        self.loop_task = Some(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_micros(FRAME_DURATION_MICROS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                // A tick that fires after an explicit stop must be silent
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let (events, snapshot) = {
                    let mut session = session.lock();
                    let events = session.step();
                    (events, FrameSnapshot::of(&session))
                };

                // Never block the frame cadence on subscribers
                let _ = snapshot_tx.send(snapshot);

                let mut session_over = false;
                for event in events {
                    if matches!(event, SessionEvent::GameOver { .. }) {
                        session_over = true;
                    }
                    if event_tx.send(event).await.is_err() {
                        session_over = true;
                        break;
                    }
                }

                if session_over {
                    running.store(false, Ordering::SeqCst);
                    debug!("frame loop stopped at game over");
                    break;
                }
            }
        }));
    }

    /// Cancel any pending frame and clear the running flag
    pub fn stop_loop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.loop_task.take() {
            task.abort();
        }
    }

    pub fn handle_jump(&self) {
        self.session.lock().handle_jump();
    }

    pub fn enable_controls(&self) {
        self.session.lock().enable_controls();
    }

    pub fn controls_enabled(&self) -> bool {
        self.session.lock().controls_enabled()
    }

    pub fn reset(&self) {
        self.session.lock().reset();
    }

    pub fn score(&self) -> u32 {
        self.session.lock().score()
    }

    pub fn best(&self) -> u32 {
        self.session.lock().best()
    }

    /// Seed the session's best score from a remote leaderboard read
    pub fn set_best(&self, best: u32) {
        self.session.lock().set_best(best);
    }
}

impl Drop for GameEngine {
    fn drop(&mut self) {
        self.stop_loop();
    }
}
