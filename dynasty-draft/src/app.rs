// Application state and orchestration logic.
//
// The central event loop drives draft refreshes from a timer and from user
// commands, evaluates each fresh DraftState into an EngineSnapshot, and
// pushes UI updates to the front end.

use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::RefreshConfig;
use crate::draft::state::{DraftPhase, DraftState};
use crate::draft::tracker::DraftStateTracker;
use crate::feed::FeedUnavailable;
use crate::protocol::{UiUpdate, UserCommand};
use crate::valuation::{Engine, EngineSnapshot};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// What a finished refresh task hands back: the tracker (so the next refresh
/// can reuse its cached metadata) and the outcome.
type RefreshOutput = (DraftStateTracker, Result<DraftState, FeedUnavailable>);

/// Where a refresh request came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshTrigger {
    Startup,
    Timer,
    Manual,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub engine: Engine,
    pub auto_refresh: bool,
    pub interval: Duration,
    /// The last successfully evaluated snapshot. Replaced wholesale.
    pub latest: Option<EngineSnapshot>,
    pub last_success: Option<DateTime<Local>>,
    /// Whether the most recent refresh failed.
    pub stale: bool,
}

impl AppState {
    pub fn new(engine: Engine, refresh: &RefreshConfig) -> Self {
        AppState {
            engine,
            auto_refresh: refresh.auto_refresh,
            interval: Duration::from_secs(refresh.interval_secs),
            latest: None,
            last_success: None,
            stale: false,
        }
    }

    /// Fold a refresh outcome into the state and build the UI update.
    ///
    /// On failure the previous snapshot is kept untouched.
    pub fn apply_refresh(&mut self, result: Result<DraftState, FeedUnavailable>) -> UiUpdate {
        match result {
            Ok(draft_state) => {
                let previous_phase = self.latest.as_ref().map(|s| s.state.phase);
                let snapshot = self.engine.evaluate(draft_state);
                if previous_phase != Some(snapshot.state.phase) {
                    info!("Draft phase is now {:?}", snapshot.state.phase);
                }
                if snapshot.state.phase == DraftPhase::Complete
                    && previous_phase != Some(DraftPhase::Complete)
                {
                    info!(
                        "Draft complete after {} picks",
                        snapshot.state.pick_count()
                    );
                }
                let now = Local::now();
                self.latest = Some(snapshot.clone());
                self.last_success = Some(now);
                self.stale = false;
                UiUpdate::Snapshot {
                    snapshot: Box::new(snapshot),
                    refreshed_at: now,
                }
            }
            Err(e) => {
                warn!("Refresh failed, keeping previous snapshot: {}", e);
                self.stale = true;
                UiUpdate::RefreshFailed {
                    message: e.to_string(),
                    last_success: self.last_success,
                }
            }
        }
    }

    fn settings_update(&self) -> UiUpdate {
        UiUpdate::RefreshSettings {
            auto_refresh: self.auto_refresh,
            interval_secs: self.interval.as_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Refresh scheduling
// ---------------------------------------------------------------------------

/// A ticker whose first tick is one full period away.
fn refresh_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Start a refresh unless one is already running.
///
/// The tracker is moved into the task and comes back with its result, so
/// while `tracker` is `None` a refresh is in flight and further requests
/// are dropped.
fn start_refresh(
    tracker: &mut Option<DraftStateTracker>,
    in_flight: &mut Option<JoinHandle<RefreshOutput>>,
    trigger: RefreshTrigger,
) -> bool {
    let Some(mut t) = tracker.take() else {
        debug!("Refresh already in flight; coalescing {:?} request", trigger);
        return false;
    };
    debug!("Starting {:?} refresh", trigger);
    *in_flight = Some(tokio::spawn(async move {
        let result = t.refresh().await;
        (t, result)
    }));
    true
}

/// Await the in-flight refresh, or never resolve when there is none.
async fn join_refresh(
    in_flight: &mut Option<JoinHandle<RefreshOutput>>,
) -> Result<RefreshOutput, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens with `tokio::select!` on:
/// 1. The auto-refresh timer (only while auto-refresh is on)
/// 2. Completion of the in-flight refresh
/// 3. User commands from the front end
///
/// Exactly one refresh runs at a time. Turning auto-refresh off stops the
/// timer but lets an in-flight refresh finish.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
    tracker: DraftStateTracker,
) -> anyhow::Result<()> {
    info!(
        "Application event loop started for {} (auto-refresh {}, every {:?})",
        tracker.participant(),
        state.auto_refresh,
        state.interval
    );

    let mut tracker = Some(tracker);
    let mut in_flight: Option<JoinHandle<RefreshOutput>> = None;
    let mut ticker = refresh_ticker(state.interval);

    let _ = ui_tx.send(state.settings_update()).await;
    start_refresh(&mut tracker, &mut in_flight, RefreshTrigger::Startup);

    loop {
        tokio::select! {
            // --- Auto-refresh timer ---
            _ = ticker.tick(), if state.auto_refresh => {
                start_refresh(&mut tracker, &mut in_flight, RefreshTrigger::Timer);
            }

            // --- In-flight refresh finished ---
            joined = join_refresh(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                match joined {
                    Ok((t, result)) => {
                        tracker = Some(t);
                        let update = state.apply_refresh(result);
                        let _ = ui_tx.send(update).await;
                    }
                    Err(e) => {
                        error!("Refresh task failed: {}", e);
                        return Err(anyhow::anyhow!("refresh task failed: {e}"));
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(UserCommand::Refresh) => {
                        if !start_refresh(&mut tracker, &mut in_flight, RefreshTrigger::Manual) {
                            let _ = ui_tx
                                .send(UiUpdate::Notice("Refresh already in progress".into()))
                                .await;
                        }
                    }
                    Some(UserCommand::ToggleAutoRefresh) => {
                        state.auto_refresh = !state.auto_refresh;
                        info!("Auto-refresh {}", if state.auto_refresh { "on" } else { "off" });
                        if state.auto_refresh {
                            ticker.reset();
                        }
                        let _ = ui_tx.send(state.settings_update()).await;
                    }
                    Some(UserCommand::SetInterval(secs)) => {
                        if secs == 0 {
                            let _ = ui_tx
                                .send(UiUpdate::Notice("Refresh interval must be at least 1 second".into()))
                                .await;
                        } else {
                            state.interval = Duration::from_secs(secs);
                            ticker = refresh_ticker(state.interval);
                            info!("Refresh interval set to {}s", secs);
                            let _ = ui_tx.send(state.settings_update()).await;
                        }
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    if let Some(handle) = in_flight {
        handle.abort();
    }
    info!("Application event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
