// Message types exchanged between the app event loop and the front end.

use chrono::{DateTime, Local};

use crate::valuation::EngineSnapshot;

/// Updates pushed from the app loop to the front end.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    /// A refresh succeeded and produced a new snapshot.
    Snapshot {
        snapshot: Box<EngineSnapshot>,
        refreshed_at: DateTime<Local>,
    },
    /// A refresh failed. The previous snapshot stays current but is stale.
    RefreshFailed {
        message: String,
        last_success: Option<DateTime<Local>>,
    },
    /// Auto-refresh flag or interval changed.
    RefreshSettings { auto_refresh: bool, interval_secs: u64 },
    /// A one-line message for the user.
    Notice(String),
}

/// Commands sent from the front end to the app loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Refresh now. Coalesced if a refresh is already running.
    Refresh,
    ToggleAutoRefresh,
    SetInterval(u64),
    Quit,
}
