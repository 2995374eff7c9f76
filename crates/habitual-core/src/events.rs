use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::breathing::{Phase, SessionState};

/// Every state change in the system produces an Event.
/// Hosts log them, render them, or forward them to telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        technique_id: Option<u64>,
        total_secs: f64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: f64,
        /// Length of the pause that just ended.
        paused_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseStarted {
        phase: Phase,
        cycle_index: u64,
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        cycles_completed: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        cycles_completed: u64,
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    SessionCancelled {
        cycles_completed: u64,
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        phase: Option<Phase>,
        cycle_index: u64,
        elapsed_secs: f64,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    /// A badge tap the server accepted.
    BadgeTapped {
        activity_type: String,
        count: u64,
        at: DateTime<Utc>,
    },
    /// A badge tap that failed or was refused.
    TapRejected {
        activity_type: String,
        rate_limited: bool,
        at: DateTime<Utc>,
    },
}
