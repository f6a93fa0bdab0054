use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::SessionSummary;
use crate::session::{Activity, HoldStats};

/// Every state change of the session engine produces an Event.
/// Front ends render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        pattern: String,
        phase_count: usize,
        countdown: f64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase: usize,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase: usize,
        countdown: f64,
        at: DateTime<Utc>,
    },
    HoldStarted {
        /// Phase that was interrupted.
        phase: usize,
        at: DateTime<Utc>,
    },
    HoldEnded {
        duration_secs: u64,
        resumed_phase: usize,
        hold_stats: HoldStats,
        at: DateTime<Utc>,
    },
    PhaseAdvanced {
        phase: usize,
        cycle: u64,
        countdown: f64,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        cycle: u64,
        breath_count: u64,
        at: DateTime<Utc>,
    },
    SessionEnded {
        summary: SessionSummary,
        /// False when the sink rejected the summary; the session ended
        /// anyway. A deferred remote upload counts as accepted here and is
        /// settled later by `UploadsSettled`.
        persisted: bool,
        at: DateTime<Utc>,
    },
    /// Background uploads queued by a remote sink have all finished.
    UploadsSettled {
        uploaded: usize,
        failed: usize,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        activity: Activity,
        is_active: bool,
        is_paused: bool,
        is_holding: bool,
        current_phase: usize,
        current_cycle: u64,
        elapsed_secs: u64,
        countdown: f64,
        session_completed: bool,
        hold_stats: HoldStats,
        breath_count: u64,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::HoldStarted {
            phase: 2,
            at: DateTime::<Utc>::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "HoldStarted");
        assert_eq!(json["phase"], 2);
    }

    #[test]
    fn upload_outcome_is_its_own_event() {
        let event = Event::UploadsSettled {
            uploaded: 0,
            failed: 1,
            at: DateTime::<Utc>::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "UploadsSettled");
        assert_eq!(json["failed"], 1);
    }
}
