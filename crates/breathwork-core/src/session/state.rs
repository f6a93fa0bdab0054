use serde::{Deserialize, Serialize};

/// What the session is doing right now.
///
/// Exactly one variant holds at a time, which rules out combinations such
/// as "holding but not paused" that two independent flags would allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Idle,
    Running,
    Paused,
    Holding,
}

/// Aggregate hold statistics for one session, in whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldStats {
    pub hold_count: u64,
    pub total_hold_time: u64,
    pub longest_hold: u64,
    pub current_hold_time: u64,
}

impl HoldStats {
    /// Fold a finished hold into the aggregates.
    pub(crate) fn record(&mut self, duration_secs: u64) {
        self.hold_count += 1;
        self.total_hold_time += duration_secs;
        self.longest_hold = self.longest_hold.max(duration_secs);
        self.current_hold_time = 0;
    }
}

/// Mutable state of one session, owned by the engine.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub activity: Activity,
    pub current_phase: usize,
    pub current_cycle: u64,
    /// Seconds remaining in the current phase.
    pub countdown: f64,
    /// Elapsed seconds net of ordinary pauses. Frozen after `end`.
    pub elapsed_secs: u64,
    pub hold_stats: HoldStats,
    /// One-shot flag raised by a clean `end`, cleared by the next `start`.
    pub session_completed: bool,
    /// Wall ms; shifted forward by every ordinary pause.
    pub(crate) started_at_ms: Option<u64>,
    pub(crate) paused_at_ms: Option<u64>,
    pub(crate) hold_started_at_ms: Option<u64>,
    /// Last whole-second boundary on the phase clock timeline.
    pub(crate) phase_ref_ms: u64,
}

impl SessionState {
    pub fn idle() -> Self {
        Self {
            activity: Activity::Idle,
            current_phase: 0,
            current_cycle: 0,
            countdown: 0.0,
            elapsed_secs: 0,
            hold_stats: HoldStats::default(),
            session_completed: false,
            started_at_ms: None,
            paused_at_ms: None,
            hold_started_at_ms: None,
            phase_ref_ms: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.activity != Activity::Idle
    }

    /// Phase progression is suspended (ordinary pause or hold).
    pub fn is_paused(&self) -> bool {
        matches!(self.activity, Activity::Paused | Activity::Holding)
    }

    pub fn is_holding(&self) -> bool {
        self.activity == Activity::Holding
    }

    pub fn is_running(&self) -> bool {
        self.activity == Activity::Running
    }

    /// Phase boundaries crossed since start.
    pub fn breath_count(&self, pattern_len: usize) -> u64 {
        self.current_cycle * pattern_len as u64 + self.current_phase as u64
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle()
    }
}
