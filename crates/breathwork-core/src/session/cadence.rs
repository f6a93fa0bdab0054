//! Recurring callbacks owned by the engine.
//!
//! Each cadence is a period plus the next deadline. Nothing runs on its own:
//! the engine's `poll()` fires whichever cadences are due, and each one
//! re-arms only while its predicate still holds.

use serde::{Deserialize, Serialize};

/// Periods for the three recurring callbacks, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    #[serde(default = "default_hold_sample_ms")]
    pub hold_sample_ms: u64,
    #[serde(default = "default_elapsed_tick_ms")]
    pub elapsed_tick_ms: u64,
}

fn default_frame_ms() -> u64 {
    16
}
fn default_hold_sample_ms() -> u64 {
    100
}
fn default_elapsed_tick_ms() -> u64 {
    1000
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            hold_sample_ms: default_hold_sample_ms(),
            elapsed_tick_ms: default_elapsed_tick_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    period_ms: u64,
    next_due_ms: Option<u64>,
}

impl Cadence {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_due_ms: None,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    pub fn is_armed(&self) -> bool {
        self.next_due_ms.is_some()
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.next_due_ms.is_some_and(|due| now_ms >= due)
    }

    /// Schedule the next firing one period from `now_ms`.
    pub fn arm(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.period_ms));
    }

    pub fn disarm(&mut self) {
        self.next_due_ms = None;
    }
}

/// The phase clock, hold sampler and elapsed ticker of one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadences {
    pub phase_clock: Cadence,
    pub hold_sampler: Cadence,
    pub elapsed_ticker: Cadence,
}

impl Cadences {
    pub fn new(config: CadenceConfig) -> Self {
        Self {
            phase_clock: Cadence::new(config.frame_ms),
            hold_sampler: Cadence::new(config.hold_sample_ms),
            elapsed_ticker: Cadence::new(config.elapsed_tick_ms),
        }
    }

    pub fn release_all(&mut self) {
        self.phase_clock.disarm();
        self.hold_sampler.disarm();
        self.elapsed_ticker.disarm();
    }

    pub fn any_armed(&self) -> bool {
        self.phase_clock.is_armed() || self.hold_sampler.is_armed() || self.elapsed_ticker.is_armed()
    }

    /// Earliest deadline across armed cadences.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        [self.phase_clock, self.hold_sampler, self.elapsed_ticker]
            .iter()
            .filter_map(Cadence::next_due_ms)
            .min()
    }
}
