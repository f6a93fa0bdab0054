//! Breathing session engine.
//!
//! A clock-driven state machine with no internal threads. Commands mutate
//! state immediately; time-based progression happens in `poll()`, which
//! the caller (a [`SessionDriver`](super::SessionDriver) or a test) invokes
//! repeatedly.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running <--pause/resume--> Paused
//!                  |   ^                        |
//!          start_hold  end_hold / resume   start_hold
//!                  v   |                        |
//!                 Holding <---------------------+
//!
//! any active state --end--> Idle
//! ```
//!
//! Operations that do not apply to the current state are silent no-ops
//! returning `None`.

use chrono::{DateTime, Utc};

use super::cadence::{CadenceConfig, Cadences};
use super::state::{Activity, HoldStats, SessionState};
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::pattern::Pattern;
use crate::persistence::{SessionSink, SessionSummary};

const SECOND_MS: u64 = 1000;

pub struct BreathingSessionEngine {
    pattern: Pattern,
    clock: Box<dyn Clock>,
    sink: Box<dyn SessionSink>,
    state: SessionState,
    cadences: Cadences,
}

impl BreathingSessionEngine {
    /// Create an idle engine for `pattern`.
    ///
    /// # Errors
    /// Returns an error if the pattern is empty or has a non-positive phase.
    pub fn new(
        pattern: Pattern,
        clock: Box<dyn Clock>,
        sink: Box<dyn SessionSink>,
    ) -> Result<Self> {
        pattern.validate()?;
        Ok(Self {
            pattern,
            clock,
            sink,
            state: SessionState::idle(),
            cadences: Cadences::new(CadenceConfig::default()),
        })
    }

    pub fn with_cadences(mut self, config: CadenceConfig) -> Self {
        self.cadences = Cadences::new(config);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn activity(&self) -> Activity {
        self.state.activity
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn is_holding(&self) -> bool {
        self.state.is_holding()
    }

    pub fn current_phase(&self) -> usize {
        self.state.current_phase
    }

    pub fn current_cycle(&self) -> u64 {
        self.state.current_cycle
    }

    pub fn countdown(&self) -> f64 {
        self.state.countdown
    }

    /// Seconds since start net of ordinary pauses. Computed live while
    /// running; the last computed value otherwise.
    pub fn elapsed_secs(&self) -> u64 {
        match (self.state.activity, self.state.started_at_ms) {
            (Activity::Running, Some(start)) => {
                self.clock.wall_ms().saturating_sub(start) / SECOND_MS
            }
            _ => self.state.elapsed_secs,
        }
    }

    pub fn hold_stats(&self) -> HoldStats {
        self.state.hold_stats
    }

    pub fn session_completed(&self) -> bool {
        self.state.session_completed
    }

    pub fn breath_count(&self) -> u64 {
        self.state.breath_count(self.pattern.len())
    }

    pub fn cadences(&self) -> &Cadences {
        &self.cadences
    }

    /// Milliseconds on the phase-clock timeline until the next cadence is
    /// due. `None` while nothing is armed.
    pub fn next_deadline_in_ms(&self) -> Option<u64> {
        let now = self.tick_now();
        self.cadences
            .next_deadline_ms()
            .map(|due| due.saturating_sub(now))
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            activity: self.state.activity,
            is_active: self.is_active(),
            is_paused: self.is_paused(),
            is_holding: self.is_holding(),
            current_phase: self.state.current_phase,
            current_cycle: self.state.current_cycle,
            elapsed_secs: self.elapsed_secs(),
            countdown: self.state.countdown,
            session_completed: self.state.session_completed,
            hold_stats: self.state.hold_stats,
            breath_count: self.breath_count(),
            at: self.at(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the pattern. Only allowed while idle.
    ///
    /// # Errors
    /// Returns an error if a session is active or the pattern is invalid.
    pub fn set_pattern(&mut self, pattern: Pattern) -> Result<()> {
        if self.is_active() {
            return Err(ValidationError::InvalidValue {
                field: "pattern".into(),
                message: "end the active session before changing pattern".into(),
            }
            .into());
        }
        pattern.validate()?;
        self.pattern = pattern;
        Ok(())
    }

    /// Start a fresh session. Restarts if one is already active.
    pub fn start(&mut self) -> Option<Event> {
        let wall = self.clock.wall_ms();
        let tick = self.tick_now();
        let first = self.phase_secs(0);

        self.state = SessionState {
            activity: Activity::Running,
            countdown: first,
            started_at_ms: Some(wall),
            phase_ref_ms: tick,
            ..SessionState::idle()
        };
        self.cadences.release_all();
        self.cadences.phase_clock.arm(tick);
        self.cadences.elapsed_ticker.arm(tick);

        tracing::debug!(pattern = %self.pattern.key(), "session started");
        Some(Event::SessionStarted {
            pattern: self.pattern.key(),
            phase_count: self.pattern.len(),
            countdown: first,
            at: self.at(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state.activity != Activity::Running {
            tracing::debug!(activity = ?self.state.activity, "pause ignored");
            return None;
        }
        let wall = self.clock.wall_ms();
        self.refresh_elapsed(wall);
        self.state.activity = Activity::Paused;
        self.state.paused_at_ms = Some(wall);
        Some(Event::SessionPaused {
            phase: self.state.current_phase,
            elapsed_secs: self.state.elapsed_secs,
            at: self.at(),
        })
    }

    /// Resume from a pause or a hold, optionally jumping to `phase`.
    ///
    /// From `Paused` the default phase is the current one. From `Holding`
    /// the hold is accounted first and the default phase is 0. An
    /// out-of-range phase is ignored.
    pub fn resume(&mut self, phase: Option<usize>) -> Option<Event> {
        if phase.is_some_and(|p| p >= self.pattern.len()) {
            tracing::debug!(?phase, "resume ignored: phase out of range");
            return None;
        }
        let wall = self.clock.wall_ms();
        match self.state.activity {
            Activity::Paused => {
                self.credit_pause(wall);
                let target = phase.unwrap_or(self.state.current_phase);
                self.enter_running_at(target);
                Some(Event::SessionResumed {
                    phase: target,
                    countdown: self.state.countdown,
                    at: self.at(),
                })
            }
            Activity::Holding => {
                let duration_secs = self.close_hold(wall);
                let target = phase.unwrap_or(0);
                self.enter_running_at(target);
                Some(Event::HoldEnded {
                    duration_secs,
                    resumed_phase: target,
                    hold_stats: self.state.hold_stats,
                    at: self.at(),
                })
            }
            Activity::Idle | Activity::Running => {
                tracing::debug!(activity = ?self.state.activity, "resume ignored");
                None
            }
        }
    }

    /// Begin a hold. Freezes phase progression until `end_hold`.
    pub fn start_hold(&mut self) -> Option<Event> {
        let wall = self.clock.wall_ms();
        match self.state.activity {
            Activity::Running => self.refresh_elapsed(wall),
            // Time already spent paused is not session time.
            Activity::Paused => self.credit_pause(wall),
            Activity::Idle | Activity::Holding => {
                tracing::debug!(activity = ?self.state.activity, "start_hold ignored");
                return None;
            }
        }
        self.state.activity = Activity::Holding;
        self.state.hold_started_at_ms = Some(wall);
        self.state.hold_stats.current_hold_time = 0;
        self.cadences.hold_sampler.arm(self.tick_now());
        Some(Event::HoldStarted {
            phase: self.state.current_phase,
            at: self.at(),
        })
    }

    /// Finish a hold and restart the pattern at phase 0.
    pub fn end_hold(&mut self) -> Option<Event> {
        if self.state.activity != Activity::Holding {
            tracing::debug!(activity = ?self.state.activity, "end_hold ignored");
            return None;
        }
        let duration_secs = self.close_hold(self.clock.wall_ms());
        self.enter_running_at(0);
        Some(Event::HoldEnded {
            duration_secs,
            resumed_phase: 0,
            hold_stats: self.state.hold_stats,
            at: self.at(),
        })
    }

    /// End the session and hand its summary to the sink.
    ///
    /// A sink failure is logged and reported through `persisted: false`;
    /// the session is over either way.
    pub fn end(&mut self) -> Option<Event> {
        if !self.state.is_active() || self.state.started_at_ms.is_none() {
            tracing::debug!("end ignored: no active session");
            return None;
        }
        let wall = self.clock.wall_ms();
        match self.state.activity {
            Activity::Holding => {
                self.close_hold(wall);
            }
            Activity::Paused => self.credit_pause(wall),
            Activity::Running | Activity::Idle => {}
        }

        let started_at = self.state.started_at_ms.unwrap_or(wall);
        let duration = round_secs(wall.saturating_sub(started_at));
        self.state.elapsed_secs = duration;
        self.state.activity = Activity::Idle;
        self.state.session_completed = true;
        self.cadences.release_all();

        let summary = SessionSummary {
            pattern: self.pattern.key(),
            duration,
            breath_count: self.breath_count(),
            hold_count: self.state.hold_stats.hold_count,
            total_hold_time: self.state.hold_stats.total_hold_time,
            longest_hold: self.state.hold_stats.longest_hold,
        };
        let persisted = match self.sink.save(&summary) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, pattern = %summary.pattern, "failed to persist session");
                false
            }
        };
        tracing::debug!(duration, breaths = summary.breath_count, "session ended");
        Some(Event::SessionEnded {
            summary,
            persisted,
            at: self.at(),
        })
    }

    /// Clear the one-shot completion flag after the UI acknowledged it.
    pub fn acknowledge_completion(&mut self) {
        self.state.session_completed = false;
    }

    /// Run every due cadence. Call this at frame rate.
    pub fn poll(&mut self) -> Vec<Event> {
        let now = self.tick_now();
        let mut events = Vec::new();

        if self.cadences.phase_clock.is_due(now) {
            if self.state.is_running() {
                events.extend(self.tick());
                self.cadences.phase_clock.arm(now);
            } else {
                self.cadences.phase_clock.disarm();
            }
        }

        if self.cadences.hold_sampler.is_due(now) {
            if self.state.is_holding() {
                self.sample_hold();
                self.cadences.hold_sampler.arm(now);
            } else {
                self.cadences.hold_sampler.disarm();
            }
        }

        if self.cadences.elapsed_ticker.is_due(now) {
            if self.state.is_running() {
                self.refresh_elapsed(self.clock.wall_ms());
                self.cadences.elapsed_ticker.arm(now);
            } else {
                self.cadences.elapsed_ticker.disarm();
            }
        }

        events
    }

    /// Apply every whole second crossed since the last boundary.
    ///
    /// Phase advance and countdown reload happen together, so no caller
    /// ever sees an advanced phase with a stale countdown.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.state.is_running() {
            return Vec::new();
        }
        let now = self.tick_now();
        let mut events = Vec::new();
        while now.saturating_sub(self.state.phase_ref_ms) >= SECOND_MS {
            self.state.phase_ref_ms += SECOND_MS;
            if self.state.countdown - 1.0 > 0.0 {
                self.state.countdown -= 1.0;
                continue;
            }
            let next = (self.state.current_phase + 1) % self.pattern.len();
            if next == 0 {
                self.state.current_cycle += 1;
                events.push(Event::CycleCompleted {
                    cycle: self.state.current_cycle,
                    breath_count: self.state.current_cycle * self.pattern.len() as u64,
                    at: self.at(),
                });
            }
            self.state.current_phase = next;
            self.state.countdown = self.phase_secs(next);
            events.push(Event::PhaseAdvanced {
                phase: next,
                cycle: self.state.current_cycle,
                countdown: self.state.countdown,
                at: self.at(),
            });
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Phase-clock time: monotonic when available, wall otherwise.
    fn tick_now(&self) -> u64 {
        self.clock
            .monotonic_ms()
            .unwrap_or_else(|| self.clock.wall_ms())
    }

    fn at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.clock.wall_ms() as i64).unwrap_or_default()
    }

    fn phase_secs(&self, phase: usize) -> f64 {
        self.pattern.duration(phase).unwrap_or(0.0)
    }

    fn refresh_elapsed(&mut self, wall: u64) {
        if let Some(start) = self.state.started_at_ms {
            self.state.elapsed_secs = wall.saturating_sub(start) / SECOND_MS;
        }
    }

    fn sample_hold(&mut self) {
        if let Some(since) = self.state.hold_started_at_ms {
            self.state.hold_stats.current_hold_time =
                round_secs(self.clock.wall_ms().saturating_sub(since));
        }
    }

    /// Shift the start forward by the open pause so it is not counted.
    fn credit_pause(&mut self, wall: u64) {
        if let (Some(paused_at), Some(start)) =
            (self.state.paused_at_ms.take(), self.state.started_at_ms)
        {
            self.state.started_at_ms = Some(start + wall.saturating_sub(paused_at));
        }
    }

    /// Fold the open hold into the stats. Returns its rounded duration.
    fn close_hold(&mut self, wall: u64) -> u64 {
        let since = self.state.hold_started_at_ms.take().unwrap_or(wall);
        let duration = round_secs(wall.saturating_sub(since));
        self.state.hold_stats.record(duration);
        self.cadences.hold_sampler.disarm();
        duration
    }

    /// Running at `phase` with a full countdown and a fresh phase reference.
    fn enter_running_at(&mut self, phase: usize) {
        let tick = self.tick_now();
        self.state.activity = Activity::Running;
        self.state.current_phase = phase;
        self.state.countdown = self.phase_secs(phase);
        self.state.phase_ref_ms = tick;
        self.cadences.phase_clock.arm(tick);
        self.cadences.elapsed_ticker.arm(tick);
    }
}

impl std::fmt::Debug for BreathingSessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreathingSessionEngine")
            .field("pattern", &self.pattern)
            .field("state", &self.state)
            .field("cadences", &self.cadences)
            .finish_non_exhaustive()
    }
}

fn round_secs(ms: u64) -> u64 {
    (ms + SECOND_MS / 2) / SECOND_MS
}
