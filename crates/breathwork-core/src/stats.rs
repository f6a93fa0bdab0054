//! Session statistics: totals, per-day breakdowns and practice streaks.
//!
//! Everything here is a pure function over [`SessionRecord`]s so the same
//! aggregation serves the local database and records fetched remotely.
//! Days are UTC calendar days of `completed_at`.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::SessionRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    pub total_sessions: u64,
    pub total_minutes: u64,
    pub total_breaths: u64,
    pub total_holds: u64,
    pub longest_hold: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub sessions: u64,
    pub total_seconds: u64,
    pub breaths: u64,
    pub holds: u64,
    pub total_hold_time: u64,
    pub longest_hold: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

/// All-time totals plus streaks as of `today`.
pub fn summarize(records: &[SessionRecord], today: NaiveDate) -> SessionStats {
    let total_secs: u64 = records.iter().map(|r| r.duration).sum();
    let dates: Vec<NaiveDate> = records.iter().map(SessionRecord::completed_on).collect();
    let streaks = streaks(&dates, today);
    SessionStats {
        total_sessions: records.len() as u64,
        total_minutes: (total_secs + 30) / 60,
        total_breaths: records.iter().map(|r| r.breath_count).sum(),
        total_holds: records.iter().map(|r| r.hold_count).sum(),
        longest_hold: records.iter().map(|r| r.longest_hold).max().unwrap_or(0),
        current_streak: streaks.current,
        longest_streak: streaks.longest,
    }
}

pub fn daily(records: &[SessionRecord], date: NaiveDate) -> DailyStats {
    let mut day = DailyStats {
        date,
        sessions: 0,
        total_seconds: 0,
        breaths: 0,
        holds: 0,
        total_hold_time: 0,
        longest_hold: 0,
    };
    for r in records.iter().filter(|r| r.completed_on() == date) {
        day.sessions += 1;
        day.total_seconds += r.duration;
        day.breaths += r.breath_count;
        day.holds += r.hold_count;
        day.total_hold_time += r.total_hold_time;
        day.longest_hold = day.longest_hold.max(r.longest_hold);
    }
    day
}

/// Seven days ending at `week_ending`, oldest first.
pub fn weekly(records: &[SessionRecord], week_ending: NaiveDate) -> Vec<DailyStats> {
    (0..7)
        .rev()
        .map(|back| daily(records, week_ending - Duration::days(back)))
        .collect()
}

/// Consecutive-day runs over the given completion dates.
///
/// The current streak is the run ending today, or ending yesterday when
/// nothing has been recorded yet today.
pub fn streaks(dates: &[NaiveDate], today: NaiveDate) -> Streaks {
    let mut days = dates.to_vec();
    days.sort_unstable();
    days.dedup();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for &day in &days {
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let current = match prev {
        Some(last) if last == today || last == today - Duration::days(1) => run,
        _ => 0,
    };
    Streaks { current, longest }
}
