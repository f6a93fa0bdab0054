//! Time sources for the session engine.
//!
//! Wall time drives elapsed and hold accounting; monotonic time drives the
//! phase clock so it survives system clock adjustments. A clock without a
//! monotonic source makes the engine fall back to wall time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn wall_ms(&self) -> u64;

    /// Milliseconds on a monotonic timeline, if one is available.
    fn monotonic_ms(&self) -> Option<u64> {
        None
    }
}

/// Real clock backed by `SystemTime` and an `Instant` anchor.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn wall_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn monotonic_ms(&self) -> Option<u64> {
        Some(self.anchor.elapsed().as_millis() as u64)
    }
}

/// Virtual clock advanced by hand. Clones share the same timeline.
///
/// Wall and monotonic time move together on `advance`; `set_wall_ms`
/// moves only the wall clock, simulating a system clock adjustment.
#[derive(Debug, Clone)]
pub struct ManualClock {
    wall: Arc<AtomicU64>,
    mono: Arc<AtomicU64>,
    monotonic: bool,
}

impl ManualClock {
    pub fn new(wall_ms: u64) -> Self {
        Self {
            wall: Arc::new(AtomicU64::new(wall_ms)),
            mono: Arc::new(AtomicU64::new(0)),
            monotonic: true,
        }
    }

    /// A clock that reports no monotonic source.
    pub fn wall_only(wall_ms: u64) -> Self {
        Self {
            monotonic: false,
            ..Self::new(wall_ms)
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = by.as_millis() as u64;
        self.wall.fetch_add(ms, Ordering::SeqCst);
        self.mono.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn set_wall_ms(&self, wall_ms: u64) {
        self.wall.store(wall_ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for ManualClock {
    fn wall_ms(&self) -> u64 {
        self.wall.load(Ordering::SeqCst)
    }

    fn monotonic_ms(&self) -> Option<u64> {
        self.monotonic.then(|| self.mono.load(Ordering::SeqCst))
    }
}
