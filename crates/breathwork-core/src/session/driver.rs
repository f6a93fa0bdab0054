//! Real-time scheduler for the session engine.
//!
//! A tokio task polls the engine once per frame and forwards whatever it
//! emits. Commands go through [`SessionDriver::dispatch`] so their events
//! land on the same channel, in order. Dropping the driver stops the task.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::engine::BreathingSessionEngine;
use crate::events::Event;

pub struct SessionDriver {
    engine: Arc<Mutex<BreathingSessionEngine>>,
    events: mpsc::UnboundedSender<Event>,
    task: JoinHandle<()>,
}

impl SessionDriver {
    /// Spawn the frame loop on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn(
        engine: BreathingSessionEngine,
        frame: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let engine = Arc::new(Mutex::new(engine));
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(frame_loop(engine.clone(), tx.clone(), frame));
        let driver = Self {
            engine,
            events: tx,
            task,
        };
        (driver, rx)
    }

    /// Run a command against the engine, forwarding its event.
    pub fn dispatch<F>(&self, command: F) -> Option<Event>
    where
        F: FnOnce(&mut BreathingSessionEngine) -> Option<Event>,
    {
        let event = command(&mut lock(&self.engine))?;
        let _ = self.events.send(event.clone());
        Some(event)
    }

    /// Read engine state without emitting anything.
    pub fn inspect<R>(&self, f: impl FnOnce(&BreathingSessionEngine) -> R) -> R {
        f(&lock(&self.engine))
    }

    pub fn engine(&self) -> Arc<Mutex<BreathingSessionEngine>> {
        self.engine.clone()
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn frame_loop(
    engine: Arc<Mutex<BreathingSessionEngine>>,
    tx: mpsc::UnboundedSender<Event>,
    frame: Duration,
) {
    let frame = frame.max(Duration::from_millis(1));
    loop {
        // Wake for the next due cadence, at most one frame away.
        let wait = lock(&engine)
            .next_deadline_in_ms()
            .map_or(frame, |ms| Duration::from_millis(ms).clamp(Duration::from_millis(1), frame));
        tokio::time::sleep(wait).await;
        let events = lock(&engine).poll();
        for event in events {
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

fn lock(engine: &Mutex<BreathingSessionEngine>) -> MutexGuard<'_, BreathingSessionEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
