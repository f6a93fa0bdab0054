//! Where finished sessions go.
//!
//! The engine hands a [`SessionSummary`] to a [`SessionSink`] on `end()`.
//! Sink failures are logged by the engine and never undo the local state
//! transition.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::error::{CoreError, Result};

/// Final record of one session, shaped like the `POST /api/sessions` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Pattern key, e.g. `"4-7-8"`.
    pub pattern: String,
    /// Whole seconds, net of ordinary pauses.
    pub duration: u64,
    pub breath_count: u64,
    pub hold_count: u64,
    pub total_hold_time: u64,
    pub longest_hold: u64,
}

pub trait SessionSink: Send {
    fn save(&mut self, summary: &SessionSummary) -> Result<()>;
}

/// Discards every summary.
#[derive(Debug, Default)]
pub struct NullSink;

impl SessionSink for NullSink {
    fn save(&mut self, _summary: &SessionSummary) -> Result<()> {
        Ok(())
    }
}

/// Writes to every inner sink, even after one fails.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn SessionSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn SessionSink>>) -> Self {
        Self { sinks }
    }

}

impl SessionSink for FanoutSink {
    /// Returns the first error after all sinks have been tried.
    fn save(&mut self, summary: &SessionSummary) -> Result<()> {
        let mut first_err: Option<CoreError> = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.save(summary) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Outcome of the uploads a [`PendingUploads`] waited for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
    pub failed: usize,
}

/// Uploads still in flight. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct PendingUploads(Arc<Mutex<Vec<JoinHandle<bool>>>>);

impl PendingUploads {
    fn push(&self, handle: JoinHandle<bool>) {
        let mut pending = self.0.lock().unwrap_or_else(|p| p.into_inner());
        pending.push(handle);
    }

    /// Wait for every queued upload, including ones already finished.
    pub async fn wait(&self) -> UploadReport {
        let handles: Vec<_> = {
            let mut pending = self.0.lock().unwrap_or_else(|p| p.into_inner());
            pending.drain(..).collect()
        };
        let mut report = UploadReport::default();
        for handle in handles {
            if matches!(handle.await, Ok(true)) {
                report.uploaded += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }
}

/// Posts summaries to the remote API without blocking the caller.
///
/// The request runs on the given runtime, so `save` only reports that the
/// upload was queued. Its outcome is logged and counted by
/// [`PendingUploads::wait`].
pub struct RemoteSink {
    client: ApiClient,
    handle: Handle,
    pending: PendingUploads,
}

impl RemoteSink {
    pub fn new(client: ApiClient, handle: Handle) -> (Self, PendingUploads) {
        let pending = PendingUploads::default();
        let sink = Self {
            client,
            handle,
            pending: pending.clone(),
        };
        (sink, pending)
    }
}

impl SessionSink for RemoteSink {
    fn save(&mut self, summary: &SessionSummary) -> Result<()> {
        let client = self.client.clone();
        let summary = summary.clone();
        let task = self.handle.spawn(async move {
            match client.create_session(&summary).await {
                Ok(record) => {
                    tracing::debug!(id = record.id, "session uploaded");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, pattern = %summary.pattern, "session upload failed");
                    false
                }
            }
        });
        self.pending.push(task);
        Ok(())
    }
}
