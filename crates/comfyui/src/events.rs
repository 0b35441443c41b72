//! Progress events emitted by the generation flows.
//!
//! Flows publish on a [`tokio::sync::broadcast`] channel; a send with
//! no subscribers is not an error, so nobody has to listen.

use fanhub_core::job::JobKind;
use fanhub_core::types::JobId;
use serde::Serialize;
use tokio::sync::broadcast;

/// Broadcast channel capacity for generation events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A state change in a generation flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GenerationEvent {
    /// The backend accepted a job.
    Submitted { job_id: JobId, kind: JobKind },

    /// Overall flow progress (0-100). Only the lipsync flow reports this.
    Progress { percent: u8 },

    /// A job finished and its artifacts were added to the gallery.
    Completed {
        job_id: JobId,
        kind: JobKind,
        /// Number of artifacts produced.
        count: usize,
    },

    /// A job ended in failure.
    Failed {
        job_id: Option<JobId>,
        kind: JobKind,
        error: String,
    },

    /// A job was still pending when the attempt ceiling was reached.
    TimedOut { job_id: JobId, attempts: u32 },

    /// The post-generation GPU memory release finished.
    MemoryFreed { ok: bool },
}

/// Create a sender for generation events.
pub fn channel() -> broadcast::Sender<GenerationEvent> {
    let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}

/// Publish an event, ignoring the absence of subscribers.
pub(crate) fn emit(tx: &broadcast::Sender<GenerationEvent>, event: GenerationEvent) {
    let _ = tx.send(event);
}
