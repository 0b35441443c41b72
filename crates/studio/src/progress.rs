//! Logs generation events while a command runs.

use fanhub_comfyui::events::GenerationEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Log every event from `receiver` until all senders are dropped.
///
/// The image flow keeps a sender alive in its background free-memory
/// task, so awaiting the handle also waits for that call to finish.
pub fn spawn_event_log(mut receiver: broadcast::Receiver<GenerationEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => log_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log lagged, some progress was not shown");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &GenerationEvent) {
    match event {
        GenerationEvent::Submitted { job_id, kind } => {
            tracing::info!(job_id = %job_id, %kind, "Job queued");
        }
        GenerationEvent::Progress { percent } => {
            tracing::info!(percent, "Progress");
        }
        GenerationEvent::Completed {
            job_id,
            kind,
            count,
        } => {
            tracing::info!(job_id = %job_id, %kind, count, "Job completed");
        }
        GenerationEvent::Failed {
            job_id,
            kind,
            error,
        } => {
            tracing::warn!(job_id = ?job_id, %kind, error = %error, "Job failed");
        }
        GenerationEvent::TimedOut { job_id, attempts } => {
            tracing::warn!(job_id = %job_id, attempts, "Job timed out");
        }
        GenerationEvent::MemoryFreed { ok } => {
            tracing::debug!(ok, "GPU memory release finished");
        }
    }
}
