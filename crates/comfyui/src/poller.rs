//! Fixed-interval status polling for queued jobs.
//!
//! [`poll_job`] sleeps one interval, asks the [`StatusSource`] for the
//! job's status, and repeats until the status is terminal, the attempt
//! ceiling of the [`PollPolicy`] is reached, or the
//! [`CancellationToken`] fires. Requests are strictly sequential: the
//! next sleep only starts after the previous response has arrived.

use async_trait::async_trait;
use fanhub_core::job::{Artifacts, Job, JobStatus, PollResult};
use fanhub_core::polling::{AttemptCounter, PollDecision, PollPolicy};
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;

/// Anything that can report the status of a job.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, ApiError>;
}

/// Terminal result of a polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job finished with these artifacts.
    Completed(Artifacts),
    /// The backend reported the job as failed.
    Failed(String),
    /// The attempt ceiling was reached while the job was still pending.
    TimedOut { attempts: u32 },
}

/// Reasons a polling run ends without a backend verdict.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// A status request failed; polling is abandoned.
    #[error("Status request failed: {0}")]
    Api(#[from] ApiError),

    /// The caller cancelled before a terminal status arrived.
    #[error("Polling cancelled")]
    Cancelled,
}

/// Poll `job` until it reaches a terminal state.
///
/// `on_pending` is called after every pending response with the number
/// of attempts used so far, which is how callers drive progress
/// indicators.
pub async fn poll_job<S, F>(
    source: &S,
    job: &Job,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut on_pending: F,
) -> Result<PollOutcome, PollError>
where
    S: StatusSource + ?Sized,
    F: FnMut(u32),
{
    let mut counter = AttemptCounter::new(policy);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(job_id = %job.id, kind = %job.kind, "Polling cancelled");
                return Err(PollError::Cancelled);
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }

        let status = match source.fetch_status(&job.id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    attempt = counter.attempts() + 1,
                    error = %e,
                    "Status request failed, abandoning poll",
                );
                return Err(PollError::Api(e));
            }
        };

        match status.interpret(job.kind) {
            PollResult::Done(artifacts) => {
                tracing::info!(
                    job_id = %job.id,
                    kind = %job.kind,
                    attempts = counter.attempts() + 1,
                    "Job completed",
                );
                return Ok(PollOutcome::Completed(artifacts));
            }
            PollResult::Error(message) => {
                tracing::warn!(job_id = %job.id, error = %message, "Job failed");
                return Ok(PollOutcome::Failed(message));
            }
            PollResult::Pending => match counter.record_pending() {
                PollDecision::Continue => {
                    tracing::debug!(
                        job_id = %job.id,
                        attempt = counter.attempts(),
                        max_attempts = counter.max_attempts(),
                        "Job still pending",
                    );
                    on_pending(counter.attempts());
                }
                PollDecision::GiveUp => {
                    tracing::warn!(
                        job_id = %job.id,
                        attempts = counter.attempts(),
                        "Job timed out",
                    );
                    return Ok(PollOutcome::TimedOut {
                        attempts: counter.attempts(),
                    });
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use fanhub_core::job::JobKind;

    use super::*;

    /// Replays a fixed list of statuses, then reports pending forever.
    struct Scripted {
        script: Mutex<VecDeque<Result<JobStatus, ApiError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(script: Vec<Result<JobStatus, ApiError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        async fn fetch_status(&self, _job_id: &str) -> Result<JobStatus, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(pending()))
        }
    }

    fn pending() -> JobStatus {
        JobStatus {
            status: "pending".into(),
            ..Default::default()
        }
    }

    fn done_images(urls: &[&str]) -> JobStatus {
        JobStatus {
            status: "done".into(),
            images: Some(urls.iter().map(|u| u.to_string()).collect()),
            ..Default::default()
        }
    }

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn two_pendings_then_done_makes_three_polls() {
        let source = Scripted::new(vec![
            Ok(pending()),
            Ok(pending()),
            Ok(done_images(&["/out/1.png"])),
        ]);
        let job = Job::new("p-1", JobKind::Image);

        let outcome = poll_job(&source, &job, &fast(60), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Completed(Artifacts::Images(vec!["/out/1.png".into()]))
        );
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn error_status_stops_immediately() {
        let source = Scripted::new(vec![
            Ok(pending()),
            Ok(JobStatus {
                status: "error".into(),
                error: Some("node 12 crashed".into()),
                ..Default::default()
            }),
            Ok(done_images(&["/never.png"])),
        ]);
        let job = Job::new("p-2", JobKind::Image);

        let outcome = poll_job(&source, &job, &fast(60), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Failed("node 12 crashed".into()));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn ceiling_is_enforced() {
        let source = Scripted::new(Vec::new());
        let job = Job::new("p-3", JobKind::Video);
        let mut seen = Vec::new();

        let outcome = poll_job(&source, &job, &fast(5), &CancellationToken::new(), |n| {
            seen.push(n)
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 5 });
        assert_eq!(source.calls(), 5);
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn image_policy_times_out_after_sixty_polls() {
        let source = Scripted::new(Vec::new());
        let job = Job::new("p-4", JobKind::Image);

        let outcome = poll_job(&source, &job, &PollPolicy::IMAGE, &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 60 });
        assert_eq!(source.calls(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn video_policy_times_out_after_two_hundred_polls() {
        let source = Scripted::new(Vec::new());
        let job = Job::new("p-5", JobKind::Video);

        let outcome = poll_job(&source, &job, &PollPolicy::VIDEO, &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 200 });
        assert_eq!(source.calls(), 200);
    }

    #[tokio::test]
    async fn transport_error_aborts() {
        let source = Scripted::new(vec![
            Ok(pending()),
            Err(ApiError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
        ]);
        let job = Job::new("p-6", JobKind::Image);

        let result = poll_job(&source, &job, &fast(60), &CancellationToken::new(), |_| {}).await;

        assert_matches!(result, Err(PollError::Api(ApiError::Status { status: 503, .. })));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn cancelled_token_prevents_any_poll() {
        let source = Scripted::new(vec![Ok(done_images(&["/x.png"]))]);
        let job = Job::new("p-7", JobKind::Image);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = poll_job(&source, &job, &fast(60), &cancel, |_| {}).await;

        assert_matches!(result, Err(PollError::Cancelled));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn cancelling_mid_run_stops_before_next_poll() {
        let source = Scripted::new(Vec::new());
        let job = Job::new("p-8", JobKind::Video);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let result = poll_job(&source, &job, &fast(200), &cancel, |attempts| {
            if attempts == 3 {
                trigger.cancel();
            }
        })
        .await;

        assert_matches!(result, Err(PollError::Cancelled));
        assert_eq!(source.calls(), 3);
    }
}
