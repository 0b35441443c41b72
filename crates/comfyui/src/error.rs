use fanhub_core::error::CoreError;

use crate::api::ApiError;
use crate::poller::PollError;

/// Why a generation flow did not produce artifacts.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The request was rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// A request before polling (speech, submission) failed.
    #[error("Failed to start generation: {0}")]
    Submission(#[from] ApiError),

    /// Polling ended without a backend verdict.
    #[error(transparent)]
    Poll(#[from] PollError),

    /// The backend reported the job as failed.
    #[error("Generation failed: {0}")]
    Failed(String),

    /// The job was still pending after the last allowed poll.
    #[error("Generation timed out after {attempts} polls")]
    TimedOut { attempts: u32 },

    /// The backend finished the job with a different artifact type.
    #[error("Backend returned {0} artifacts for this job")]
    UnexpectedArtifacts(&'static str),
}
