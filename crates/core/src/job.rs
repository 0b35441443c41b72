//! Generation jobs, their poll results, and the artifacts they produce.
//!
//! A [`Job`] exists from the moment the backend accepts a submission
//! until a terminal [`PollResult`] is observed for it. Status payloads
//! arrive as loosely-shaped JSON, so [`JobStatus::interpret`] turns
//! them into a kind-aware [`PollResult`].

use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status strings
// ---------------------------------------------------------------------------

/// The backend is still working on the job.
pub const STATUS_PENDING: &str = "pending";
/// The job finished and its outputs are attached.
pub const STATUS_DONE: &str = "done";
/// The job failed; `error` carries the reason.
pub const STATUS_ERROR: &str = "error";

/// Fallback message when an image job fails without a reason.
pub const DEFAULT_IMAGE_ERROR: &str = "Generation failed";
/// Fallback message when a video job fails without a reason.
pub const DEFAULT_VIDEO_ERROR: &str = "Video generation failed";

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// What a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Image,
    Video,
}

impl JobKind {
    /// Error message used when the backend reports `error` with no detail.
    pub fn default_error(self) -> &'static str {
        match self {
            JobKind::Image => DEFAULT_IMAGE_ERROR,
            JobKind::Video => DEFAULT_VIDEO_ERROR,
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Image => f.write_str("image"),
            JobKind::Video => f.write_str("video"),
        }
    }
}

/// A job the backend has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub submitted_at: Timestamp,
}

impl Job {
    pub fn new(id: impl Into<JobId>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
            submitted_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// A finished lipsync video together with the line that was spoken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub url: String,
    pub text: String,
}

/// Output of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Artifacts {
    /// Image URLs, in the order the backend returned them.
    Images(Vec<String>),
    /// URL of the rendered video. The spoken text is attached by the
    /// lipsync flow, which is the only place that knows it.
    Video(String),
}

// ---------------------------------------------------------------------------
// Poll results
// ---------------------------------------------------------------------------

/// Outcome of a single status request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    Pending,
    Done(Artifacts),
    Error(String),
}

impl PollResult {
    /// `Done` and `Error` end polling; `Pending` does not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollResult::Pending)
    }
}

/// Raw body of `GET /api/comfyui/status/{promptId}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub status: String,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    /// Interpret a status payload for a job of the given kind.
    ///
    /// `done` only counts once the artifact for that kind is present:
    /// a non-empty `images` list for image jobs, a `videoUrl` for video
    /// jobs. Anything that is neither complete nor `error` is pending.
    pub fn interpret(self, kind: JobKind) -> PollResult {
        if self.status == STATUS_ERROR {
            let message = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| kind.default_error().to_string());
            return PollResult::Error(message);
        }

        if self.status != STATUS_DONE {
            return PollResult::Pending;
        }

        match kind {
            JobKind::Image => match self.images {
                Some(images) if !images.is_empty() => PollResult::Done(Artifacts::Images(images)),
                _ => PollResult::Pending,
            },
            JobKind::Video => match self.video_url {
                Some(url) if !url.is_empty() => PollResult::Done(Artifacts::Video(url)),
                _ => PollResult::Pending,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
