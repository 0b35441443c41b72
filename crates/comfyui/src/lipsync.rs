//! Lipsync video generation flow.
//!
//! Validate -> synthesize speech (VoxCPM) -> `POST /api/comfyui/animate`
//! -> poll every 3 s (up to 200 times) -> prepend the video to the
//! gallery. Progress is reported on the event channel as the flow moves
//! through its stages.

use std::sync::Arc;

use fanhub_core::gallery::Gallery;
use fanhub_core::job::{Artifacts, Job, JobKind, VideoArtifact};
use fanhub_core::polling::{
    video_poll_progress, PollPolicy, PROGRESS_DONE, PROGRESS_VIDEO_QUEUED,
};
use fanhub_core::request::LipsyncRequest;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::api::StudioApi;
use crate::error::GenerationError;
use crate::events::{self, GenerationEvent};
use crate::messages::{AnimateBody, SpeechBody};
use crate::poller::{poll_job, PollOutcome};

/// Progress when the flow starts.
pub const PROGRESS_STARTED: u8 = 10;
/// Progress just before speech synthesis.
pub const PROGRESS_SPEECH: u8 = 20;
/// Progress once the audio is ready.
pub const PROGRESS_AUDIO_READY: u8 = 50;

/// Runs lipsync jobs against one backend.
pub struct LipsyncGenerator {
    api: Arc<StudioApi>,
    policy: PollPolicy,
    require_voice: bool,
    event_tx: broadcast::Sender<GenerationEvent>,
    cancel: CancellationToken,
}

impl LipsyncGenerator {
    pub fn new(api: Arc<StudioApi>) -> Self {
        Self {
            api,
            policy: PollPolicy::VIDEO,
            require_voice: false,
            event_tx: events::channel(),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the poll interval and ceiling.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Refuse to fall back to the backend's default voice.
    pub fn require_voice(mut self, require: bool) -> Self {
        self.require_voice = require;
        self
    }

    /// Stop polling when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GenerationEvent> {
        self.event_tx.subscribe()
    }

    /// Generate a lipsync video and put it at the front of `gallery`.
    pub async fn generate(
        &self,
        request: &LipsyncRequest,
        gallery: &mut Gallery<VideoArtifact>,
    ) -> Result<VideoArtifact, GenerationError> {
        let reference_image = request.check(self.require_voice)?;

        self.progress(PROGRESS_STARTED);
        let result = self.run(request, reference_image).await;

        match result {
            Ok((job, artifact)) => {
                gallery.prepend(artifact.clone());
                self.progress(PROGRESS_DONE);
                events::emit(
                    &self.event_tx,
                    GenerationEvent::Completed {
                        job_id: job.id,
                        kind: JobKind::Video,
                        count: 1,
                    },
                );
                Ok(artifact)
            }
            Err((job_id, e)) => {
                tracing::error!(
                    character = %request.character_slug,
                    error = %e,
                    "Lipsync generation error",
                );
                events::emit(
                    &self.event_tx,
                    GenerationEvent::Failed {
                        job_id,
                        kind: JobKind::Video,
                        error: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    /// Speech, animation and polling. Errors carry the job id once known.
    async fn run(
        &self,
        request: &LipsyncRequest,
        reference_image: &str,
    ) -> Result<(Job, VideoArtifact), (Option<String>, GenerationError)> {
        self.progress(PROGRESS_SPEECH);
        let speech = SpeechBody {
            text: request.text.clone(),
            character_name: request.character_name.clone(),
            voice_path: request.voice.voice_path(),
        };
        let audio_url = self
            .api
            .generate_speech(&speech)
            .await
            .map_err(|e| (None, GenerationError::Submission(e)))?;
        tracing::info!(audio_url = %audio_url, "Speech synthesized");
        self.progress(PROGRESS_AUDIO_READY);

        let animate = AnimateBody {
            character_slug: request.character_slug.clone(),
            reference_image: reference_image.to_string(),
            audio_url,
            resolution: request.resolution,
        };
        let job_id = self
            .api
            .animate(&animate)
            .await
            .map_err(|e| (None, GenerationError::Submission(e)))?;
        let job = Job::new(job_id, JobKind::Video);

        tracing::info!(
            character = %request.character_slug,
            job_id = %job.id,
            resolution = request.resolution.as_str(),
            "Lipsync job submitted",
        );
        events::emit(
            &self.event_tx,
            GenerationEvent::Submitted {
                job_id: job.id.clone(),
                kind: JobKind::Video,
            },
        );
        self.progress(PROGRESS_VIDEO_QUEUED);

        let max_attempts = self.policy.max_attempts;
        let outcome = poll_job(self.api.as_ref(), &job, &self.policy, &self.cancel, |attempts| {
            self.progress(video_poll_progress(attempts, max_attempts));
        })
        .await;

        let job_id = job.id.clone();
        let failed = |e: GenerationError| (Some(job_id.clone()), e);
        match outcome {
            Ok(PollOutcome::Completed(Artifacts::Video(url))) => {
                let artifact = VideoArtifact {
                    url,
                    text: request.text.clone(),
                };
                Ok((job, artifact))
            }
            Ok(PollOutcome::Completed(Artifacts::Images(_))) => {
                Err(failed(GenerationError::UnexpectedArtifacts("image")))
            }
            Ok(PollOutcome::Failed(message)) => Err(failed(GenerationError::Failed(message))),
            Ok(PollOutcome::TimedOut { attempts }) => {
                events::emit(
                    &self.event_tx,
                    GenerationEvent::TimedOut {
                        job_id: job_id.clone(),
                        attempts,
                    },
                );
                Err(failed(GenerationError::TimedOut { attempts }))
            }
            Err(e) => Err(failed(e.into())),
        }
    }

    fn progress(&self, percent: u8) {
        events::emit(&self.event_tx, GenerationEvent::Progress { percent });
    }
}
