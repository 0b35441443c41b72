//! Image generation flow.
//!
//! Validate -> `POST /api/comfyui/generate` -> poll every 5 s (up to 60
//! times) -> prepend the new images to the gallery -> release GPU
//! memory in the background.

use std::sync::Arc;

use fanhub_core::gallery::Gallery;
use fanhub_core::job::{Artifacts, Job, JobKind};
use fanhub_core::polling::PollPolicy;
use fanhub_core::request::ImageRequest;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::api::StudioApi;
use crate::error::GenerationError;
use crate::events::{self, GenerationEvent};
use crate::messages::GenerateImagesBody;
use crate::poller::{poll_job, PollOutcome};

/// Runs image jobs against one backend.
pub struct ImageGenerator {
    api: Arc<StudioApi>,
    policy: PollPolicy,
    event_tx: broadcast::Sender<GenerationEvent>,
    cancel: CancellationToken,
}

impl ImageGenerator {
    pub fn new(api: Arc<StudioApi>) -> Self {
        Self {
            api,
            policy: PollPolicy::IMAGE,
            event_tx: events::channel(),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the poll interval and ceiling.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
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

    /// Queue an image job without waiting for it.
    pub async fn submit(&self, request: &ImageRequest) -> Result<Job, GenerationError> {
        let lora_path = request.check()?;

        let body = GenerateImagesBody {
            character_slug: request.character_slug.clone(),
            prompt: request.full_prompt(),
            negative_prompt: request.negative_prompt.clone(),
            num_images: request.num_images,
            lora_path: lora_path.to_string(),
        };

        let job_id = self.api.generate_images(&body).await.map_err(|e| {
            tracing::error!(
                character = %request.character_slug,
                error = %e,
                "Image submission failed",
            );
            events::emit(
                &self.event_tx,
                GenerationEvent::Failed {
                    job_id: None,
                    kind: JobKind::Image,
                    error: e.to_string(),
                },
            );
            GenerationError::Submission(e)
        })?;

        tracing::info!(
            character = %request.character_slug,
            job_id = %job_id,
            num_images = request.num_images,
            "Image job submitted",
        );
        events::emit(
            &self.event_tx,
            GenerationEvent::Submitted {
                job_id: job_id.clone(),
                kind: JobKind::Image,
            },
        );

        Ok(Job::new(job_id, JobKind::Image))
    }

    /// Generate images and put them at the front of `gallery`.
    ///
    /// Returns the URLs from this job only. The gallery is untouched
    /// unless the job completes.
    pub async fn generate(
        &self,
        request: &ImageRequest,
        gallery: &mut Gallery<String>,
    ) -> Result<Vec<String>, GenerationError> {
        let job = self.submit(request).await?;
        let images = self.wait(&job).await?;

        gallery.prepend_batch(images.iter().cloned());
        events::emit(
            &self.event_tx,
            GenerationEvent::Completed {
                job_id: job.id.clone(),
                kind: JobKind::Image,
                count: images.len(),
            },
        );

        self.spawn_free_memory();
        Ok(images)
    }

    /// Poll a submitted job until it finishes.
    async fn wait(&self, job: &Job) -> Result<Vec<String>, GenerationError> {
        let outcome = poll_job(self.api.as_ref(), job, &self.policy, &self.cancel, |_| {}).await;

        match outcome {
            Ok(PollOutcome::Completed(Artifacts::Images(images))) => Ok(images),
            Ok(PollOutcome::Completed(Artifacts::Video(_))) => {
                Err(GenerationError::UnexpectedArtifacts("video"))
            }
            Ok(PollOutcome::Failed(message)) => {
                self.emit_failed(job, &message);
                Err(GenerationError::Failed(message))
            }
            Ok(PollOutcome::TimedOut { attempts }) => {
                events::emit(
                    &self.event_tx,
                    GenerationEvent::TimedOut {
                        job_id: job.id.clone(),
                        attempts,
                    },
                );
                Err(GenerationError::TimedOut { attempts })
            }
            Err(e) => {
                self.emit_failed(job, &e.to_string());
                Err(e.into())
            }
        }
    }

    fn emit_failed(&self, job: &Job, error: &str) {
        events::emit(
            &self.event_tx,
            GenerationEvent::Failed {
                job_id: Some(job.id.clone()),
                kind: job.kind,
                error: error.to_string(),
            },
        );
    }

    /// Release GPU memory without holding up the caller.
    ///
    /// Failures are logged and otherwise ignored.
    fn spawn_free_memory(&self) {
        let api = Arc::clone(&self.api);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            tracing::info!("Clearing GPU memory after image generation");
            let ok = match api.free_memory().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Memory clear failed (non-critical)");
                    false
                }
            };
            events::emit(&event_tx, GenerationEvent::MemoryFreed { ok });
        });
    }
}
