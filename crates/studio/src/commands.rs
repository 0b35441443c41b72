//! Runs one CLI command against the backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use fanhub_comfyui::actions::{post_to_feed, save_to_library, schedule_tiktok};
use fanhub_comfyui::voice::{list_voices, upload_voice};
use fanhub_comfyui::{ImageGenerator, LipsyncGenerator, StudioApi};
use fanhub_core::polling::PollPolicy;
use fanhub_core::prompt::{tiktok_prompt, DEFAULT_FACE_PROMINENCE};
use fanhub_core::request::{clamp_num_images, ImageRequest, LipsyncRequest, VoiceChoice};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::{Command, ImageArgs, LipsyncArgs, MediaArgs, ScheduleArgs};
use crate::config::StudioConfig;
use crate::progress::spawn_event_log;
use crate::store::{load_galleries, save_galleries, StoredGalleries};

/// Shared state for a single CLI invocation.
pub struct Studio {
    config: StudioConfig,
    api: Arc<StudioApi>,
    gallery_path: Option<PathBuf>,
    cancel: CancellationToken,
    image_policy: PollPolicy,
    video_policy: PollPolicy,
}

impl Studio {
    pub fn new(
        config: StudioConfig,
        gallery_path: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let api = StudioApi::with_timeout(&config.api_url, config.request_timeout())
            .context("Failed to build HTTP client")?;
        Ok(Self {
            config,
            api: Arc::new(api),
            gallery_path,
            cancel,
            image_policy: PollPolicy::IMAGE,
            video_policy: PollPolicy::VIDEO,
        })
    }

    /// Override the poll interval and ceiling of both flows.
    pub fn with_poll_policies(mut self, image: PollPolicy, video: PollPolicy) -> Self {
        self.image_policy = image;
        self.video_policy = video;
        self
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Image(args) => self.image(args).await,
            Command::Lipsync(args) => self.lipsync(args).await,
            Command::Voices => self.voices().await,
            Command::UploadVoice { file } => self.upload_voice(&file).await,
            Command::Save(media) => self.save(media).await,
            Command::Post { media, caption } => self.post(media, caption).await,
            Command::Schedule(args) => self.schedule(args).await,
        }
    }

    async fn image(&self, args: ImageArgs) -> Result<()> {
        let character = self.character(args.character)?;
        let prompt = match args.hook {
            Some(hook) => tiktok_prompt(
                &args.prompt,
                hook,
                args.face_prominence.unwrap_or(DEFAULT_FACE_PROMINENCE),
            )?,
            None => args.prompt,
        };

        let mut request = ImageRequest::new(character, prompt);
        request.lora_path = args.lora.or_else(|| self.config.lora_path.clone());
        request.appearance = args.appearance;
        request.num_images = clamp_num_images(args.num_images);
        if let Some(negative) = args.negative {
            request.negative_prompt = negative;
        }

        let mut galleries = self.load_galleries().await?;
        let generator = ImageGenerator::new(Arc::clone(&self.api))
            .with_policy(self.image_policy)
            .with_cancellation(self.cancel.clone());
        let events = spawn_event_log(generator.subscribe());

        let result = generator.generate(&request, &mut galleries.images).await;
        drop(generator);
        join_event_log(events).await;

        let images = result.context("Image generation failed")?;
        self.save_galleries(&galleries).await?;
        for url in &images {
            println!("{url}");
        }
        Ok(())
    }

    async fn lipsync(&self, args: LipsyncArgs) -> Result<()> {
        let character = self.character(args.character)?;
        let name = args.name.unwrap_or_else(|| character.clone());

        let mut request = LipsyncRequest::new(character, name, args.text);
        request.reference_image = Some(args.reference_image);
        request.resolution = args.resolution;
        let mut galleries = self.load_galleries().await?;
        request.voice = match args.voice_sample {
            Some(path) => {
                // Catch bad input before spending an upload on it.
                request.check(false)?;
                upload_voice(&self.api, &path)
                    .await
                    .context("Failed to upload voice sample")?
                    .choice()
            }
            None => VoiceChoice::from_parts(None, args.voice),
        };

        let generator = LipsyncGenerator::new(Arc::clone(&self.api))
            .with_policy(self.video_policy)
            .require_voice(args.require_voice)
            .with_cancellation(self.cancel.clone());
        let events = spawn_event_log(generator.subscribe());

        let result = generator.generate(&request, &mut galleries.videos).await;
        drop(generator);
        join_event_log(events).await;

        let video = result.context("Lipsync generation failed")?;
        self.save_galleries(&galleries).await?;
        println!("{}", video.url);
        Ok(())
    }

    async fn voices(&self) -> Result<()> {
        let voices = list_voices(&self.api).await;
        if voices.is_empty() {
            println!("No preset voices available; the default voice will be used.");
        }
        for voice in voices {
            if voice.description.is_empty() {
                println!("{}", voice.name);
            } else {
                println!("{}\t{}", voice.name, voice.description);
            }
        }
        Ok(())
    }

    async fn upload_voice(&self, file: &Path) -> Result<()> {
        let uploaded = upload_voice(&self.api, file)
            .await
            .context("Failed to upload voice sample")?;
        println!("{}", uploaded.path);
        match uploaded.transcript {
            Some(transcript) => println!("Transcript: {transcript}"),
            None => println!("Transcript unavailable"),
        }
        Ok(())
    }

    async fn save(&self, media: MediaArgs) -> Result<()> {
        let character = self.character(media.character.clone())?;
        let kind = media.kind();
        save_to_library(&self.api, &character, kind, &media.url)
            .await
            .context("Failed to save")?;
        println!("Saved {kind} to {character}'s library");
        Ok(())
    }

    async fn post(&self, media: MediaArgs, caption: Option<String>) -> Result<()> {
        let character = self.character(media.character.clone())?;
        let caption = post_to_feed(
            &self.api,
            &character,
            media.kind(),
            &media.url,
            caption.as_deref(),
        )
        .await
        .context("Failed to post")?;
        println!("Posted to {character}'s feed: {caption}");
        Ok(())
    }

    async fn schedule(&self, args: ScheduleArgs) -> Result<()> {
        let character = self.character(args.character)?;
        let when = schedule_tiktok(
            &self.api,
            &character,
            &args.image_url,
            args.caption.as_deref(),
            args.at.as_deref(),
        )
        .await
        .context("Failed to schedule")?;
        println!("Scheduled for TikTok at {when}");
        Ok(())
    }

    /// Character from the flag, else from the environment.
    fn character(&self, flag: Option<String>) -> Result<String> {
        resolve_character(flag, &self.config)
    }

    async fn load_galleries(&self) -> Result<StoredGalleries> {
        match &self.gallery_path {
            Some(path) => load_galleries(path)
                .await
                .with_context(|| format!("Failed to load gallery {}", path.display())),
            None => Ok(StoredGalleries::default()),
        }
    }

    async fn save_galleries(&self, galleries: &StoredGalleries) -> Result<()> {
        if let Some(path) = &self.gallery_path {
            save_galleries(path, galleries)
                .await
                .with_context(|| format!("Failed to write gallery {}", path.display()))?;
        }
        Ok(())
    }
}

/// Wait for the event log to drain.
async fn join_event_log(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        tracing::warn!(error = %e, "Event log task failed, some progress may be missing");
    }
}

fn resolve_character(flag: Option<String>, config: &StudioConfig) -> Result<String> {
    flag.filter(|s| !s.trim().is_empty())
        .or_else(|| config.character_slug.clone())
        .context("No character selected. Pass --character or set FANHUB_CHARACTER_SLUG")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
