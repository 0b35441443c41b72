//! Command-line interface for the `fanhub` binary.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fanhub_comfyui::api::content_type_for_extension;
use fanhub_core::job::JobKind;
use fanhub_core::prompt::HookType;
use fanhub_core::request::Resolution;

use crate::config::StudioConfig;

/// Command-line arguments for fanhub
#[derive(Parser, Debug)]
#[command(name = "fanhub")]
#[command(about = "Generate character images and lipsync videos on a fanhub studio backend")]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides FANHUB_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// HTTP request timeout in seconds (overrides FANHUB_REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// JSON file holding the image and video galleries that new results are prepended to
    #[arg(long, global = true)]
    pub gallery: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate images for a character
    Image(ImageArgs),
    /// Generate a lipsync video from text
    Lipsync(LipsyncArgs),
    /// List preset voices
    Voices,
    /// Upload a voice sample and transcribe it
    UploadVoice {
        /// Audio file to upload
        file: PathBuf,
    },
    /// Save media to the character library
    Save(MediaArgs),
    /// Post media to the character feed
    Post {
        #[command(flatten)]
        media: MediaArgs,

        /// Post caption
        #[arg(long)]
        caption: Option<String>,
    },
    /// Schedule an image for TikTok
    Schedule(ScheduleArgs),
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// What to generate
    pub prompt: String,

    /// Character slug (overrides FANHUB_CHARACTER_SLUG)
    #[arg(long)]
    pub character: Option<String>,

    /// LoRA path (overrides FANHUB_LORA_PATH)
    #[arg(long)]
    pub lora: Option<String>,

    /// Appearance description prepended to the prompt
    #[arg(long)]
    pub appearance: Option<String>,

    /// Negative prompt
    #[arg(long)]
    pub negative: Option<String>,

    /// Number of images (1-10)
    #[arg(short = 'n', long, default_value_t = 1)]
    pub num_images: u32,

    /// Augment the prompt for TikTok with this hook type
    #[arg(long)]
    pub hook: Option<HookType>,

    /// Face share of the frame for TikTok prompts (35-50, steps of 5)
    #[arg(long, requires = "hook")]
    pub face_prominence: Option<u8>,
}

#[derive(Args, Debug)]
pub struct LipsyncArgs {
    /// What the character says
    pub text: String,

    /// Avatar image the video is animated from
    #[arg(long)]
    pub reference_image: String,

    /// Character slug (overrides FANHUB_CHARACTER_SLUG)
    #[arg(long)]
    pub character: Option<String>,

    /// Display name sent to the speech synthesiser (defaults to the slug)
    #[arg(long)]
    pub name: Option<String>,

    /// Output resolution: 256, 512 or 768
    #[arg(long, default_value = "512")]
    pub resolution: Resolution,

    /// Preset voice name
    #[arg(long, conflicts_with = "voice_sample")]
    pub voice: Option<String>,

    /// Local audio sample to upload and clone
    #[arg(long)]
    pub voice_sample: Option<PathBuf>,

    /// Refuse to use the backend's default voice
    #[arg(long, env = "FANHUB_REQUIRE_VOICE", value_parser = BoolishValueParser::new())]
    pub require_voice: bool,
}

#[derive(Args, Debug)]
pub struct MediaArgs {
    /// Media URL as returned by a generation
    pub url: String,

    /// Character slug (overrides FANHUB_CHARACTER_SLUG)
    #[arg(long)]
    pub character: Option<String>,

    /// Media kind; guessed from the URL when omitted
    #[arg(long, value_enum)]
    pub kind: Option<MediaKind>,
}

impl MediaArgs {
    pub fn kind(&self) -> JobKind {
        self.kind
            .map(JobKind::from)
            .unwrap_or_else(|| infer_kind(&self.url))
    }
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Image URL to schedule
    pub image_url: String,

    /// Character slug (overrides FANHUB_CHARACTER_SLUG)
    #[arg(long)]
    pub character: Option<String>,

    /// Post caption
    #[arg(long)]
    pub caption: Option<String>,

    /// When to post, as YYYY-MM-DDTHH:MM (default: an hour from now)
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKind {
    Image,
    Video,
}

impl From<MediaKind> for JobKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => JobKind::Image,
            MediaKind::Video => JobKind::Video,
        }
    }
}

/// Video when the URL carries a video extension, image otherwise.
pub fn infer_kind(url: &str) -> JobKind {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if content_type_for_extension(path).starts_with("video/") {
        JobKind::Video
    } else {
        JobKind::Image
    }
}

impl Cli {
    /// Apply global flag overrides on top of the environment configuration.
    pub fn apply_overrides(&self, mut config: StudioConfig) -> StudioConfig {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
