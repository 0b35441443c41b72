//! Generation requests and their pre-flight validation.
//!
//! Validation runs before any network traffic: a request that fails
//! here never reaches the backend.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::prompt::{compose_prompt, DEFAULT_NEGATIVE_PROMPT};

pub const MIN_IMAGES_PER_JOB: u32 = 1;
pub const MAX_IMAGES_PER_JOB: u32 = 10;

/// Directory on the backend that holds preset voices.
pub const PRESET_VOICE_DIR: &str = "voices";

pub const MSG_EMPTY_PROMPT: &str = "Please enter a prompt";
pub const MSG_NO_LORA: &str = "No LoRA configured for this character. Please set it in Settings.";
pub const MSG_EMPTY_TEXT: &str = "Please enter text for the character to say";
pub const MSG_NO_REFERENCE_IMAGE: &str = "Please provide a reference image (avatar)";
pub const MSG_NO_VOICE: &str = "No voice configured. Pick a preset voice or upload a sample.";

// ---------------------------------------------------------------------------
// Image requests
// ---------------------------------------------------------------------------

/// Parameters for an image generation job.
#[derive(Debug, Clone, Validate)]
pub struct ImageRequest {
    #[validate(length(min = 1, message = "Character slug is required"))]
    pub character_slug: String,
    pub prompt: String,
    pub negative_prompt: String,
    #[validate(range(min = 1, max = 10, message = "Number of images must be between 1 and 10"))]
    pub num_images: u32,
    pub lora_path: Option<String>,
    /// Character appearance prepended to the prompt.
    pub appearance: Option<String>,
}

impl ImageRequest {
    pub fn new(character_slug: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            character_slug: character_slug.into(),
            prompt: prompt.into(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            num_images: MIN_IMAGES_PER_JOB,
            lora_path: None,
            appearance: None,
        }
    }

    /// Reject requests the backend would not be able to run.
    ///
    /// Returns the LoRA path so callers do not have to unwrap it again.
    pub fn check(&self) -> Result<&str, CoreError> {
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Validation(MSG_EMPTY_PROMPT.to_string()));
        }
        let lora = self
            .lora_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoreError::Validation(MSG_NO_LORA.to_string()))?;
        self.validate()?;
        Ok(lora)
    }

    /// Prompt as sent to the backend, with appearance applied.
    pub fn full_prompt(&self) -> String {
        compose_prompt(self.appearance.as_deref(), &self.prompt)
    }
}

/// Clamp a user-entered image count into the accepted range.
pub fn clamp_num_images(n: u32) -> u32 {
    n.clamp(MIN_IMAGES_PER_JOB, MAX_IMAGES_PER_JOB)
}

// ---------------------------------------------------------------------------
// Lipsync requests
// ---------------------------------------------------------------------------

/// Output size of the lipsync video, in pixels per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "256")]
    R256,
    #[default]
    #[serde(rename = "512")]
    R512,
    #[serde(rename = "768")]
    R768,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::R256 => "256",
            Resolution::R512 => "512",
            Resolution::R768 => "768",
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "256" => Ok(Resolution::R256),
            "512" => Ok(Resolution::R512),
            "768" => Ok(Resolution::R768),
            other => Err(CoreError::Validation(format!(
                "Invalid resolution '{other}'. Must be one of: 256, 512, 768"
            ))),
        }
    }
}

/// Which voice the speech synthesiser should clone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VoiceChoice {
    /// Let the backend pick.
    #[default]
    Default,
    /// A named preset from `GET /api/voxcpm/voices`.
    Preset(String),
    /// A sample previously stored through `POST /api/upload`.
    Uploaded(String),
}

impl VoiceChoice {
    /// Backend path for this voice, or `None` for the default voice.
    pub fn voice_path(&self) -> Option<String> {
        match self {
            VoiceChoice::Default => None,
            VoiceChoice::Preset(name) => Some(format!("{PRESET_VOICE_DIR}/{name}")),
            VoiceChoice::Uploaded(path) => Some(path.clone()),
        }
    }

    /// Build a choice from CLI-style inputs. An uploaded sample wins over
    /// a preset, matching how the two are mutually exclusive in practice.
    pub fn from_parts(uploaded: Option<String>, preset: Option<String>) -> Self {
        match (uploaded, preset) {
            (Some(path), _) if !path.is_empty() => VoiceChoice::Uploaded(path),
            (_, Some(name)) if !name.is_empty() => VoiceChoice::Preset(name),
            _ => VoiceChoice::Default,
        }
    }
}

/// Parameters for a lipsync video job.
#[derive(Debug, Clone, Validate)]
pub struct LipsyncRequest {
    #[validate(length(min = 1, message = "Character slug is required"))]
    pub character_slug: String,
    pub character_name: String,
    /// The line the character will speak.
    pub text: String,
    /// Avatar image the video is animated from.
    pub reference_image: Option<String>,
    pub resolution: Resolution,
    pub voice: VoiceChoice,
}

impl LipsyncRequest {
    pub fn new(
        character_slug: impl Into<String>,
        character_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            character_slug: character_slug.into(),
            character_name: character_name.into(),
            text: text.into(),
            reference_image: None,
            resolution: Resolution::default(),
            voice: VoiceChoice::default(),
        }
    }

    /// Reject requests the backend would not be able to run.
    ///
    /// With `require_voice` set, the default voice is not accepted.
    /// Returns the reference image.
    pub fn check(&self, require_voice: bool) -> Result<&str, CoreError> {
        if self.text.trim().is_empty() {
            return Err(CoreError::Validation(MSG_EMPTY_TEXT.to_string()));
        }
        let reference = self
            .reference_image
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| CoreError::Validation(MSG_NO_REFERENCE_IMAGE.to_string()))?;
        if require_voice && self.voice.voice_path().is_none() {
            return Err(CoreError::Validation(MSG_NO_VOICE.to_string()));
        }
        self.validate()?;
        Ok(reference)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
