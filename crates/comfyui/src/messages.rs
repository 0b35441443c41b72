//! JSON bodies exchanged with the studio backend.
//!
//! Every field is camelCase on the wire. Most responses share the
//! `{"success": bool, "error": "..."}` envelope; [`Envelope`] peels it
//! off and leaves the endpoint-specific payload.

use fanhub_core::request::Resolution;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Reported when the backend says `success: false` without a reason.
pub const UNKNOWN_ERROR: &str = "Unknown error";

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Common `{success, error}` wrapper around an endpoint payload.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Envelope<T> {
    /// Payload on success, [`ApiError::Rejected`] otherwise.
    pub fn into_result(self) -> Result<T, ApiError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected(
                self.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ))
        }
    }
}

/// Payload for endpoints that only report success.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Body of `POST /api/comfyui/generate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagesBody {
    pub character_slug: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub num_images: u32,
    pub lora_path: String,
}

/// Body of `POST /api/comfyui/animate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimateBody {
    pub character_slug: String,
    pub reference_image: String,
    pub audio_url: String,
    pub resolution: Resolution,
}

/// Payload returned when a ComfyUI job is queued.
///
/// The animate endpoint has been seen replying with `prompt_id`, so
/// both spellings are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct JobAccepted {
    #[serde(default, rename = "promptId", alias = "prompt_id")]
    pub prompt_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

/// Body of `POST /api/voxcpm/generate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechBody {
    pub text: String,
    pub character_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResult {
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// A preset voice offered by the speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoiceList {
    #[serde(default)]
    pub voices: Vec<Voice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoredFile {
    #[serde(default)]
    pub filepath: Option<String>,
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Body of `POST /api/characters/{slug}/post`.
///
/// Videos are posted through the same `imageUrl` field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    pub image_url: String,
    pub caption: String,
    pub is_subscriber_only: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveImageBody {
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVideoBody {
    pub video_url: String,
}

/// Body of `POST /api/tiktok/schedule`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBody {
    pub character_slug: String,
    pub image_url: String,
    pub caption: String,
    pub scheduled_for: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
