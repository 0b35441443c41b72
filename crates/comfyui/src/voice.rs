//! Voice presets and uploaded voice samples.

use std::path::Path;

use fanhub_core::request::VoiceChoice;

use crate::api::{content_type_for_extension, ApiError, StudioApi};
use crate::messages::Voice;

/// Errors from voice uploads.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("'{0}' is not an audio file")]
    NotAudio(String),

    #[error("Upload failed: {0}")]
    Api(#[from] ApiError),
}

/// A voice sample stored on the backend, with its auto-transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVoice {
    /// Backend path, usable as a voice path for speech synthesis.
    pub path: String,
    pub file_name: String,
    /// What the sample says, when transcription succeeded.
    pub transcript: Option<String>,
}

impl UploadedVoice {
    pub fn choice(&self) -> VoiceChoice {
        VoiceChoice::Uploaded(self.path.clone())
    }
}

/// Preset voices offered by the backend.
///
/// A failed lookup is logged and yields an empty list, so callers can
/// always fall back to the default voice.
pub async fn list_voices(api: &StudioApi) -> Vec<Voice> {
    match api.list_voices().await {
        Ok(voices) => voices,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load voices");
            Vec::new()
        }
    }
}

/// Upload a voice sample, then ask the backend to transcribe it.
///
/// Only audio files are accepted. An upload failure is an error; a
/// transcription failure only leaves `transcript` empty.
pub async fn upload_voice(api: &StudioApi, path: &Path) -> Result<UploadedVoice, VoiceError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !content_type_for_extension(&file_name).starts_with("audio/") {
        return Err(VoiceError::NotAudio(file_name));
    }

    let stored = api.upload(path).await?;
    tracing::info!(file = %file_name, path = %stored, "Voice sample uploaded");

    let transcript = match api.transcribe(path).await {
        Ok(transcript) => transcript,
        Err(e) => {
            tracing::warn!(file = %file_name, error = %e, "Transcription failed");
            None
        }
    };

    Ok(UploadedVoice {
        path: stored,
        file_name,
        transcript,
    })
}
