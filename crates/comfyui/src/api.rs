//! REST client for the studio backend.
//!
//! Wraps the ComfyUI, VoxCPM, upload and publishing endpoints using
//! [`reqwest`]. Each method is a single HTTP request; polling and
//! orchestration live in [`crate::poller`] and the flow modules.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use fanhub_core::job::JobStatus;
use fanhub_core::types::JobId;
use reqwest::multipart::{Form, Part};

use crate::messages::{
    Ack, AnimateBody, Envelope, GenerateImagesBody, JobAccepted, PostBody, SaveImageBody,
    SaveVideoBody, ScheduleBody, SpeechBody, SpeechResult, StoredFile, Transcript, Voice,
    VoiceList,
};
use crate::poller::StatusSource;

/// HTTP client for one studio backend.
pub struct StudioApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend answered `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// A successful response lacked a field the caller needs.
    #[error("Response is missing `{0}`")]
    MissingField(&'static str),

    /// A local file could not be read for upload.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioApi {
    /// Create a client for a backend at `api_url`, e.g. `http://host:3000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Reuse an existing [`reqwest::Client`] (shares its connection pool).
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- generation ----

    /// Queue an image job. Sends `POST /api/comfyui/generate`.
    pub async fn generate_images(&self, body: &GenerateImagesBody) -> Result<JobId, ApiError> {
        let accepted: JobAccepted = self.post_json("/api/comfyui/generate", body).await?;
        accepted.prompt_id.ok_or(ApiError::MissingField("promptId"))
    }

    /// Queue a lipsync animation job. Sends `POST /api/comfyui/animate`.
    pub async fn animate(&self, body: &AnimateBody) -> Result<JobId, ApiError> {
        let accepted: JobAccepted = self.post_json("/api/comfyui/animate", body).await?;
        accepted.prompt_id.ok_or(ApiError::MissingField("promptId"))
    }

    /// Fetch the status of a queued job. Sends `GET /api/comfyui/status/{id}`.
    pub async fn job_status(&self, prompt_id: &str) -> Result<JobStatus, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/comfyui/status/{prompt_id}")))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Ask ComfyUI to release GPU memory. Sends `POST /api/comfyui/free-memory`.
    pub async fn free_memory(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/api/comfyui/free-memory"))
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- speech ----

    /// Synthesize speech. Sends `POST /api/voxcpm/generate` and returns the audio URL.
    pub async fn generate_speech(&self, body: &SpeechBody) -> Result<String, ApiError> {
        let result: SpeechResult = self.post_json("/api/voxcpm/generate", body).await?;
        result.audio_url.ok_or(ApiError::MissingField("audioUrl"))
    }

    /// List preset voices. Sends `GET /api/voxcpm/voices`.
    pub async fn list_voices(&self) -> Result<Vec<Voice>, ApiError> {
        let response = self.client.get(self.url("/api/voxcpm/voices")).send().await?;
        let envelope: Envelope<VoiceList> = Self::parse_response(response).await?;
        Ok(envelope.into_result()?.voices)
    }

    /// Transcribe an audio file. Sends multipart `POST /api/voxcpm/transcribe`
    /// with the file in the `audio` field.
    pub async fn transcribe(&self, path: &Path) -> Result<Option<String>, ApiError> {
        let form = Form::new().part("audio", file_part(path).await?);
        let transcript: Transcript = self.post_multipart("/api/voxcpm/transcribe", form).await?;
        Ok(transcript.transcript.filter(|t| !t.trim().is_empty()))
    }

    // ---- storage ----

    /// Store a file on the backend. Sends multipart `POST /api/upload` with
    /// the file in the `file` field and returns the stored path.
    pub async fn upload(&self, path: &Path) -> Result<String, ApiError> {
        let form = Form::new().part("file", file_part(path).await?);
        let stored: StoredFile = self.post_multipart("/api/upload", form).await?;
        stored.filepath.ok_or(ApiError::MissingField("filepath"))
    }

    // ---- publishing ----

    /// Post media to a character's feed. Sends `POST /api/characters/{slug}/post`.
    pub async fn post_to_character(&self, slug: &str, body: &PostBody) -> Result<(), ApiError> {
        let _: Ack = self
            .post_json(&format!("/api/characters/{slug}/post"), body)
            .await?;
        Ok(())
    }

    /// Save an image to the character library.
    pub async fn save_image(&self, slug: &str, body: &SaveImageBody) -> Result<(), ApiError> {
        let _: Ack = self
            .post_json(&format!("/api/characters/{slug}/save-image"), body)
            .await?;
        Ok(())
    }

    /// Save a video to the character library.
    pub async fn save_video(&self, slug: &str, body: &SaveVideoBody) -> Result<(), ApiError> {
        let _: Ack = self
            .post_json(&format!("/api/characters/{slug}/save-video"), body)
            .await?;
        Ok(())
    }

    /// Schedule an image for TikTok. Sends `POST /api/tiktok/schedule`.
    pub async fn schedule_tiktok(&self, body: &ScheduleBody) -> Result<(), ApiError> {
        let _: Ack = self.post_json("/api/tiktok/schedule", body).await?;
        Ok(())
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// POST a JSON body and unwrap the `{success, error}` envelope.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let envelope: Envelope<T> = Self::parse_response(response).await?;
        envelope.into_result()
    }

    /// POST a multipart form and unwrap the `{success, error}` envelope.
    async fn post_multipart<T>(&self, path: &str, form: Form) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await?;
        let envelope: Envelope<T> = Self::parse_response(response).await?;
        envelope.into_result()
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl StatusSource for StudioApi {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, ApiError> {
        self.job_status(job_id).await
    }
}

/// Read a local file into a multipart part, tagged with its content type.
async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(content_type_for_extension(&path.to_string_lossy()))?;
    Ok(part)
}

/// Guess a Content-Type from a file extension.
pub fn content_type_for_extension(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        "mp4" | "m4v" => "video/mp4",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = StudioApi::new("http://localhost:3000/");
        assert_eq!(api.api_url(), "http://localhost:3000");
        assert_eq!(api.url("/api/upload"), "http://localhost:3000/api/upload");
    }

    #[test]
    fn audio_content_types() {
        assert_eq!(content_type_for_extension("sample.WAV"), "audio/wav");
        assert_eq!(content_type_for_extension("/tmp/a.b.mp3"), "audio/mpeg");
        assert_eq!(content_type_for_extension("noext"), "application/octet-stream");
    }

    #[test]
    fn status_error_display() {
        let err = ApiError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "Backend error (502): bad gateway");
    }

    #[test]
    fn rejected_error_display_is_backend_message() {
        let err = ApiError::Rejected("LoRA not found".into());
        assert_eq!(err.to_string(), "LoRA not found");
    }
}
