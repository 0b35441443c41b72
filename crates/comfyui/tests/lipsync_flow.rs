//! Integration tests for the lipsync flow: speech -> animate -> poll.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use fanhub_comfyui::events::GenerationEvent;
use fanhub_comfyui::{ApiError, GenerationError, LipsyncGenerator, StudioApi};
use fanhub_core::error::CoreError;
use fanhub_core::gallery::Gallery;
use fanhub_core::job::VideoArtifact;
use fanhub_core::polling::PollPolicy;
use fanhub_core::request::{LipsyncRequest, Resolution, VoiceChoice, MSG_NO_VOICE};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn generator(server: &MockServer) -> LipsyncGenerator {
    let api = Arc::new(StudioApi::new(server.uri()));
    LipsyncGenerator::new(api).with_policy(PollPolicy::new(Duration::from_millis(10), 200))
}

fn request() -> LipsyncRequest {
    let mut req = LipsyncRequest::new("ava", "Ava", "Hey, thanks for stopping by!");
    req.reference_image = Some("/uploads/ava.png".into());
    req.resolution = Resolution::R768;
    req.voice = VoiceChoice::Preset("warm_female".into());
    req
}

async fn mount_speech(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/voxcpm/generate"))
        .and(body_partial_json(json!({
            "text": "Hey, thanks for stopping by!",
            "characterName": "Ava",
            "voicePath": "voices/warm_female",
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "audioUrl": "/audio/line.wav" })),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_animate(server: &MockServer, response: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/comfyui/animate"))
        .and(body_partial_json(json!({
            "characterSlug": "ava",
            "referenceImage": "/uploads/ava.png",
            "audioUrl": "/audio/line.wav",
            "resolution": "768",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(1)
        .mount(server)
        .await;
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<GenerationEvent>) -> Vec<GenerationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completed_video_is_prepended_with_its_text() {
    let server = MockServer::start().await;
    mount_speech(&server).await;
    mount_animate(&server, json!({ "success": true, "promptId": "v-1" })).await;
    Mock::given(method("GET"))
        .and(path("/api/comfyui/status/v-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/comfyui/status/v-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "done", "videoUrl": "/out/v-1.mp4" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let generator = generator(&server);
    let mut rx = generator.subscribe();
    let older = VideoArtifact {
        url: "/out/older.mp4".into(),
        text: "Earlier line".into(),
    };
    let mut gallery = Gallery::from(vec![older.clone()]);

    let artifact = generator.generate(&request(), &mut gallery).await.unwrap();

    let expected = VideoArtifact {
        url: "/out/v-1.mp4".into(),
        text: "Hey, thanks for stopping by!".into(),
    };
    assert_eq!(artifact, expected);
    assert_eq!(gallery.items(), &[expected, older]);
    server.verify().await;

    let progress: Vec<u8> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            GenerationEvent::Progress { percent } => Some(percent),
            _ => None,
        })
        .collect();
    assert_eq!(progress.first(), Some(&10));
    assert_eq!(progress.last(), Some(&100));
    assert!(progress[..progress.len() - 1].iter().all(|p| *p <= 99));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

/// The animate endpoint sometimes answers with `prompt_id`.
#[tokio::test]
async fn snake_case_prompt_id_is_accepted() {
    let server = MockServer::start().await;
    mount_speech(&server).await;
    mount_animate(&server, json!({ "success": true, "prompt_id": "v-2" })).await;
    Mock::given(method("GET"))
        .and(path("/api/comfyui/status/v-2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "done", "videoUrl": "/out/v-2.mp4" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let artifact = generator(&server)
        .generate(&request(), &mut Gallery::new())
        .await
        .unwrap();
    assert_eq!(artifact.url, "/out/v-2.mp4");
}

/// A success response without any job id is a submission error.
#[tokio::test]
async fn missing_prompt_id_is_a_submission_error() {
    let server = MockServer::start().await;
    mount_speech(&server).await;
    mount_animate(&server, json!({ "success": true })).await;

    let result = generator(&server)
        .generate(&request(), &mut Gallery::new())
        .await;

    assert_matches!(
        result,
        Err(GenerationError::Submission(ApiError::MissingField("promptId")))
    );
}

/// Speech failure stops the flow before the animate call.
#[tokio::test]
async fn speech_failure_stops_before_animate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/voxcpm/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "voice file missing" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/comfyui/animate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let generator = generator(&server);
    let mut rx = generator.subscribe();
    let result = generator.generate(&request(), &mut Gallery::new()).await;

    assert_matches!(
        result,
        Err(GenerationError::Submission(ApiError::Rejected(m))) if m == "voice file missing"
    );
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, GenerationEvent::Failed { job_id: None, .. })));
    server.verify().await;
}

/// An `error` status without a message falls back to the video default.
#[tokio::test]
async fn error_status_uses_default_message() {
    let server = MockServer::start().await;
    mount_speech(&server).await;
    mount_animate(&server, json!({ "success": true, "promptId": "v-3" })).await;
    Mock::given(method("GET"))
        .and(path("/api/comfyui/status/v-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "error" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut gallery: Gallery<VideoArtifact> = Gallery::new();
    let result = generator(&server).generate(&request(), &mut gallery).await;

    assert_matches!(result, Err(GenerationError::Failed(m)) if m == "Video generation failed");
    assert!(gallery.is_empty());
    server.verify().await;
}

/// With a voice required, the default voice is refused before any request.
#[tokio::test]
async fn required_voice_rejected_before_any_request() {
    let server = MockServer::start().await;
    let mut req = request();
    req.voice = VoiceChoice::Default;

    let result = generator(&server)
        .require_voice(true)
        .generate(&req, &mut Gallery::new())
        .await;

    assert_matches!(
        result,
        Err(GenerationError::Validation(CoreError::Validation(m))) if m == MSG_NO_VOICE
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// The default voice sends no `voicePath` at all.
#[tokio::test]
async fn default_voice_omits_voice_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/voxcpm/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "stop here" })),
        )
        .mount(&server)
        .await;

    let mut req = request();
    req.voice = VoiceChoice::Default;
    let _ = generator(&server).generate(&req, &mut Gallery::new()).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("voicePath").is_none());
}
