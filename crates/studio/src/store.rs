//! Gallery persistence as a JSON file between CLI runs.
//!
//! One file holds both galleries so image and lipsync runs can share it:
//!
//! ```json
//! { "images": ["/out/b.png", "/out/a.png"], "videos": [{ "url": "...", "text": "..." }] }
//! ```

use std::io::ErrorKind;
use std::path::Path;

use fanhub_core::gallery::Gallery;
use fanhub_core::job::VideoArtifact;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access gallery file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gallery file is not a valid gallery document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Image and video galleries, each newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGalleries {
    #[serde(default)]
    pub images: Gallery<String>,
    #[serde(default)]
    pub videos: Gallery<VideoArtifact>,
}

/// Load the galleries, treating a missing file as empty.
pub async fn load_galleries(path: &Path) -> Result<StoredGalleries, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoredGalleries::default()),
        Err(e) => Err(e.into()),
    }
}

/// Rewrite the gallery file.
pub async fn save_galleries(path: &Path, galleries: &StoredGalleries) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(galleries)?;
    tokio::fs::write(path, json).await?;
    tracing::debug!(
        path = %path.display(),
        images = galleries.images.len(),
        videos = galleries.videos.len(),
        "Gallery saved",
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let galleries = load_galleries(&dir.path().join("none.json")).await.unwrap();
        assert_eq!(galleries, StoredGalleries::default());
    }

    #[tokio::test]
    async fn both_halves_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");

        let mut galleries = StoredGalleries::default();
        galleries.images.prepend("/out/a.png".to_string());
        galleries.videos.prepend(VideoArtifact {
            url: "/out/1.mp4".into(),
            text: "first".into(),
        });
        galleries.videos.prepend(VideoArtifact {
            url: "/out/2.mp4".into(),
            text: "second".into(),
        });
        save_galleries(&path, &galleries).await.unwrap();

        let loaded = load_galleries(&path).await.unwrap();
        assert_eq!(loaded, galleries);
        assert_eq!(loaded.videos.latest().map(|v| v.url.as_str()), Some("/out/2.mp4"));
    }

    #[tokio::test]
    async fn a_document_with_one_half_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.json");
        tokio::fs::write(&path, br#"{ "images": ["/out/a.png"] }"#).await.unwrap();

        let loaded = load_galleries(&path).await.unwrap();
        assert_eq!(loaded.images.items(), &["/out/a.png"]);
        assert!(loaded.videos.is_empty());
    }

    #[tokio::test]
    async fn garbage_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        assert_matches!(load_galleries(&path).await, Err(StoreError::Json(_)));
    }
}
