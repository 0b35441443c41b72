//! Save, post and schedule actions for finished media.
//!
//! Thin wrappers over [`StudioApi`] that apply caption and schedule
//! defaults before sending.

use fanhub_core::job::JobKind;
use fanhub_core::publish::{
    default_schedule_time, parse_schedule_time, post_caption, scheduled_caption,
};

use crate::api::{ApiError, StudioApi};
use crate::messages::{PostBody, SaveImageBody, SaveVideoBody, ScheduleBody};

/// Errors from publishing actions.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] fanhub_core::error::CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Save media to the character library, picking the endpoint by kind.
pub async fn save_to_library(
    api: &StudioApi,
    slug: &str,
    kind: JobKind,
    url: &str,
) -> Result<(), ActionError> {
    match kind {
        JobKind::Image => {
            api.save_image(
                slug,
                &SaveImageBody {
                    image_url: url.to_string(),
                },
            )
            .await?
        }
        JobKind::Video => {
            api.save_video(
                slug,
                &SaveVideoBody {
                    video_url: url.to_string(),
                },
            )
            .await?
        }
    }
    tracing::info!(character = %slug, %kind, url, "Saved to library");
    Ok(())
}

/// Post media to the character's feed as a public post.
///
/// Returns the caption that was used.
pub async fn post_to_feed(
    api: &StudioApi,
    slug: &str,
    kind: JobKind,
    url: &str,
    caption: Option<&str>,
) -> Result<String, ActionError> {
    let caption = post_caption(caption, kind);
    let body = PostBody {
        image_url: url.to_string(),
        caption: caption.clone(),
        is_subscriber_only: false,
    };
    api.post_to_character(slug, &body).await?;
    tracing::info!(character = %slug, %kind, url, "Posted to feed");
    Ok(caption)
}

/// Schedule an image for TikTok.
///
/// Without `scheduled_for` the post goes out an hour from now. Returns
/// the normalised schedule time.
pub async fn schedule_tiktok(
    api: &StudioApi,
    slug: &str,
    image_url: &str,
    caption: Option<&str>,
    scheduled_for: Option<&str>,
) -> Result<String, ActionError> {
    let scheduled_for = match scheduled_for {
        Some(raw) => parse_schedule_time(raw)?,
        None => default_schedule_time(chrono::Utc::now()),
    };
    let body = ScheduleBody {
        character_slug: slug.to_string(),
        image_url: image_url.to_string(),
        caption: scheduled_caption(caption),
        scheduled_for: scheduled_for.clone(),
    };
    api.schedule_tiktok(&body).await?;
    tracing::info!(character = %slug, image_url, scheduled_for = %scheduled_for, "Scheduled for TikTok");
    Ok(scheduled_for)
}
