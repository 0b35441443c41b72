//! Caption and schedule defaults for publishing generated media.

use chrono::{Duration, NaiveDateTime};

use crate::error::CoreError;
use crate::job::JobKind;
use crate::types::Timestamp;

pub const DEFAULT_IMAGE_CAPTION: &str = "New generation ✨";
pub const DEFAULT_VIDEO_CAPTION: &str = "New video ✨";
pub const DEFAULT_SCHEDULED_CAPTION: &str = "New generated content ✨";

/// Minute-precision format the scheduler accepts (`YYYY-MM-DDTHH:MM`).
pub const SCHEDULE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// How far ahead a post is scheduled when no time is given.
pub const DEFAULT_SCHEDULE_LEAD_MINUTES: i64 = 60;

/// Caption for a feed post, falling back to a per-kind default.
pub fn post_caption(caption: Option<&str>, kind: JobKind) -> String {
    non_blank(caption).unwrap_or(match kind {
        JobKind::Image => DEFAULT_IMAGE_CAPTION,
        JobKind::Video => DEFAULT_VIDEO_CAPTION,
    })
    .to_string()
}

/// Caption for a scheduled TikTok post.
pub fn scheduled_caption(caption: Option<&str>) -> String {
    non_blank(caption).unwrap_or(DEFAULT_SCHEDULED_CAPTION).to_string()
}

/// Default schedule slot: one hour after `now`, truncated to the minute.
pub fn default_schedule_time(now: Timestamp) -> String {
    (now + Duration::minutes(DEFAULT_SCHEDULE_LEAD_MINUTES))
        .format(SCHEDULE_FORMAT)
        .to_string()
}

/// Normalise a user-supplied schedule time to `YYYY-MM-DDTHH:MM`.
///
/// Seconds are accepted and dropped.
pub fn parse_schedule_time(raw: &str) -> Result<String, CoreError> {
    let raw = raw.trim();
    let parsed = NaiveDateTime::parse_from_str(raw, SCHEDULE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| {
            CoreError::Validation(format!(
                "Invalid schedule time '{raw}'. Expected YYYY-MM-DDTHH:MM"
            ))
        })?;
    Ok(parsed.format(SCHEDULE_FORMAT).to_string())
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
