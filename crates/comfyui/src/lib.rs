//! HTTP client and generation flows for the studio backend.
//!
//! Provides typed wrappers for the ComfyUI, VoxCPM, upload and
//! publishing endpoints, a fixed-interval job poller, the image and
//! lipsync generation flows built on it, and the progress events they
//! broadcast.

pub mod actions;
pub mod api;
pub mod error;
pub mod events;
pub mod image;
pub mod lipsync;
pub mod messages;
pub mod poller;
pub mod voice;

pub use api::{ApiError, StudioApi};
pub use error::GenerationError;
pub use image::ImageGenerator;
pub use lipsync::LipsyncGenerator;
