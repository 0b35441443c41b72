//! Domain logic for the fanhub generation client.
//!
//! Everything in this crate is pure: job and artifact types, poll
//! policies, request validation, prompt composition and gallery
//! ordering. HTTP and timers live in `fanhub-comfyui`.

pub mod error;
pub mod gallery;
pub mod job;
pub mod polling;
pub mod prompt;
pub mod publish;
pub mod request;
pub mod types;
