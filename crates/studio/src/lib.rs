//! `fanhub` command-line client for the studio backend.
//!
//! Parses arguments, loads configuration from the environment and runs
//! the image, lipsync, voice and publishing flows from `fanhub-comfyui`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod progress;
pub mod store;
