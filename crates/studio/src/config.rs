//! Studio configuration loaded from environment variables.

use std::time::Duration;

/// Default backend address.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Client configuration.
///
/// All fields have defaults suitable for a backend running locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    /// Backend base URL (default: `http://localhost:3000`).
    pub api_url: String,
    /// Per-request HTTP timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Character used when a command does not name one.
    pub character_slug: Option<String>,
    /// LoRA used for image jobs when a command does not name one.
    pub lora_path: Option<String>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            character_slug: None,
            lora_path: None,
        }
    }
}

impl StudioConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `FANHUB_API_URL`              | `http://localhost:3000` |
    /// | `FANHUB_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `FANHUB_CHARACTER_SLUG`       | --                      |
    /// | `FANHUB_LORA_PATH`            | --                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("FANHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());

        let request_timeout_secs = match non_empty("FANHUB_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    var: "FANHUB_REQUEST_TIMEOUT_SECS",
                    expected: "a positive integer",
                    value: raw,
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            request_timeout_secs,
            character_slug: non_empty("FANHUB_CHARACTER_SLUG"),
            lora_path: non_empty("FANHUB_LORA_PATH"),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
