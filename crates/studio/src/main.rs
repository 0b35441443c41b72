//! `fanhub` -- generate character images and lipsync videos from the
//! command line.
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default                 | Description                        |
//! |-------------------------------|----------|-------------------------|------------------------------------|
//! | `FANHUB_API_URL`              | no       | `http://localhost:3000` | Studio backend base URL            |
//! | `FANHUB_REQUEST_TIMEOUT_SECS` | no       | `30`                    | Per-request HTTP timeout           |
//! | `FANHUB_CHARACTER_SLUG`       | no       | --                      | Character used when none is passed |
//! | `FANHUB_LORA_PATH`            | no       | --                      | LoRA used for image jobs           |
//! | `FANHUB_REQUIRE_VOICE`        | no       | `false`                 | Refuse the default lipsync voice   |

use anyhow::{Context, Result};
use clap::Parser;
use fanhub_studio::cli::Cli;
use fanhub_studio::commands::Studio;
use fanhub_studio::config::StudioConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fanhub_studio=info,fanhub_comfyui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.apply_overrides(StudioConfig::from_env().context("Invalid configuration")?);

    tracing::debug!(
        api_url = %config.api_url,
        timeout_secs = config.request_timeout_secs,
        "Configuration loaded",
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let studio = Studio::new(config, cli.gallery.clone(), cancel)?;
    studio.run(cli.command).await
}

/// Cancel in-flight polling on Ctrl-C.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Interrupted, cancelling");
            cancel.cancel();
        }
        Err(e) => tracing::warn!(error = %e, "Failed to install Ctrl+C handler"),
    }
}
