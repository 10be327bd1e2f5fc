//! Entry point for `publish-release`.
//!
//! Uploads one artifact to the GitHub release tagged `--version`, creating the
//! release when it does not exist yet. Any failure exits non-zero.

use anyhow::{Context, Result};
use clap::Parser;

use fatpub::config::PublishConfig;
use fatpub::{logging, publisher};

fn main() -> Result<()> {
    let config = PublishConfig::parse();
    logging::init(&config.log_level);

    let outcome = publisher::run(&config)
        .with_context(|| format!("failed to publish release {}", config.version))?;

    if let Some(url) = &outcome.asset.browser_download_url {
        tracing::info!("asset available at {url}");
    }
    Ok(())
}
