//! Entry point for `fat-combine`.
//!
//! 1. Parse command-line arguments using `clap`.
//! 2. Map every input dylib and identify its architecture.
//! 3. Lay out and write the universal binary.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;

use fatpub::combiner::combine_files;
use fatpub::config::CombineConfig;
use fatpub::logging;

fn main() -> Result<()> {
    let config = CombineConfig::parse();
    logging::init(&config.log_level);

    let inputs = config.input_paths();
    let report = combine_files(&inputs, &config.output)
        .with_context(|| format!("failed to build {}", config.output.display()))?;

    for slice in &report.layout.slices {
        tracing::info!("{}: {} bytes at offset {:#x}", slice.arch, slice.size, slice.offset);
    }
    println!(
        "Wrote fat binary to {} ({} slices)",
        report.output.display(),
        report.layout.slices.len()
    );
    Ok(())
}
