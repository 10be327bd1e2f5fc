//! Configuration module.
//!
//! This module defines the command-line interfaces of the two tools using
//! `clap`. Every path, name and endpoint has a default matching the release
//! layout of `libfast_image_encoder`, and every default can be overridden.

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_ARM64_INPUT: &str =
    "target/aarch64-apple-darwin/release/libfast_image_encoder.dylib";
pub const DEFAULT_X86_64_INPUT: &str =
    "target/x86_64-apple-darwin/release/libfast_image_encoder.dylib";
pub const DEFAULT_FAT_OUTPUT: &str = "libfast_image_encoder.dylib";

pub const DEFAULT_REPO: &str = "subalterngames/fast_image_encoder";
pub const DEFAULT_ASSET: &str = "libfast_image_encoder.so";
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-msdownload";
pub const DEFAULT_TARGET: &str = "main";
pub const DEFAULT_MESSAGE: &str = "TODO edit this";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Combine single-architecture Mach-O dylibs into one universal binary.
///
/// Inputs are placed in the output in the order given.
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
pub struct CombineConfig {
    /// Input dylibs, one per architecture
    #[arg(num_args = 1.., default_values = [DEFAULT_ARM64_INPUT, DEFAULT_X86_64_INPUT])]
    pub inputs: Vec<String>,

    /// Output file
    #[arg(short, long, default_value = DEFAULT_FAT_OUTPUT, help = "Path to the universal binary")]
    pub output: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

impl CombineConfig {
    pub fn input_paths(&self) -> Vec<PathBuf> {
        self.inputs.iter().map(PathBuf::from).collect()
    }
}

/// Publish a build artifact to a GitHub release, creating the release if needed.
#[derive(Parser, Debug)]
#[command(author, long_about = None, disable_version_flag = true)]
pub struct PublishConfig {
    /// GitHub token used for every API call
    #[arg(long)]
    pub token: String,

    /// Release tag, also used as the release name
    #[arg(long)]
    pub version: String,

    /// Repository as owner/name
    #[arg(long, default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Local file to upload
    #[arg(long, default_value = DEFAULT_ASSET)]
    pub asset: PathBuf,

    /// Name of the uploaded asset (defaults to the file name of --asset)
    #[arg(long)]
    pub asset_name: Option<String>,

    /// Content type sent with the upload
    #[arg(long, default_value = DEFAULT_CONTENT_TYPE)]
    pub content_type: String,

    /// Branch or commit a new release tag points at
    #[arg(long, default_value = DEFAULT_TARGET)]
    pub target: String,

    /// Body of a newly created release
    #[arg(long, default_value = DEFAULT_MESSAGE)]
    pub message: String,

    /// Base URL of the GitHub REST API
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}
