//! Error types.
//!
//! The library reports typed errors so callers (and tests) can tell a missing
//! input apart from a malformed one, or a rejected token from a rejected
//! upload. The binaries wrap these in `anyhow` for reporting.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling a fat binary.
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("no input binaries given")]
    NoInputs,

    #[error("cannot read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a single-architecture shared library: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("architecture {arch} appears twice: {} and {}", first.display(), second.display())]
    DuplicateArchitecture {
        arch: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("fat binary layout overflows a 64-bit offset")]
    TooLarge,

    #[error("cannot write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while publishing a release asset.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("authentication rejected (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("{what} not found: {message}")]
    NotFound { what: String, message: String },

    #[error("release {tag} already exists")]
    AlreadyExists { tag: String },

    #[error("upload of {name} rejected: {message}")]
    Upload { name: String, message: String },

    #[error("unexpected response (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cannot read asset {}: {source}", path.display())]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
