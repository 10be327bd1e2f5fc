//! Release tooling for native libraries.
//!
//! This library backs two small command-line tools:
//! - `fat-combine` merges per-architecture Mach-O dylibs into one universal binary.
//! - `publish-release` uploads a build artifact to a GitHub release, creating
//!   the release first when it does not exist.
//!
//! It is organized into several modules:
//! - `config`: CLI configuration for both tools.
//! - `arch`: CPU identification of input images.
//! - `layout`: Placement of slices inside the universal binary.
//! - `writer`: Serialization of the universal binary.
//! - `combiner`: The combining orchestration.
//! - `release`: Release model and the `ReleaseHost` seam.
//! - `github`: GitHub REST implementation of `ReleaseHost`.
//! - `publisher`: The lookup, create and upload flow.

pub mod arch;
pub mod combiner;
pub mod config;
pub mod error;
pub mod github;
pub mod layout;
pub mod logging;
pub mod publisher;
pub mod release;
pub mod utils;
pub mod writer;
