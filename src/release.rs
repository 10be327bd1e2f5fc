//! Release data model and the host abstraction.
//!
//! `ReleaseHost` is the seam between the publishing flow and whatever serves
//! releases. The GitHub implementation lives in `github`; tests substitute
//! their own.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PublishError;
use crate::utils::file_name_lossy;

/// A release as reported by the host.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    /// RFC 6570 template for asset uploads, e.g. `.../assets{?name,label}`.
    #[serde(default)]
    pub upload_url: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

/// Request body for creating a release.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub prerelease: bool,
    pub target_commitish: String,
    pub draft: bool,
}

impl NewRelease {
    /// A published, non-prerelease release named after its tag.
    pub fn for_tag(tag: &str, message: &str, target: &str) -> Self {
        Self {
            tag_name: tag.to_string(),
            name: tag.to_string(),
            body: message.to_string(),
            prerelease: false,
            target_commitish: target.to_string(),
            draft: false,
        }
    }
}

/// A file to attach to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl AssetUpload {
    /// Reads `path` into memory. The asset is named after the file unless
    /// `name` is given.
    pub fn from_file(
        path: &Path,
        name: Option<String>,
        content_type: &str,
    ) -> Result<Self, PublishError> {
        let data = std::fs::read(path).map_err(|source| PublishError::AssetRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = name.unwrap_or_else(|| file_name_lossy(path));
        if name.trim().is_empty() || name.contains('/') {
            return Err(PublishError::InvalidInput {
                field: "asset name",
                reason: format!("{name:?} is not a valid file name"),
            });
        }
        Ok(Self {
            name,
            content_type: content_type.to_string(),
            data,
        })
    }
}

/// An asset as reported by the host after upload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadedAsset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: Option<String>,
}

/// Operations a release-hosting service must provide.
pub trait ReleaseHost {
    /// Looks up a release by tag. `Ok(None)` means the host has no such release.
    fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>, PublishError>;

    /// Creates a release. Fails with `AlreadyExists` if the tag is taken.
    fn create_release(&self, release: &NewRelease) -> Result<Release, PublishError>;

    /// Attaches an asset to an existing release.
    fn upload_asset(
        &self,
        release: &Release,
        asset: &AssetUpload,
    ) -> Result<UploadedAsset, PublishError>;
}
