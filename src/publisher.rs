//! Release publishing flow.
//!
//! Per invocation the publisher runs three steps in order:
//! 1. Lookup: ask the host for the release with the requested tag.
//! 2. Create: only if the lookup found nothing.
//! 3. Upload: attach the asset to whichever release the first two steps produced.
//!
//! If Create loses a race with another publisher (the host reports the tag as
//! taken), the release is fetched again and the run continues with it.

use crate::config::PublishConfig;
use crate::error::PublishError;
use crate::github::{GithubHost, RepoId};
use crate::release::{AssetUpload, NewRelease, Release, ReleaseHost, UploadedAsset};

/// What to publish.
#[derive(Debug, Clone)]
pub struct PublishPlan {
    pub tag: String,
    pub message: String,
    pub target: String,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub release: Release,
    /// Whether this run created the release.
    pub created: bool,
    pub asset: UploadedAsset,
}

pub fn validate_token(token: &str) -> Result<(), PublishError> {
    let reason = if token.is_empty() {
        "must not be empty"
    } else if token.chars().any(char::is_whitespace) {
        "must not contain whitespace"
    } else {
        return Ok(());
    };
    Err(PublishError::InvalidInput {
        field: "token",
        reason: reason.to_string(),
    })
}

/// Checks a release tag against git's ref-name rules that matter for tags.
pub fn validate_tag(tag: &str) -> Result<(), PublishError> {
    let reason = if tag.is_empty() {
        "must not be empty"
    } else if tag.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "must not contain whitespace or control characters"
    } else if tag.chars().any(|c| matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\')) {
        "must not contain any of ~ ^ : ? * [ \\"
    } else if tag.contains("..") || tag.contains("@{") || tag.contains("//") {
        "must not contain '..', '@{' or '//'"
    } else if tag.starts_with('-') || tag.starts_with('/') || tag.starts_with('.') {
        "must not start with '-', '/' or '.'"
    } else if tag.ends_with('/') || tag.ends_with('.') || tag.ends_with(".lock") {
        "must not end with '/', '.' or '.lock'"
    } else {
        return Ok(());
    };
    Err(PublishError::InvalidInput {
        field: "version tag",
        reason: format!("{tag:?} {reason}"),
    })
}

/// Ensures the release exists, then uploads `asset` to it.
pub fn publish<H: ReleaseHost>(
    host: &H,
    plan: &PublishPlan,
    asset: &AssetUpload,
) -> Result<PublishOutcome, PublishError> {
    validate_tag(&plan.tag)?;

    let (release, created) = match host.get_release_by_tag(&plan.tag)? {
        Some(release) => {
            tracing::info!("found existing release {} (id {})", release.tag_name, release.id);
            (release, false)
        }
        None => create_or_fetch(host, plan)?,
    };

    let uploaded = host.upload_asset(&release, asset)?;
    tracing::info!(
        "uploaded {} ({} bytes) to {}",
        uploaded.name,
        asset.data.len(),
        release.tag_name
    );
    println!("Uploaded release.");

    Ok(PublishOutcome {
        release,
        created,
        asset: uploaded,
    })
}

fn create_or_fetch<H: ReleaseHost>(
    host: &H,
    plan: &PublishPlan,
) -> Result<(Release, bool), PublishError> {
    let request = NewRelease::for_tag(&plan.tag, &plan.message, &plan.target);
    match host.create_release(&request) {
        Ok(release) => {
            println!("Created release: {}", plan.tag);
            Ok((release, true))
        }
        Err(PublishError::AlreadyExists { tag }) => {
            tracing::warn!("release {tag} was created concurrently, fetching it again");
            match host.get_release_by_tag(&tag)? {
                Some(release) => Ok((release, false)),
                None => Err(PublishError::AlreadyExists { tag }),
            }
        }
        Err(e) => Err(e),
    }
}

/// Runs the whole flow against GitHub using command-line settings.
///
/// Inputs are validated and the asset is read before any request is sent.
pub fn run(config: &PublishConfig) -> Result<PublishOutcome, PublishError> {
    validate_token(&config.token)?;
    validate_tag(&config.version)?;
    let repo = RepoId::parse(&config.repo)?;
    let asset = AssetUpload::from_file(
        &config.asset,
        config.asset_name.clone(),
        &config.content_type,
    )?;

    let host = GithubHost::connect(&config.api_url, repo, &config.token)?;
    tracing::debug!("connected to {} at {}", host.repo(), config.api_url);

    let plan = PublishPlan {
        tag: config.version.clone(),
        message: config.message.clone(),
        target: config.target.clone(),
    };
    publish(&host, &plan, &asset)
}
