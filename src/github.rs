//! GitHub Releases backend.
//!
//! Implements [`ReleaseHost`] over the GitHub REST API with a blocking
//! `reqwest` client. Every request carries the token as a bearer credential.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::PublishError;
use crate::release::{AssetUpload, NewRelease, Release, ReleaseHost, UploadedAsset};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Uploads can be large.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

const USER_AGENT: &str = "fatpub";
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// A repository identifier of the form `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn parse(repo: &str) -> Result<Self, PublishError> {
        let invalid = || PublishError::InvalidInput {
            field: "repository",
            reason: format!("expected owner/name, got {repo:?}"),
        };
        let (owner, name) = repo.split_once('/').ok_or_else(invalid)?;
        let valid = |s: &str| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Error payload returned by the GitHub API.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
}

/// A failed response, read to completion.
struct Failure {
    status: StatusCode,
    body: ApiErrorBody,
    raw: String,
}

impl Failure {
    fn read(resp: Response) -> Self {
        let status = resp.status();
        let raw = resp.text().unwrap_or_default();
        let body = serde_json::from_str(&raw).unwrap_or_default();
        Self { status, body, raw }
    }

    fn message(&self) -> String {
        if let Some(message) = &self.body.message {
            return message.clone();
        }
        let trimmed = self.raw.trim();
        if trimmed.is_empty() {
            "no details provided".to_string()
        } else if trimmed.len() > 200 {
            let cut = (0..=200).rev().find(|&i| trimmed.is_char_boundary(i)).unwrap_or(0);
            format!("{}...", &trimmed[..cut])
        } else {
            trimmed.to_string()
        }
    }

    fn has_code(&self, code: &str) -> bool {
        self.body
            .errors
            .iter()
            .any(|e| e.code.as_deref() == Some(code))
    }

    fn is_auth(&self) -> bool {
        matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    }

    fn into_auth(self) -> PublishError {
        PublishError::Authentication {
            status: self.status.as_u16(),
            message: self.message(),
        }
    }

    fn into_api(self) -> PublishError {
        PublishError::Api {
            status: self.status.as_u16(),
            message: self.message(),
        }
    }
}

/// GitHub release host for a single repository.
pub struct GithubHost {
    client: Client,
    api_url: Url,
    repo: RepoId,
    token: String,
}

impl GithubHost {
    /// Builds a host without contacting the API.
    pub fn new(api_url: &str, repo: RepoId, token: &str) -> Result<Self, PublishError> {
        let api_url = Url::parse(api_url.trim()).map_err(|e| PublishError::InvalidInput {
            field: "api url",
            reason: e.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(PublishError::InvalidInput {
                field: "api url",
                reason: format!("{api_url} cannot be used as a base URL"),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url,
            repo,
            token: token.to_string(),
        })
    }

    /// Builds a host and checks that the repository is reachable with the
    /// given token.
    pub fn connect(api_url: &str, repo: RepoId, token: &str) -> Result<Self, PublishError> {
        let host = Self::new(api_url, repo, token)?;
        host.verify_repository()?;
        Ok(host)
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// `GET /repos/{owner}/{repo}`
    pub fn verify_repository(&self) -> Result<(), PublishError> {
        let url = self.endpoint(&[])?;
        let resp = self.send(self.client.get(url.clone()), &url)?;
        if resp.status().is_success() {
            return Ok(());
        }
        let failure = Failure::read(resp);
        if failure.is_auth() {
            return Err(failure.into_auth());
        }
        if failure.status == StatusCode::NOT_FOUND {
            return Err(PublishError::NotFound {
                what: format!("repository {}", self.repo),
                message: failure.message(),
            });
        }
        Err(failure.into_api())
    }

    /// Builds `{api}/repos/{owner}/{repo}/{segments...}`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PublishError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| PublishError::InvalidInput {
                field: "api url",
                reason: format!("{} cannot be used as a base URL", self.api_url),
            })?
            .pop_if_empty()
            .extend(["repos", self.repo.owner.as_str(), self.repo.name.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, PublishError> {
        let resp = request.bearer_auth(&self.token).send()?;
        tracing::debug!("{} -> {}", url, resp.status());
        Ok(resp)
    }
}

/// Expands an upload URL template by dropping its `{?name,label}` suffix.
fn upload_endpoint(template: &str, name: &str) -> Option<Url> {
    let base = template.split('{').next()?.trim();
    let mut url = Url::parse(base).ok()?;
    url.query_pairs_mut().append_pair("name", name);
    Some(url)
}

impl ReleaseHost for GithubHost {
    /// `GET /repos/{owner}/{repo}/releases/tags/{tag}`
    fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>, PublishError> {
        let url = self.endpoint(&["releases", "tags", tag])?;
        let resp = self.send(self.client.get(url.clone()), &url)?;
        if resp.status().is_success() {
            let text = resp.text()?;
            return Ok(Some(serde_json::from_str(&text)?));
        }
        let failure = Failure::read(resp);
        let status = failure.status;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            _ if failure.is_auth() => Err(failure.into_auth()),
            _ => Err(failure.into_api()),
        }
    }

    /// `POST /repos/{owner}/{repo}/releases`
    fn create_release(&self, release: &NewRelease) -> Result<Release, PublishError> {
        let url = self.endpoint(&["releases"])?;
        let resp = self.send(self.client.post(url.clone()).json(release), &url)?;
        if resp.status().is_success() {
            let text = resp.text()?;
            return Ok(serde_json::from_str(&text)?);
        }
        let failure = Failure::read(resp);
        let status = failure.status;
        match status {
            StatusCode::UNPROCESSABLE_ENTITY if failure.has_code("already_exists") => {
                Err(PublishError::AlreadyExists {
                    tag: release.tag_name.clone(),
                })
            }
            StatusCode::NOT_FOUND => Err(PublishError::NotFound {
                what: format!("repository {}", self.repo),
                message: failure.message(),
            }),
            _ if failure.is_auth() => Err(failure.into_auth()),
            _ => Err(failure.into_api()),
        }
    }

    /// `POST {upload_url}?name={name}`
    fn upload_asset(
        &self,
        release: &Release,
        asset: &AssetUpload,
    ) -> Result<UploadedAsset, PublishError> {
        let rejected = |message: String| PublishError::Upload {
            name: asset.name.clone(),
            message,
        };
        let url = upload_endpoint(&release.upload_url, &asset.name).ok_or_else(|| {
            rejected(format!(
                "release {} has no usable upload URL ({:?})",
                release.tag_name, release.upload_url
            ))
        })?;

        let request = self
            .client
            .post(url.clone())
            .timeout(UPLOAD_TIMEOUT)
            .header(header::CONTENT_TYPE, asset.content_type.as_str())
            .body(asset.data.clone());
        let resp = self
            .send(request, &url)
            .map_err(|e| rejected(e.to_string()))?;

        if resp.status().is_success() {
            let text = resp.text().map_err(|e| rejected(e.to_string()))?;
            return Ok(serde_json::from_str(&text)?);
        }
        let failure = Failure::read(resp);
        if failure.status == StatusCode::UNAUTHORIZED {
            return Err(failure.into_auth());
        }
        let message = format!("HTTP {}: {}", failure.status.as_u16(), failure.message());
        Err(rejected(message))
    }
}
