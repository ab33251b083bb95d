//! Release lookup for Godot runtime and export template assets.
//!
//! Releases are looked up by tag through a GitHub-compatible REST endpoint:
//!
//! ```text
//! GET {api_base}/repos/{repository}/releases/tags/{version}
//! ```
//!
//! Only the fields gdx needs are read from the response:
//!
//! ```json
//! {
//!   "tag_name": "4.2.1",
//!   "assets": [
//!     {
//!       "name": "Godot_v4.2.1_linux_headless_64.zip",
//!       "browser_download_url": "https://github.com/.../Godot_v4.2.1_linux_headless_64.zip",
//!       "size": 41234567
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::download::USER_AGENT;
use super::runtime::ReleaseAssets;
use crate::errors::GdxError;

/// Default REST endpoint for release lookups.
pub const DEFAULT_RELEASE_API: &str = "https://api.github.com";

/// Default repository publishing Godot releases.
pub const DEFAULT_RELEASE_REPO: &str = "godotengine/godot";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where releases are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    /// Base URL of the REST API, without a trailing slash.
    pub api_base: String,
    /// `owner/name` of the repository publishing the releases.
    pub repository: String,
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_API, DEFAULT_RELEASE_REPO)
    }
}

impl ReleaseSource {
    /// Creates a release source, normalizing the API base URL.
    #[must_use]
    pub fn new(api_base: &str, repository: &str) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            repository: repository.trim().trim_matches('/').to_string(),
        }
    }

    /// Returns the lookup URL for a release tag.
    #[must_use]
    pub fn release_url(&self, tag: &str) -> String {
        format!(
            "{}/repos/{}/releases/tags/{tag}",
            self.api_base, self.repository
        )
    }
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    /// File name of the asset.
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
    /// Size in bytes, when reported.
    #[serde(default)]
    pub size: u64,
}

/// A published release and its assets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// Tag the release was published under.
    pub tag_name: String,
    /// Files attached to the release.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Finds an asset by exact file name.
    #[must_use = "returns asset info without side effects"]
    pub fn find_asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// The runtime and templates assets resolved for one version and variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssets {
    /// Headless runtime archive.
    pub runtime: Asset,
    /// Export templates archive.
    pub templates: Asset,
}

/// Picks the runtime and templates assets out of a release.
///
/// # Errors
///
/// Returns `GdxError::Resolution` naming the first missing asset.
pub fn select_assets(
    release: &Release,
    wanted: &ReleaseAssets,
) -> Result<ResolvedAssets, GdxError> {
    let find = |name: String| {
        release.find_asset(&name).cloned().ok_or_else(|| {
            GdxError::resolution_error(format!(
                "release {} has no asset named {name}",
                release.tag_name
            ))
        })
    };

    Ok(ResolvedAssets {
        runtime: find(wanted.runtime_asset())?,
        templates: find(wanted.templates_asset())?,
    })
}

/// Looks up a release by tag and resolves the assets for `wanted`.
///
/// # Errors
///
/// Returns `GdxError::Resolution` when the tag or an asset does not exist,
/// and `GdxError::Download` for transport failures, other HTTP errors, and
/// unreadable responses.
pub async fn resolve_assets(
    source: &ReleaseSource,
    wanted: &ReleaseAssets,
) -> Result<ResolvedAssets, GdxError> {
    let release = fetch_release(source, &wanted.version).await?;
    select_assets(&release, wanted)
}

/// Fetches release metadata for a tag.
///
/// # Errors
///
/// See [`resolve_assets`].
pub async fn fetch_release(source: &ReleaseSource, tag: &str) -> Result<Release, GdxError> {
    let url = source.release_url(tag);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| {
            GdxError::download_error_with_source("Failed to create HTTP client", e.into())
        })?;

    tracing::debug!(%url, "looking up release");

    let response = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| {
            GdxError::download_error_with_source(
                format!("Failed to fetch release from {url}"),
                e.into(),
            )
        })?;

    if !response.status().is_success() {
        return Err(handle_http_error(response.status(), tag, &url));
    }

    let text = response.text().await.map_err(|e| {
        GdxError::download_error_with_source(
            format!("Failed to read response from {url}"),
            e.into(),
        )
    })?;

    serde_json::from_str(&text).map_err(|e| {
        GdxError::download_error_with_source(
            format!("Failed to parse release from {url}"),
            e.into(),
        )
    })
}

/// Maps an unsuccessful HTTP status to the matching error.
fn handle_http_error(status: reqwest::StatusCode, tag: &str, url: &str) -> GdxError {
    match status.as_u16() {
        404 => GdxError::resolution_error(format!("no release tagged {tag} at {url}")),
        code if code >= 500 => GdxError::download_error(format!("Server error ({code}): {url}")),
        code => GdxError::download_error(format!("HTTP error {code}: {url}")),
    }
}
