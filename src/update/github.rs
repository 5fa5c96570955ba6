use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::transport::Transport;
use crate::error::{Result, UpdateError};
use crate::models::{AssetInfo, ReleaseInfo};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

impl From<Release> for ReleaseInfo {
    fn from(release: Release) -> Self {
        Self {
            tag: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|a| AssetInfo {
                    name: a.name,
                    download_url: a.browser_download_url,
                })
                .collect(),
        }
    }
}

/// Owner and repository a mod's download link points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

/// Extract owner/repo from a link like `https://github.com/owner/repo/releases`.
///
/// Returns `None` for any other host or a path with fewer than three segments.
pub fn parse_repo_link(link: &str, release_host: &str) -> Option<RepoRef> {
    let link = link.trim();
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))?;

    // Drop query and fragment
    let rest = rest.split(['?', '#']).next()?;

    let (authority, path) = rest.split_once('/')?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    if !host.eq_ignore_ascii_case(release_host) {
        return None;
    }

    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    if parts.len() < 3 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }

    Some(RepoRef {
        owner: parts[0].to_string(),
        repo: parts[1].to_string(),
    })
}

/// Reads the latest published release of a repository
pub struct ReleaseClient {
    transport: Arc<dyn Transport>,
    api_base: String,
}

impl ReleaseClient {
    pub fn new(transport: Arc<dyn Transport>, api_base: &str) -> Self {
        Self {
            transport,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn latest_release_url(&self, repo: &RepoRef) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base, repo.owner, repo.repo
        )
    }

    /// Fetch the latest release info for `owner/repo`
    pub fn fetch_latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo> {
        let url = self.latest_release_url(&RepoRef {
            owner: owner.to_string(),
            repo: repo.to_string(),
        });
        debug!(%url, "fetching latest release");

        let response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(UpdateError::Transport(format!(
                "GitHub API error: {} for {}",
                response.status, url
            )));
        }

        let release: Release = serde_json::from_slice(&response.body)
            .map_err(|e| UpdateError::Parse(format!("Failed to parse release JSON: {}", e)))?;
        Ok(release.into())
    }

    /// Download raw bytes of a release asset
    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.transport.get(url)?;
        if !response.is_success() {
            return Err(UpdateError::Transport(format!(
                "Download failed: {} for {}",
                response.status, url
            )));
        }
        Ok(response.body)
    }
}
