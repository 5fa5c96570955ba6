use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::cache::PendingUpdateStore;
use super::github::{parse_repo_link, ReleaseClient};
use super::version;
use super::UpdaterContext;
use crate::error::{Result, UpdateError};
use crate::models::{ModuleDescriptor, PendingUpdate};

/// Result of checking a single module against its release feed.
///
/// Links on other hosts and releases without a matching asset surface as
/// `UpdateError::Configuration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    UpToDate { latest: String },
    UpdateAvailable(PendingUpdate),
}

pub struct UpdateChecker {
    releases: ReleaseClient,
    store: Arc<PendingUpdateStore>,
    release_host: String,
}

impl UpdateChecker {
    pub fn new(ctx: &UpdaterContext) -> Self {
        Self {
            releases: ctx.release_client(),
            store: ctx.store.clone(),
            release_host: ctx.config.release_host.clone(),
        }
    }

    /// Check one module and queue an update if a newer build is published.
    ///
    /// Failures are logged and reported as `None`.
    pub fn check_module(&self, module: &ModuleDescriptor) -> Option<PendingUpdate> {
        let name = module.name.as_str();
        info!(module = name, "Checking for updates");

        match self.evaluate(module) {
            Ok(CheckOutcome::UpdateAvailable(update)) => match self.store.upsert(update.clone()) {
                Ok(true) => {
                    info!(module = name, version = %update.new_version, "Update found");
                    Some(update)
                }
                Ok(false) => {
                    debug!(module = name, version = %update.new_version, "Update already queued");
                    Some(update)
                }
                Err(e) => {
                    error!(module = name, "Failed to queue update: {}", e);
                    None
                }
            },
            Ok(CheckOutcome::UpToDate { latest }) => {
                info!(module = name, %latest, "No updates available");
                None
            }
            Err(UpdateError::Configuration(reason)) => {
                info!(module = name, "Skipping update: {}", reason);
                None
            }
            Err(e) => {
                warn!(module = name, "Update check failed: {}", e);
                None
            }
        }
    }

    /// Classify a module without touching the pending-update store
    pub fn evaluate(&self, module: &ModuleDescriptor) -> Result<CheckOutcome> {
        let link = match module.download_link.as_deref().map(str::trim) {
            Some(link) if !link.is_empty() => link,
            _ => return Err(UpdateError::Configuration("no download link".to_string())),
        };

        let repo = match parse_repo_link(link, &self.release_host) {
            Some(repo) => repo,
            None => {
                return Err(UpdateError::Configuration(format!(
                    "{} is not a {} release link",
                    link, self.release_host
                )))
            }
        };

        let file_name = match module.binary_file_name() {
            Some(name) => name.to_string(),
            None => {
                return Err(UpdateError::Configuration(format!(
                    "no file name in {}",
                    module.local_binary_path.display()
                )))
            }
        };

        let release = self.releases.fetch_latest_release(&repo.owner, &repo.repo)?;

        if !version::compare_newer(&release.tag, &module.installed_version)? {
            return Ok(CheckOutcome::UpToDate {
                latest: release.tag,
            });
        }

        let asset = match release.find_asset(&file_name) {
            Some(asset) => asset,
            None => {
                return Err(UpdateError::Configuration(format!(
                    "release {} has no asset named {}",
                    release.tag, file_name
                )))
            }
        };

        Ok(CheckOutcome::UpdateAvailable(PendingUpdate {
            mod_name: module.name.clone(),
            local_path: module.local_binary_path.clone(),
            download_url: asset.download_url.clone(),
            new_version: release.tag.clone(),
        }))
    }
}
