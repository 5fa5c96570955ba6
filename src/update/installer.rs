use chrono::{DateTime, Local};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::cache::PendingUpdateStore;
use super::github::ReleaseClient;
use super::UpdaterContext;
use crate::error::{Result, UpdateError};
use crate::models::PendingUpdate;

/// What happened to each pending record during one apply pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<PendingUpdate>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl ApplyReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn applied_names(&self) -> Vec<&str> {
        self.applied.iter().map(|u| u.mod_name.as_str()).collect()
    }

    pub fn was_applied(&self, mod_name: &str) -> bool {
        self.applied.iter().any(|u| u.mod_name == mod_name)
    }
}

pub struct UpdateApplier {
    releases: ReleaseClient,
    store: Arc<PendingUpdateStore>,
    clock: fn() -> DateTime<Local>,
}

impl UpdateApplier {
    pub fn new(ctx: &UpdaterContext) -> Self {
        Self {
            releases: ctx.release_client(),
            store: ctx.store.clone(),
            clock: Local::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply every pending update once, then delete the cache.
    ///
    /// Failed records are logged and dropped with the rest of the cache, so a
    /// broken download cannot cause a restart loop.
    pub fn apply_all(&self) -> ApplyReport {
        let mut report = ApplyReport::default();

        for update in self.store.load() {
            let name = update.mod_name.clone();

            if !update.is_applicable() {
                warn!(module = %name, "Pending update has no path or URL, dropping it");
                report.skipped.push(name);
                continue;
            }

            info!(module = %name, version = %update.new_version, "Applying cached update");
            match self.apply_one(&update) {
                Ok(backup) => {
                    info!(
                        module = %name,
                        version = %update.new_version,
                        "Updated, backup saved at {}",
                        backup.display()
                    );
                    report.applied.push(update);
                }
                Err(e @ UpdateError::Transport(_)) => {
                    warn!(module = %name, "Failed to download update: {}", e);
                    report.failed.push(name);
                }
                Err(e) => {
                    error!(module = %name, "Failed to apply cached update: {}", e);
                    report.failed.push(name);
                }
            }
        }

        if let Err(e) = self.store.clear() {
            error!("Failed to delete update cache: {}", e);
        }

        report
    }

    /// Download and install a single record, returning the backup path
    pub fn apply_one(&self, update: &PendingUpdate) -> Result<PathBuf> {
        let data = self.releases.download(&update.download_url)?;
        install_binary(update.local_path(), &data, (self.clock)())
    }
}

/// `<original>.backup_<YYYYMMDDHHmmss>`
pub fn backup_path(local_path: &Path, at: DateTime<Local>) -> PathBuf {
    let mut name = OsString::from(local_path.as_os_str());
    name.push(format!(".backup_{}", at.format("%Y%m%d%H%M%S")));
    PathBuf::from(name)
}

/// Move the current binary aside, then write `data` in its place.
///
/// Nothing is written unless the move succeeded. If the write fails the
/// backup is moved back.
pub fn install_binary(local_path: &Path, data: &[u8], now: DateTime<Local>) -> Result<PathBuf> {
    let backup = backup_path(local_path, now);
    let original_permissions = fs::metadata(local_path).ok().map(|m| m.permissions());

    fs::rename(local_path, &backup).map_err(|e| UpdateError::fs(local_path, e))?;

    if let Err(e) = fs::write(local_path, data) {
        if let Err(restore_err) = fs::rename(&backup, local_path) {
            error!(
                "Failed to restore {} from {}: {}",
                local_path.display(),
                backup.display(),
                restore_err
            );
        }
        return Err(UpdateError::fs(local_path, e));
    }

    if let Some(perms) = original_permissions {
        if let Err(e) = fs::set_permissions(local_path, perms) {
            warn!("Failed to copy permissions to {}: {}", local_path.display(), e);
        }
    }

    Ok(backup)
}
