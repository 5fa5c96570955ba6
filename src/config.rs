use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::update::cache::DEFAULT_CACHE_FILE;
use crate::update::github::DEFAULT_API_BASE;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Pending-update cache, relative to the working directory unless absolute
    pub cache_file: PathBuf,

    /// Only download links on this host are checked
    pub release_host: String,

    /// Base of the releases API, overridable for mirrors and tests
    pub api_base_url: String,

    pub user_agent: String,

    /// Upper bound for every HTTP request
    pub timeout_secs: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            release_host: "github.com".to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            user_agent: "VigilModUpdater".to_string(),
            timeout_secs: 30,
        }
    }
}

impl UpdaterConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: UpdaterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vigil-mod-updater")
            .join("config.toml")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
