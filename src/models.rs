use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata the host announces when a mod finishes registering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(rename = "version")]
    pub installed_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    #[serde(rename = "path")]
    pub local_binary_path: PathBuf,
}

impl ModuleDescriptor {
    pub fn new(
        name: impl Into<String>,
        installed_version: impl Into<String>,
        download_link: Option<&str>,
        local_binary_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            installed_version: installed_version.into(),
            download_link: download_link.map(str::to_string),
            local_binary_path: local_binary_path.into(),
        }
    }

    /// File name of the loaded binary, used to pick the release asset
    pub fn binary_file_name(&self) -> Option<&str> {
        self.local_binary_path.file_name()?.to_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub assets: Vec<AssetInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub name: String,
    pub download_url: String,
}

impl ReleaseInfo {
    /// First asset whose name matches `file_name`, ignoring ASCII case
    pub fn find_asset(&self, file_name: &str) -> Option<&AssetInfo> {
        self.assets
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(file_name))
    }
}

/// An update decision waiting for the next startup to be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    #[serde(rename = "ModName", default)]
    pub mod_name: String,
    #[serde(rename = "LocalPath", default)]
    pub local_path: PathBuf,
    #[serde(rename = "DownloadUrl", default)]
    pub download_url: String,
    #[serde(rename = "NewVersion", default)]
    pub new_version: String,
}

impl PendingUpdate {
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Records missing a target path or source URL cannot be applied
    pub fn is_applicable(&self) -> bool {
        !self.local_path.as_os_str().is_empty() && !self.download_url.is_empty()
    }
}
