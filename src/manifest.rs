//! Module list read by the command-line host.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::ModuleDescriptor;
use crate::update::installer::ApplyReport;
use crate::update::version::version_from_tag;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "module", default)]
    pub modules: Vec<ModuleDescriptor>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize manifest")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write manifest {}", path.display()))
    }

    /// Bump the version of every module the apply pass replaced.
    ///
    /// Returns the number of entries changed.
    pub fn record_installed(&mut self, report: &ApplyReport) -> usize {
        let mut changed = 0;
        for update in &report.applied {
            let version = version_from_tag(&update.new_version);
            for module in self
                .modules
                .iter_mut()
                .filter(|m| m.name == update.mod_name && m.installed_version != version)
            {
                module.installed_version = version.to_string();
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PendingUpdate;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
[[module]]
name = "Foo"
version = "1.0.0"
download_link = "https://github.com/Exil/FooMod/releases"
path = "Mods/Foo.dll"

[[module]]
name = "Local"
version = "0.3"
path = "Mods/Local.dll"
"#;

    fn applied(name: &str, tag: &str) -> ApplyReport {
        ApplyReport {
            applied: vec![PendingUpdate {
                mod_name: name.to_string(),
                local_path: PathBuf::from(format!("Mods/{}.dll", name)),
                download_url: format!("https://dl.invalid/{}.dll", name),
                new_version: tag.to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(MANIFEST).unwrap();

        assert_eq!(manifest.modules.len(), 2);
        assert_eq!(manifest.modules[0].installed_version, "1.0.0");
        assert_eq!(manifest.modules[0].local_binary_path, PathBuf::from("Mods/Foo.dll"));
        assert!(manifest.modules[1].download_link.is_none());
    }

    #[test]
    fn test_empty_manifest() {
        assert!(Manifest::parse("").unwrap().modules.is_empty());
    }

    #[test]
    fn test_missing_path_is_an_error() {
        assert!(Manifest::parse("[[module]]\nname = \"Foo\"\nversion = \"1.0\"\n").is_err());
    }

    #[test]
    fn test_record_installed_bumps_version() {
        let mut manifest = Manifest::parse(MANIFEST).unwrap();

        assert_eq!(manifest.record_installed(&applied("Foo", "v1.1.0")), 1);
        assert_eq!(manifest.modules[0].installed_version, "1.1.0");
        assert_eq!(manifest.modules[1].installed_version, "0.3");

        // Already recorded
        assert_eq!(manifest.record_installed(&applied("Foo", "v1.1.0")), 0);
    }

    #[test]
    fn test_saved_manifest_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mods.toml");
        let mut manifest = Manifest::parse(MANIFEST).unwrap();
        manifest.record_installed(&applied("Foo", "v1.1.0"));

        manifest.save(&path).unwrap();
        let reloaded = Manifest::load(&path).unwrap();

        assert_eq!(reloaded.modules, manifest.modules);
        assert_eq!(reloaded.modules[0].installed_version, "1.1.0");
        assert!(reloaded.modules[1].download_link.is_none());
    }
}
