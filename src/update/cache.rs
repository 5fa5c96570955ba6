//! Durable record of update decisions that wait for the next startup.
//!
//! The cache is a TOML document with one `[[Mod]]` table per pending module.
//! It only exists while something is pending: the apply pass deletes it.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, UpdateError};
use crate::models::PendingUpdate;

pub const DEFAULT_CACHE_FILE: &str = "VigilModUpdaterCache.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(rename = "Mod", default)]
    mods: Vec<PendingUpdate>,
}

pub struct PendingUpdateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PendingUpdateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pending records in insertion order. Missing, unreadable or corrupt
    /// files read as empty.
    pub fn load(&self) -> Vec<PendingUpdate> {
        let _guard = self.lock.lock();
        self.read_unlocked().unwrap_or_else(|e| {
            warn!("Failed to read update cache: {}", e);
            Vec::new()
        })
    }

    /// Queue `update` unless a record for the same mod already exists.
    ///
    /// Returns `true` when the record was written. A cache file that exists
    /// but cannot be read is an error and is left untouched.
    pub fn upsert(&self, update: PendingUpdate) -> Result<bool> {
        let _guard = self.lock.lock();

        let mut mods = self.read_unlocked()?;
        if mods.iter().any(|m| m.mod_name == update.mod_name) {
            debug!(module = %update.mod_name, "update already pending");
            return Ok(false);
        }

        mods.push(update);
        self.write_unlocked(&CacheDocument { mods })?;
        Ok(true)
    }

    /// Delete the backing file. A missing file is already clear.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UpdateError::fs(&self.path, e)),
        }
    }

    /// Only a missing file or an unparseable document counts as empty
    fn read_unlocked(&self) -> Result<Vec<PendingUpdate>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(UpdateError::fs(&self.path, e)),
        };

        match toml::from_str::<CacheDocument>(&content) {
            Ok(doc) => Ok(doc.mods),
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring corrupt update cache: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn write_unlocked(&self, doc: &CacheDocument) -> Result<()> {
        let content = toml::to_string_pretty(doc)
            .map_err(|e| UpdateError::Parse(format!("Failed to serialize update cache: {}", e)))?;

        // Atomic write
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(|e| UpdateError::fs(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| UpdateError::fs(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn update(name: &str, version: &str) -> PendingUpdate {
        PendingUpdate {
            mod_name: name.to_string(),
            local_path: PathBuf::from(format!("Mods/{}.dll", name)),
            download_url: format!("https://dl.invalid/{}.dll", name),
            new_version: version.to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = PendingUpdateStore::new(dir.path().join(DEFAULT_CACHE_FILE));
        assert!(store.load().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_upsert_creates_file() {
        let dir = tempdir().unwrap();
        let store = PendingUpdateStore::new(dir.path().join(DEFAULT_CACHE_FILE));

        assert!(store.upsert(update("Foo", "v1.1.0")).unwrap());
        assert!(store.path().exists());
        assert_eq!(store.load(), vec![update("Foo", "v1.1.0")]);
    }

    #[test]
    fn test_upsert_same_mod_is_noop() {
        let dir = tempdir().unwrap();
        let store = PendingUpdateStore::new(dir.path().join(DEFAULT_CACHE_FILE));

        assert!(store.upsert(update("Foo", "v1.1.0")).unwrap());
        assert!(!store.upsert(update("Foo", "v1.2.0")).unwrap());

        let mods = store.load();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].new_version, "v1.1.0");
    }

    #[test]
    fn test_upsert_keeps_insertion_order() {
        let dir = tempdir().unwrap();
        let store = PendingUpdateStore::new(dir.path().join(DEFAULT_CACHE_FILE));

        store.upsert(update("Zeta", "1.0.1")).unwrap();
        store.upsert(update("Alpha", "2.0.0")).unwrap();

        let names: Vec<String> = store.load().into_iter().map(|m| m.mod_name).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_file_format() {
        let dir = tempdir().unwrap();
        let store = PendingUpdateStore::new(dir.path().join(DEFAULT_CACHE_FILE));
        store.upsert(update("Foo", "v1.1.0")).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("[[Mod]]"));
        assert!(content.contains("ModName = \"Foo\""));
        assert!(content.contains("LocalPath = "));
        assert!(content.contains("DownloadUrl = \"https://dl.invalid/Foo.dll\""));
        assert!(content.contains("NewVersion = \"v1.1.0\""));
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CACHE_FILE);
        fs::write(&path, "<Updates><Mod>").unwrap();

        let store = PendingUpdateStore::new(&path);
        assert!(store.load().is_empty());

        // A fresh record replaces the unreadable content
        store.upsert(update("Foo", "v1.1.0")).unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_unreadable_cache_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CACHE_FILE);
        // A directory at the cache path fails the read with something other than NotFound
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let store = PendingUpdateStore::new(&path);
        let err = store.upsert(update("Foo", "v1.1.0")).unwrap_err();

        assert!(matches!(err, UpdateError::FileSystem { .. }));
        assert!(path.is_dir());
        assert_eq!(fs::read(path.join("keep")).unwrap(), b"x");
        assert!(!path.with_extension("tmp").exists());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let store = PendingUpdateStore::new(dir.path().join(DEFAULT_CACHE_FILE));
        store.upsert(update("Foo", "v1.1.0")).unwrap();

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.load().is_empty());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_concurrent_upserts_keep_every_module() {
        let dir = tempdir().unwrap();
        let store = Arc::new(PendingUpdateStore::new(dir.path().join(DEFAULT_CACHE_FILE)));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.upsert(update(&format!("Mod{}", i % 4), "1.0.1")).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut names: Vec<String> = store.load().into_iter().map(|m| m.mod_name).collect();
        names.sort();
        assert_eq!(names, vec!["Mod0", "Mod1", "Mod2", "Mod3"]);
    }
}
