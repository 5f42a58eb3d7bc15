//! Persisted bus levels.
//!
//! Levels are stored as plain `key = level` pairs, keyed by the mix bus
//! parameter names (`MasterVol`, `MusicVol`, `SFXVol`, `UIVol`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{AudioError, Result};

/// Key to level store the engine writes on every volume change.
pub trait VolumeStore {
    fn load(&self, key: &str) -> Option<f32>;
    fn store(&mut self, key: &str, level: f32) -> Result<()>;
}

/// In-memory store. Clones share the same levels.
#[derive(Debug, Clone, Default)]
pub struct MemoryVolumeStore {
    levels: Arc<Mutex<BTreeMap<String, f32>>>,
}

impl VolumeStore for MemoryVolumeStore {
    fn load(&self, key: &str) -> Option<f32> {
        let levels = self.levels.lock().ok()?;
        levels.get(key).copied()
    }

    fn store(&mut self, key: &str, level: f32) -> Result<()> {
        if let Ok(mut levels) = self.levels.lock() {
            levels.insert(key.to_owned(), level);
        }
        Ok(())
    }
}

/// TOML file store, rewritten in full on every change.
#[derive(Debug)]
pub struct TomlVolumeStore {
    path: PathBuf,
    levels: BTreeMap<String, f32>,
}

impl TomlVolumeStore {
    /// Open `path`. A missing file is an empty store; a malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let levels = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(AudioError::io(&path, e)),
        };
        log::debug!("loaded {} saved levels from {}", levels.len(), path.display());
        Ok(Self { path, levels })
    }

    /// Like [`open`](Self::open), but starts empty on any error.
    pub fn open_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::open(&path).unwrap_or_else(|e| {
            log::warn!("ignoring saved settings: {e}");
            Self {
                path,
                levels: BTreeMap::new(),
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let text = toml::to_string(&self.levels)?;
        fs::write(&self.path, text).map_err(|e| AudioError::io(&self.path, e))
    }
}

impl VolumeStore for TomlVolumeStore {
    fn load(&self, key: &str) -> Option<f32> {
        self.levels.get(key).copied()
    }

    fn store(&mut self, key: &str, level: f32) -> Result<()> {
        self.levels.insert(key.to_owned(), level);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_clones_share_levels() {
        let a = MemoryVolumeStore::default();
        let mut b = a.clone();
        b.store("MusicVol", 0.3).unwrap();
        assert_eq!(a.load("MusicVol"), Some(0.3));
        assert_eq!(a.load("SFXVol"), None);
    }

    #[test]
    fn toml_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.toml");

        let mut store = TomlVolumeStore::open(&path).unwrap();
        assert_eq!(store.load("MasterVol"), None);
        store.store("MasterVol", 0.8).unwrap();
        store.store("UIVol", 0.0).unwrap();

        let reopened = TomlVolumeStore::open(&path).unwrap();
        assert_eq!(reopened.load("MasterVol"), Some(0.8));
        assert_eq!(reopened.load("UIVol"), Some(0.0));
    }

    #[test]
    fn malformed_file_is_an_error_unless_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.toml");
        fs::write(&path, "MasterVol = [").unwrap();

        assert!(matches!(TomlVolumeStore::open(&path), Err(AudioError::ConfigParse(_))));
        let store = TomlVolumeStore::open_or_default(&path);
        assert_eq!(store.load("MasterVol"), None);
    }

    #[test]
    fn unwritable_path_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TomlVolumeStore::open_or_default(dir.path().join("missing/volume.toml"));
        let err = store.store("MusicVol", 0.5).unwrap_err();
        assert!(matches!(err, AudioError::Io { .. }));
    }
}
