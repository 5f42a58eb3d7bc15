//! Configuration loader for sfxkit.
//!
//! * Looks for `sfxkit.toml` in the cwd unless overridden by `--config`.
//! * Provides defaults so the file is optional.
//!
//! Sounds and music tracks live in `[sounds.<name>]` / `[music.<name>]`
//! tables and are resolved into shared refs by [`SoundLibrary`].

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::audio::{EngineOptions, DEFAULT_CROSSFADE_SECS, DEFAULT_POOL_SIZE};
use crate::definitions::{MusicTrackDefinition, SoundDefinition, SoundRef, TrackRef};
use crate::error::{AudioError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "sfxkit.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Desired frame-rate cap.
    pub fps:                    u32,
    /// Seed for clip choice and jitter (optional).
    pub seed:                   Option<u64>,
    /// Voices pre-created in the SFX pool.
    pub pool_size:              usize,
    pub default_crossfade_secs: f32,
    /// Directory clip names are resolved against.
    pub asset_root:             PathBuf,
    /// Where bus levels are saved.
    pub settings_path:          PathBuf,
    /// Names from `[music]`, replayed whenever the queue drains.
    pub starting_tracks:        Vec<String>,
    pub sounds:                 HashMap<String, SoundDefinition>,
    pub music:                  HashMap<String, MusicTrackDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps: 60,
            seed: None,
            pool_size: DEFAULT_POOL_SIZE,
            default_crossfade_secs: DEFAULT_CROSSFADE_SECS,
            asset_root: PathBuf::from("assets"),
            settings_path: PathBuf::from("volume.toml"),
            starting_tracks: Vec::new(),
            sounds: HashMap::new(),
            music: HashMap::new(),
        }
    }
}

impl Config {
    /// Load from a TOML file; fall back to defaults on any error.
    pub fn load(path: Option<&str>) -> Self {
        let p = path.unwrap_or(DEFAULT_CONFIG_PATH);
        match fs::read_to_string(p) {
            Ok(text) => Self::from_toml_str(&text).unwrap_or_else(|e| {
                log::warn!("{p}: {e}, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Named, shared definitions built from a [`Config`].
#[derive(Debug, Default)]
pub struct SoundLibrary {
    sounds: HashMap<String, SoundRef>,
    music: HashMap<String, TrackRef>,
    starting: Vec<TrackRef>,
}

impl SoundLibrary {
    /// Fails if `starting_tracks` names a track missing from `[music]`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let sounds = config
            .sounds
            .iter()
            .map(|(name, def)| (name.clone(), SoundRef::new(def.clone())))
            .collect();
        let music: HashMap<String, TrackRef> = config
            .music
            .iter()
            .map(|(name, def)| (name.clone(), TrackRef::new(def.clone())))
            .collect();
        let starting = config
            .starting_tracks
            .iter()
            .map(|name| {
                music
                    .get(name)
                    .cloned()
                    .ok_or_else(|| AudioError::UnknownTrack(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sounds,
            music,
            starting,
        })
    }

    pub fn sound(&self, name: &str) -> Option<&SoundRef> {
        self.sounds.get(name)
    }

    pub fn track(&self, name: &str) -> Option<&TrackRef> {
        self.music.get(name)
    }

    pub fn starting_tracks(&self) -> &[TrackRef] {
        &self.starting
    }

    pub fn engine_options(&self, config: &Config) -> EngineOptions {
        EngineOptions {
            pool_size: config.pool_size,
            default_crossfade_secs: config.default_crossfade_secs,
            seed: config.seed,
            starting_tracks: self.starting.clone(),
        }
    }
}
