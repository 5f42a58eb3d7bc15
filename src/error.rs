//! Error types for the fallible edges of the engine.
//!
//! Runtime playback calls never return these: a denied or impossible play is a
//! `None` handle. Errors only come from loading configuration, touching the
//! settings file, or bringing up an output backend.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("i/o error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),

    #[error("unknown music track '{0}' in starting_tracks")]
    UnknownTrack(String),

    #[error("audio backend initialisation failed: {0}")]
    BackendInit(String),

    #[error("failed to load clip '{clip}': {reason}")]
    ClipLoad { clip: String, reason: String },
}

impl AudioError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AudioError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AudioError>;
