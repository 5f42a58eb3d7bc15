//! Sound and music definitions.
//!
//! These are the read-only assets callers hand to the engine. They are loaded
//! from the `[sounds.*]` and `[music.*]` tables of the config file and shared
//! through [`SoundRef`] / [`TrackRef`], whose equality is identity: two
//! definitions with identical fields are still two separate debounce keys.

use serde::Deserialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Name of an audio clip, relative to the backend's asset root.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub struct ClipId(Arc<str>);

impl ClipId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ClipId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&str> for ClipId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClipId({:?})", &*self.0)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mix groups every voice is routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum MixBus {
    Master,
    Music,
    #[serde(alias = "SFX")]
    Sfx,
    #[serde(alias = "UI")]
    Ui,
}

impl MixBus {
    pub const ALL: [MixBus; 4] = [MixBus::Master, MixBus::Music, MixBus::Sfx, MixBus::Ui];

    /// Key the bus level is persisted under.
    pub fn param_key(self) -> &'static str {
        match self {
            MixBus::Master => "MasterVol",
            MixBus::Music => "MusicVol",
            MixBus::Sfx => "SFXVol",
            MixBus::Ui => "UIVol",
        }
    }

    pub fn from_param_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bus| bus.param_key() == key)
    }
}

/// Distance attenuation curve handed to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rolloff {
    #[default]
    Logarithmic,
    Linear,
    Custom,
}

/// Inclusive `(min, max)` range used for randomisation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f32; 2]")]
pub struct JitterRange {
    pub min: f32,
    pub max: f32,
}

impl JitterRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

impl From<[f32; 2]> for JitterRange {
    fn from([min, max]: [f32; 2]) -> Self {
        Self { min, max }
    }
}

/// A one-shot (or looping) sound effect with its randomisation and routing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SoundDefinition {
    /// Interchangeable clips; one is picked at random per play.
    pub clips: Vec<ClipId>,
    pub volume: f32,
    /// Only `max` is used: the volume moves by up to `±max`.
    pub volume_jitter: JitterRange,
    pub pitch_jitter: JitterRange,
    /// 0 = 2D, 1 = fully positional.
    pub spatial_blend: f32,
    pub rolloff: Rolloff,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Falls back to [`MixBus::Sfx`] when unset.
    pub output: Option<MixBus>,
    pub priority: u8,
    pub looping: bool,
    pub allow_multiple: bool,
    /// Seconds that must pass before the same definition may play again.
    pub min_repeat_delay: f32,
    /// When false the sound keeps playing (and debounces on real time) while paused.
    pub respect_pause: bool,
}

impl Default for SoundDefinition {
    fn default() -> Self {
        Self {
            clips: Vec::new(),
            volume: 1.0,
            volume_jitter: JitterRange::new(0.0, 0.1),
            pitch_jitter: JitterRange::new(0.95, 1.05),
            spatial_blend: 0.0,
            rolloff: Rolloff::Logarithmic,
            min_distance: 1.0,
            max_distance: 30.0,
            output: None,
            priority: 128,
            looping: false,
            allow_multiple: true,
            min_repeat_delay: 0.05,
            respect_pause: true,
        }
    }
}

/// A background music track.
#[derive(Debug, Clone, Deserialize)]
pub struct MusicTrackDefinition {
    pub clip: ClipId,
    #[serde(default)]
    pub output: Option<MixBus>,
    #[serde(default = "default_track_volume")]
    pub volume: f32,
    /// Tempo metadata for callers; the engine ignores it.
    #[serde(default)]
    pub bpm: Option<f32>,
    #[serde(default)]
    pub beats_per_bar: Option<u32>,
}

fn default_track_volume() -> f32 {
    1.0
}

impl MusicTrackDefinition {
    pub fn new(clip: impl Into<ClipId>) -> Self {
        Self {
            clip: clip.into(),
            output: None,
            volume: default_track_volume(),
            bpm: None,
            beats_per_bar: None,
        }
    }
}

macro_rules! shared_ref {
    ($(#[$meta:meta])* $name:ident, $target:ty) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Arc<$target>);

        impl $name {
            pub fn new(def: $target) -> Self {
                Self(Arc::new(def))
            }

            pub fn ptr_eq(a: &Self, b: &Self) -> bool {
                Arc::ptr_eq(&a.0, &b.0)
            }
        }

        impl Deref for $name {
            type Target = $target;

            fn deref(&self) -> &$target {
                &self.0
            }
        }

        impl From<$target> for $name {
            fn from(def: $target) -> Self {
                Self::new(def)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Self::ptr_eq(self, other)
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                std::ptr::hash(Arc::as_ptr(&self.0), state)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&*self.0).finish()
            }
        }
    };
}

shared_ref!(
    /// Shared handle to a [`SoundDefinition`], compared by identity.
    SoundRef,
    SoundDefinition
);

shared_ref!(
    /// Shared handle to a [`MusicTrackDefinition`], compared by identity.
    TrackRef,
    MusicTrackDefinition
);
