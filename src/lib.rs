//! sfxkit: runtime audio engine for games.
//!
//! One [`AudioEngine`] value owns everything: a pool of reusable one-shot
//! voices with per-sound debounce, two music slots that crossfade into each
//! other, and a FIFO track queue that advances by itself when a track ends and
//! loops the starting playlist once it drains. Call [`AudioEngine::tick`] once
//! per frame; nothing runs in the background.
//!
//! # Features
//! * **kira** *(default)*: [`backend::KiraBackend`], real output through Kira.
//! * **bevy** *(default)*: [`plugin::AudioEnginePlugin`] ticks the engine from
//!   a Bevy app and makes voices follow entities.
//!
//! Without either, the engine runs against [`backend::VirtualBackend`].
//!
//! # Example
//! ```
//! use sfxkit::backend::VirtualBackend;
//! use sfxkit::definitions::{MusicTrackDefinition, SoundDefinition, SoundRef, TrackRef};
//! use sfxkit::{AudioEngine, EngineOptions};
//!
//! let backend = VirtualBackend::new().with_clip("theme.ogg", 90.0);
//! let theme = TrackRef::new(MusicTrackDefinition::new("theme.ogg"));
//! let mut engine = AudioEngine::new(
//!     backend,
//!     EngineOptions { starting_tracks: vec![theme], ..Default::default() },
//! );
//! engine.start();
//!
//! let click = SoundRef::new(SoundDefinition { clips: vec!["click.ogg".into()], ..Default::default() });
//! assert!(engine.play(&click).is_some());
//! engine.tick(1.0 / 60.0);
//! assert_eq!(engine.current_track().unwrap().clip.as_str(), "theme.ogg");
//! ```

pub mod audio;
pub mod backend;
pub mod config;
pub mod definitions;
pub mod error;
pub mod pause;
pub mod settings;
#[cfg(feature = "bevy")]
pub mod plugin;

pub use audio::{AudioEngine, EngineOptions, FollowTarget, QueueState, VoiceHandle};
pub use config::{Config, SoundLibrary};
pub use definitions::{MixBus, MusicTrackDefinition, SoundDefinition, SoundRef, TrackRef};
pub use error::{AudioError, Result};
pub use pause::{PauseChannel, PauseController, PauseFlag};
pub use settings::{MemoryVolumeStore, TomlVolumeStore, VolumeStore};
