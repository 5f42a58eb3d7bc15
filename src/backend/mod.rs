//! Output backends.
//!
//! The engine never touches an audio device directly. It drives numbered
//! output channels through [`AudioBackend`], which is implemented by
//! [`VirtualBackend`] (a deterministic simulation, used headless and in tests)
//! and, with the `kira` feature, by [`KiraBackend`].

use crate::definitions::{ClipId, MixBus, Rolloff};

pub mod virtual_backend;
#[cfg(feature = "kira")]
pub mod kira_backend;

pub use virtual_backend::VirtualBackend;
#[cfg(feature = "kira")]
pub use kira_backend::KiraBackend;

/// World-space position, `[x, y, z]`.
pub type Position = [f32; 3];

/// Identifier of one backend output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u32);

/// Positional parameters; mixing them is the backend's business.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialParams {
    pub blend: f32,
    pub rolloff: Rolloff,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl SpatialParams {
    /// Plain 2D output.
    pub const FLAT: SpatialParams = SpatialParams {
        blend: 0.0,
        rolloff: Rolloff::Logarithmic,
        min_distance: 1.0,
        max_distance: 500.0,
    };
}

impl Default for SpatialParams {
    fn default() -> Self {
        Self::FLAT
    }
}

/// Everything a channel needs before it starts a clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSettings {
    pub volume: f32,
    pub pitch: f32,
    pub spatial: SpatialParams,
    pub priority: u8,
    pub bus: MixBus,
    pub looping: bool,
    /// Keep playing while the engine is paused.
    pub ignore_pause: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 1.0,
            spatial: SpatialParams::FLAT,
            priority: 128,
            bus: MixBus::Sfx,
            looping: false,
            ignore_pause: false,
        }
    }
}

/// The engine's view of an audio device.
///
/// All calls on a channel that no longer exists are no-ops; queries on it
/// report "not playing".
pub trait AudioBackend {
    /// Allocate a fresh output channel.
    fn create_channel(&mut self) -> ChannelId;

    /// Whether the channel's backing resource still exists.
    fn is_alive(&self, channel: ChannelId) -> bool;

    /// Apply settings; takes effect immediately on a playing channel.
    fn configure(&mut self, channel: ChannelId, settings: &ChannelSettings);

    /// Start `clip` from the beginning, replacing whatever was loaded.
    fn play(&mut self, channel: ChannelId, clip: &ClipId);

    /// Stop playback. The clip stays loaded.
    fn stop(&mut self, channel: ChannelId);

    /// True from `play` until the clip finishes or is stopped, including
    /// while paused.
    fn is_playing(&self, channel: ChannelId) -> bool;

    fn clip(&self, channel: ChannelId) -> Option<ClipId>;

    fn set_volume(&mut self, channel: ChannelId, volume: f32);

    fn volume(&self, channel: ChannelId) -> f32;

    fn set_pitch(&mut self, channel: ChannelId, pitch: f32);

    fn set_position(&mut self, channel: ChannelId, position: Position);

    /// Set a mix bus gain in decibels.
    fn set_bus_gain(&mut self, bus: MixBus, db: f32);

    /// Advance one frame. Channels without `ignore_pause` hold still while
    /// `paused` is set.
    fn update(&mut self, dt: f32, paused: bool);
}
