//! Deterministic, device-free backend.
//!
//! Clips have a nominal length in seconds; a playing channel advances by
//! `dt * pitch` every [`update`](AudioBackend::update) and stops on its own at
//! the end of a non-looping clip. Used for headless runs and every engine test.

use std::collections::HashMap;

use super::{AudioBackend, ChannelId, ChannelSettings, Position};
use crate::definitions::{ClipId, MixBus};

/// Length assumed for clips that were never registered.
pub const DEFAULT_CLIP_SECS: f32 = 1.0;

/// Observable state of one simulated channel.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualChannel {
    pub settings: ChannelSettings,
    pub clip: Option<ClipId>,
    pub playing: bool,
    /// Seconds into the clip.
    pub cursor: f32,
    pub position: Position,
    /// How many times `play` was called on this channel.
    pub starts: u32,
}

impl VirtualChannel {
    fn new() -> Self {
        Self {
            settings: ChannelSettings::default(),
            clip: None,
            playing: false,
            cursor: 0.0,
            position: [0.0; 3],
            starts: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct VirtualBackend {
    channels: Vec<Option<VirtualChannel>>,
    clip_lengths: HashMap<ClipId, f32>,
    bus_gains: HashMap<MixBus, f32>,
    total_starts: u64,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `clip` a length in seconds.
    pub fn register_clip(&mut self, clip: impl Into<ClipId>, seconds: f32) {
        self.clip_lengths.insert(clip.into(), seconds.max(0.0));
    }

    pub fn with_clip(mut self, clip: impl Into<ClipId>, seconds: f32) -> Self {
        self.register_clip(clip, seconds);
        self
    }

    /// Drop the channel's backing state, as if the device released it.
    pub fn destroy_channel(&mut self, channel: ChannelId) {
        if let Some(slot) = self.channels.get_mut(channel.0 as usize) {
            *slot = None;
        }
    }

    pub fn channel(&self, channel: ChannelId) -> Option<&VirtualChannel> {
        self.channels.get(channel.0 as usize)?.as_ref()
    }

    fn channel_mut(&mut self, channel: ChannelId) -> Option<&mut VirtualChannel> {
        self.channels.get_mut(channel.0 as usize)?.as_mut()
    }

    /// Number of `play` calls across every channel.
    pub fn total_starts(&self) -> u64 {
        self.total_starts
    }

    /// Channels currently playing `clip`.
    pub fn playing_clip_count(&self, clip: &ClipId) -> usize {
        self.channels
            .iter()
            .flatten()
            .filter(|c| c.playing && c.clip.as_ref() == Some(clip))
            .count()
    }

    pub fn bus_gain(&self, bus: MixBus) -> Option<f32> {
        self.bus_gains.get(&bus).copied()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.iter().flatten().count()
    }
}

impl AudioBackend for VirtualBackend {
    fn create_channel(&mut self) -> ChannelId {
        let id = ChannelId(self.channels.len() as u32);
        self.channels.push(Some(VirtualChannel::new()));
        id
    }

    fn is_alive(&self, channel: ChannelId) -> bool {
        self.channel(channel).is_some()
    }

    fn configure(&mut self, channel: ChannelId, settings: &ChannelSettings) {
        if let Some(c) = self.channel_mut(channel) {
            c.settings = settings.clone();
        }
    }

    fn play(&mut self, channel: ChannelId, clip: &ClipId) {
        let Some(c) = self.channel_mut(channel) else {
            return;
        };
        c.clip = Some(clip.clone());
        c.playing = true;
        c.cursor = 0.0;
        c.starts += 1;
        self.total_starts += 1;
    }

    fn stop(&mut self, channel: ChannelId) {
        if let Some(c) = self.channel_mut(channel) {
            c.playing = false;
        }
    }

    fn is_playing(&self, channel: ChannelId) -> bool {
        self.channel(channel).is_some_and(|c| c.playing)
    }

    fn clip(&self, channel: ChannelId) -> Option<ClipId> {
        self.channel(channel)?.clip.clone()
    }

    fn set_volume(&mut self, channel: ChannelId, volume: f32) {
        if let Some(c) = self.channel_mut(channel) {
            c.settings.volume = volume;
        }
    }

    fn volume(&self, channel: ChannelId) -> f32 {
        self.channel(channel).map_or(0.0, |c| c.settings.volume)
    }

    fn set_pitch(&mut self, channel: ChannelId, pitch: f32) {
        if let Some(c) = self.channel_mut(channel) {
            c.settings.pitch = pitch;
        }
    }

    fn set_position(&mut self, channel: ChannelId, position: Position) {
        if let Some(c) = self.channel_mut(channel) {
            c.position = position;
        }
    }

    fn set_bus_gain(&mut self, bus: MixBus, db: f32) {
        self.bus_gains.insert(bus, db);
    }

    fn update(&mut self, dt: f32, paused: bool) {
        let lengths = &self.clip_lengths;
        for c in self.channels.iter_mut().flatten() {
            if !c.playing || (paused && !c.settings.ignore_pause) {
                continue;
            }
            let Some(clip) = c.clip.as_ref() else {
                c.playing = false;
                continue;
            };
            let len = lengths.get(clip).copied().unwrap_or(DEFAULT_CLIP_SECS);
            c.cursor += dt * c.settings.pitch.max(0.0);
            if c.cursor >= len {
                if c.settings.looping && len > 0.0 {
                    c.cursor %= len;
                } else {
                    c.cursor = len;
                    c.playing = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_finishes_after_its_length_scaled_by_pitch() {
        let mut backend = VirtualBackend::new().with_clip("hit", 1.0);
        let ch = backend.create_channel();
        backend.configure(
            ch,
            &ChannelSettings {
                pitch: 2.0,
                ..Default::default()
            },
        );
        backend.play(ch, &ClipId::new("hit"));
        backend.update(0.4, false);
        assert!(backend.is_playing(ch));
        backend.update(0.2, false);
        assert!(!backend.is_playing(ch));
    }

    #[test]
    fn pause_holds_channels_unless_they_ignore_it() {
        let mut backend = VirtualBackend::new().with_clip("ui", 0.5);
        let game = backend.create_channel();
        let ui = backend.create_channel();
        backend.configure(
            ui,
            &ChannelSettings {
                ignore_pause: true,
                ..Default::default()
            },
        );
        backend.play(game, &ClipId::new("ui"));
        backend.play(ui, &ClipId::new("ui"));

        backend.update(1.0, true);
        assert!(backend.is_playing(game));
        assert!(!backend.is_playing(ui));
    }

    #[test]
    fn looping_clip_wraps() {
        let mut backend = VirtualBackend::new().with_clip("amb", 1.0);
        let ch = backend.create_channel();
        backend.configure(
            ch,
            &ChannelSettings {
                looping: true,
                ..Default::default()
            },
        );
        backend.play(ch, &ClipId::new("amb"));
        backend.update(2.5, false);
        assert!(backend.is_playing(ch));
        let cursor = backend.channel(ch).unwrap().cursor;
        assert!((cursor - 0.5).abs() < 1e-4);
    }

    #[test]
    fn destroyed_channel_is_dead_and_inert() {
        let mut backend = VirtualBackend::new();
        let ch = backend.create_channel();
        backend.destroy_channel(ch);
        assert!(!backend.is_alive(ch));
        backend.play(ch, &ClipId::new("x"));
        assert!(!backend.is_playing(ch));
        assert_eq!(backend.total_starts(), 0);
    }
}
