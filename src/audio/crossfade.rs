//! The two music slots and the timed handoff between them.

use super::engine::{AudioEngine, EngineTask};
use super::scheduler::{Poll, TaskId};
use crate::backend::{AudioBackend, ChannelId, ChannelSettings, SpatialParams};
use crate::definitions::{MixBus, TrackRef};

/// Role of a music slot. Exactly one slot is `Active` at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Active,
    Idle,
}

#[derive(Debug)]
pub struct MusicSlot {
    channel: ChannelId,
    track: Option<TrackRef>,
    /// Bumped every time a track is loaded into this slot.
    load: u64,
}

impl MusicSlot {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn track(&self) -> Option<&TrackRef> {
        self.track.as_ref()
    }

    pub fn load(&self) -> u64 {
        self.load
    }

    fn resting_volume(&self) -> f32 {
        self.track.as_ref().map_or(1.0, |t| t.volume)
    }
}

#[derive(Debug)]
pub struct MusicSlotPair {
    slots: [MusicSlot; 2],
    active: usize,
}

impl MusicSlotPair {
    pub fn new<B: AudioBackend>(backend: &mut B) -> Self {
        let mut make = || {
            let channel = backend.create_channel();
            backend.configure(channel, &music_settings(1.0, 1.0, MixBus::Music));
            MusicSlot {
                channel,
                track: None,
                load: 0,
            }
        };
        let a = make();
        let b = make();
        Self {
            slots: [a, b],
            active: 0,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn idle_index(&self) -> usize {
        1 - self.active
    }

    pub fn slot(&self, index: usize) -> &MusicSlot {
        &self.slots[index]
    }

    pub fn active(&self) -> &MusicSlot {
        &self.slots[self.active]
    }

    pub fn idle(&self) -> &MusicSlot {
        &self.slots[self.idle_index()]
    }

    pub fn role(&self, index: usize) -> SlotRole {
        if index == self.active {
            SlotRole::Active
        } else {
            SlotRole::Idle
        }
    }

    fn load_track(&mut self, index: usize, track: TrackRef) -> u64 {
        let slot = &mut self.slots[index];
        slot.track = Some(track);
        slot.load += 1;
        slot.load
    }

    fn activate(&mut self, index: usize) {
        self.active = index;
    }
}

fn music_settings(volume: f32, pitch: f32, bus: MixBus) -> ChannelSettings {
    ChannelSettings {
        volume,
        pitch,
        spatial: SpatialParams::FLAT,
        priority: 0,
        bus,
        looping: false,
        ignore_pause: false,
    }
}

/// Suspended state of one running crossfade.
#[derive(Debug, Clone)]
pub struct Crossfade {
    from: usize,
    to: usize,
    from_start: f32,
    to_target: f32,
    elapsed: f32,
    duration: f32,
}

impl Crossfade {
    /// Progress in `0..=1`.
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Load `track` into the idle slot and fade it in over `duration` seconds
    /// while the active slot fades out. Supersedes any running crossfade.
    /// Non-positive durations fall back to the configured default.
    ///
    /// Returns the slot index and load number the track landed on.
    pub fn crossfade_to(&mut self, track: &TrackRef, duration: f32) -> (usize, u64) {
        if let Some(previous) = self.crossfade.take() {
            self.tasks.cancel(previous);
        }
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            self.default_crossfade
        };

        let from = self.slots.active_index();
        let to = self.slots.idle_index();
        let to_channel = self.slots.slot(to).channel();
        let bus = track.output.unwrap_or(MixBus::Music);
        self.backend
            .configure(to_channel, &music_settings(0.0, self.music_pitch, bus));
        self.backend.play(to_channel, &track.clip);
        let load = self.slots.load_track(to, track.clone());

        let from_start = self.backend.volume(self.slots.slot(from).channel());
        let id = self.tasks.spawn(EngineTask::Crossfade(Crossfade {
            from,
            to,
            from_start,
            to_target: track.volume,
            elapsed: 0.0,
            duration,
        }));
        self.crossfade = Some(id);
        (to, load)
    }

    pub fn is_crossfading(&self) -> bool {
        self.crossfade.is_some()
    }

    pub fn slots(&self) -> &MusicSlotPair {
        &self.slots
    }

    /// Set playback rate on both music slots.
    pub fn set_music_pitch(&mut self, pitch: f32) {
        self.music_pitch = pitch;
        for index in 0..2 {
            let channel = self.slots.slot(index).channel();
            self.backend.set_pitch(channel, pitch);
        }
    }

    pub(crate) fn poll_crossfade(
        &mut self,
        id: TaskId,
        fade: &mut Crossfade,
        dt: f32,
        paused: bool,
    ) -> Poll {
        if paused {
            return Poll::Pending;
        }
        fade.elapsed += dt;
        let a = fade.progress();
        let from_channel = self.slots.slot(fade.from).channel();
        let to_channel = self.slots.slot(fade.to).channel();
        self.backend.set_volume(to_channel, a * fade.to_target);
        self.backend.set_volume(from_channel, (1.0 - a) * fade.from_start);
        if a < 1.0 {
            return Poll::Pending;
        }

        self.backend.stop(from_channel);
        let resting = self.slots.slot(fade.from).resting_volume();
        self.backend.set_volume(from_channel, resting);
        self.backend.set_volume(to_channel, fade.to_target);
        self.slots.activate(fade.to);
        if self.crossfade == Some(id) {
            self.crossfade = None;
        }
        log::trace!("crossfade done, slot {} active", fade.to);
        Poll::Done
    }
}
