//! The engine value callers hold.
//!
//! `AudioEngine` owns the backend, the SFX pool, the two music slots, the
//! track queue and every suspended task. Nothing here is global: the
//! composition root builds one, keeps it (a plain value, or a Bevy resource
//! via [`crate::plugin`]) and calls [`AudioEngine::tick`] once per frame.
//!
//! The public surface is split across the sibling modules:
//! [`sfx`](super::sfx) for one-shots, [`crossfade`](super::crossfade) and
//! [`queue`](super::queue) for music, [`volume`](super::volume) for mix levels.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::clock::EngineClock;
use super::crossfade::{Crossfade, MusicSlotPair};
use super::debounce::DebounceGate;
use super::pool::{Voice, VoicePool};
use super::queue::{TrackMonitor, TrackQueue};
use super::scheduler::{Poll, Scheduler, TaskId};
use crate::backend::AudioBackend;
use crate::definitions::{MixBus, TrackRef};
use crate::pause::PauseFlag;
use crate::settings::{MemoryVolumeStore, VolumeStore};

/// Voices pre-created at startup.
pub const DEFAULT_POOL_SIZE: usize = 12;
/// Crossfade used when none (or a non-positive one) is requested.
pub const DEFAULT_CROSSFADE_SECS: f32 = 1.5;

/// Handle to a playing sound effect. Never reused, so a stale handle is inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(pub(crate) u64);

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub pool_size: usize,
    pub default_crossfade_secs: f32,
    /// Seed for clip choice and jitter; entropy when `None`.
    pub seed: Option<u64>,
    /// Played at start and reloaded whenever the queue drains.
    pub starting_tracks: Vec<TrackRef>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            default_crossfade_secs: DEFAULT_CROSSFADE_SECS,
            seed: None,
            starting_tracks: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum EngineTask {
    /// Give a non-looping voice back to the pool once it stops playing.
    ReturnVoice(VoiceHandle),
    Crossfade(Crossfade),
    TrackMonitor(TrackMonitor),
}

pub struct AudioEngine<B: AudioBackend> {
    pub(crate) backend: B,
    pub(crate) clock: EngineClock,
    pub(crate) pause: PauseFlag,
    pub(crate) rng: StdRng,
    pub(crate) pool: VoicePool,
    pub(crate) active: BTreeMap<VoiceHandle, Voice>,
    pub(crate) next_voice: u64,
    pub(crate) debounce: DebounceGate,
    pub(crate) slots: MusicSlotPair,
    pub(crate) music_pitch: f32,
    pub(crate) queue: TrackQueue,
    pub(crate) tasks: Scheduler<EngineTask>,
    pub(crate) crossfade: Option<TaskId>,
    pub(crate) monitor: Option<TaskId>,
    pub(crate) default_crossfade: f32,
    pub(crate) levels: HashMap<MixBus, f32>,
    pub(crate) store: Box<dyn VolumeStore + Send + Sync>,
}

impl<B: AudioBackend> AudioEngine<B> {
    pub fn new(mut backend: B, options: EngineOptions) -> Self {
        let pool = VoicePool::with_capacity(&mut backend, options.pool_size);
        let slots = MusicSlotPair::new(&mut backend);
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let default_crossfade = if options.default_crossfade_secs > 0.0 {
            options.default_crossfade_secs
        } else {
            DEFAULT_CROSSFADE_SECS
        };
        log::debug!(
            "audio engine ready: {} pooled voices, {:.2}s crossfade, {} starting tracks",
            options.pool_size,
            default_crossfade,
            options.starting_tracks.len()
        );

        Self {
            backend,
            clock: EngineClock::default(),
            pause: PauseFlag::default(),
            rng,
            pool,
            active: BTreeMap::new(),
            next_voice: 0,
            debounce: DebounceGate::default(),
            slots,
            music_pitch: 1.0,
            queue: TrackQueue::new(options.starting_tracks),
            tasks: Scheduler::new(),
            crossfade: None,
            monitor: None,
            default_crossfade,
            levels: HashMap::new(),
            store: Box::new(MemoryVolumeStore::default()),
        }
    }

    /// Persist bus levels somewhere other than memory.
    pub fn with_volume_store(mut self, store: impl VolumeStore + Send + Sync + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Advance one frame: clocks, backend, then every suspended task.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let paused = self.pause.is_paused();
        self.clock.advance(dt, paused);
        self.backend.update(dt, paused);

        for (id, mut task) in self.tasks.begin_tick() {
            if self.tasks.is_cancelled(id) {
                continue;
            }
            let poll = match &mut task {
                EngineTask::ReturnVoice(handle) => self.poll_voice_return(*handle),
                EngineTask::Crossfade(fade) => self.poll_crossfade(id, fade, dt, paused),
                EngineTask::TrackMonitor(monitor) => self.poll_monitor(id, monitor, paused),
            };
            if poll == Poll::Pending {
                self.tasks.resume(id, task);
            }
        }
        self.tasks.end_tick();
    }

    /// Shared flag the engine reads every tick; hand clones to pause publishers.
    pub fn pause_flag(&self) -> PauseFlag {
        self.pause.clone()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.pause.set(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn clock(&self) -> &EngineClock {
        &self.clock
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn default_crossfade_secs(&self) -> f32 {
        self.default_crossfade
    }

    /// Suspended tasks waiting for the next tick.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::backend::VirtualBackend;

    pub const FRAME: f32 = 1.0 / 60.0;

    pub fn engine_with(backend: VirtualBackend, starting: Vec<TrackRef>) -> AudioEngine<VirtualBackend> {
        AudioEngine::new(
            backend,
            EngineOptions {
                pool_size: 4,
                default_crossfade_secs: 0.5,
                seed: Some(7),
                starting_tracks: starting,
            },
        )
    }

    /// Tick at 60 fps for roughly `seconds`.
    pub fn run_for(engine: &mut AudioEngine<VirtualBackend>, seconds: f32) {
        let frames = (seconds / FRAME).round() as usize;
        for _ in 0..frames {
            engine.tick(FRAME);
        }
    }
}
