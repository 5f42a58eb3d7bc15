//! One-shot sound effect dispatch.

use rand::seq::SliceRandom;
use rand::Rng;

use super::engine::{AudioEngine, EngineTask, VoiceHandle};
use super::pool::FollowTarget;
use super::scheduler::Poll;
use crate::backend::{AudioBackend, ChannelSettings, Position, SpatialParams};
use crate::definitions::{ClipId, MixBus, SoundDefinition, SoundRef};

/// Randomised parameters for one play of a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub clip: ClipId,
    pub settings: ChannelSettings,
}

fn sample(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

impl VoiceParams {
    /// Pick a clip and roll volume and pitch. `None` when there are no clips.
    pub fn roll(def: &SoundDefinition, rng: &mut impl Rng) -> Option<Self> {
        let clip = def.clips.choose(rng)?.clone();
        let spread = def.volume_jitter.max.abs();
        let volume = (def.volume + sample(rng, -spread, spread)).clamp(0.0, 1.0);
        let pitch = sample(rng, def.pitch_jitter.min, def.pitch_jitter.max);

        Some(Self {
            clip,
            settings: ChannelSettings {
                volume,
                pitch,
                spatial: SpatialParams {
                    blend: def.spatial_blend,
                    rolloff: def.rolloff,
                    min_distance: def.min_distance,
                    max_distance: def.max_distance,
                },
                priority: def.priority,
                bus: def.output.unwrap_or(MixBus::Sfx),
                looping: def.looping,
                ignore_pause: !def.respect_pause,
            },
        })
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Play a sound at the origin. See [`play_at`](Self::play_at).
    pub fn play(&mut self, sound: &SoundRef) -> Option<VoiceHandle> {
        self.play_at(sound, None, [0.0; 3])
    }

    /// Play a sound either following `follow` or fixed at `position`.
    ///
    /// Returns `None` when the sound has no clips or is still inside its
    /// repeat delay; neither case has any side effect.
    pub fn play_at(
        &mut self,
        sound: &SoundRef,
        follow: Option<FollowTarget>,
        position: Position,
    ) -> Option<VoiceHandle> {
        if sound.clips.is_empty() {
            return None;
        }
        if !self.debounce.allow(sound, &self.clock) {
            log::trace!("debounced {:?}", sound.clips.first());
            return None;
        }
        let params = VoiceParams::roll(sound, &mut self.rng)?;

        let mut voice = self.pool.borrow(&mut self.backend);
        let channel = voice.channel();
        self.backend.configure(channel, &params.settings);
        if follow.is_none() {
            self.backend.set_position(channel, position);
        }
        voice.follow = follow;
        voice.looping = params.settings.looping;
        self.backend.play(channel, &params.clip);

        let handle = VoiceHandle(self.next_voice);
        self.next_voice += 1;
        if !voice.looping {
            self.tasks.spawn(EngineTask::ReturnVoice(handle));
        }
        self.active.insert(handle, voice);
        self.debounce.record(sound, &self.clock);

        log::debug!(
            "sfx {} on {:?} (vol {:.2}, pitch {:.2})",
            params.clip,
            channel,
            params.settings.volume,
            params.settings.pitch
        );
        Some(handle)
    }

    /// Stop a voice.
    ///
    /// Looping voices go straight back to the pool. One-shots are silenced
    /// and reclaimed by their return task on the next tick. Unknown or
    /// already-returned handles are ignored.
    pub fn stop(&mut self, handle: VoiceHandle) {
        let Some(voice) = self.active.get(&handle) else {
            return;
        };
        self.backend.stop(voice.channel());
        if voice.looping {
            if let Some(voice) = self.active.remove(&handle) {
                self.pool.release(&mut self.backend, voice);
            }
        }
    }

    pub fn is_voice_active(&self, handle: VoiceHandle) -> bool {
        self.active.contains_key(&handle)
    }

    pub fn active_voice_count(&self) -> usize {
        self.active.len()
    }

    /// Move every following voice onto its target's current position.
    /// Targets `resolve` cannot find leave their voices where they were.
    pub fn sync_followers(&mut self, mut resolve: impl FnMut(FollowTarget) -> Option<Position>) {
        for voice in self.active.values() {
            if let Some(position) = voice.follow.and_then(&mut resolve) {
                self.backend.set_position(voice.channel(), position);
            }
        }
    }

    pub(crate) fn poll_voice_return(&mut self, handle: VoiceHandle) -> Poll {
        let Some(voice) = self.active.get(&handle) else {
            return Poll::Done;
        };
        if self.backend.is_playing(voice.channel()) {
            return Poll::Pending;
        }
        if let Some(voice) = self.active.remove(&handle) {
            self.pool.release(&mut self.backend, voice);
        }
        Poll::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::testing::{engine_with, run_for, FRAME};
    use crate::backend::VirtualBackend;
    use crate::definitions::{JitterRange, Rolloff};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blip() -> SoundRef {
        SoundRef::new(SoundDefinition {
            clips: vec!["blip".into()],
            ..Default::default()
        })
    }

    fn backend() -> VirtualBackend {
        VirtualBackend::new()
            .with_clip("blip", 0.25)
            .with_clip("hum", 2.0)
    }

    #[test]
    fn roll_respects_ranges_and_copies_routing() {
        let def = SoundDefinition {
            clips: vec!["a".into(), "b".into()],
            volume: 0.95,
            volume_jitter: JitterRange::new(0.0, 0.2),
            pitch_jitter: JitterRange::new(0.8, 1.2),
            spatial_blend: 1.0,
            rolloff: Rolloff::Linear,
            min_distance: 2.0,
            max_distance: 12.0,
            priority: 40,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let p = VoiceParams::roll(&def, &mut rng).unwrap();
            assert!(p.clip.as_str() == "a" || p.clip.as_str() == "b");
            assert!((0.75..=1.0).contains(&p.settings.volume));
            assert!((0.8..=1.2).contains(&p.settings.pitch));
            assert_eq!(p.settings.bus, MixBus::Sfx);
            assert_eq!(p.settings.spatial.rolloff, Rolloff::Linear);
            assert_eq!(p.settings.spatial.max_distance, 12.0);
            assert_eq!(p.settings.priority, 40);
        }
    }

    #[test]
    fn roll_without_clips_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(VoiceParams::roll(&SoundDefinition::default(), &mut rng).is_none());
    }

    #[test]
    fn empty_sound_plays_nothing() {
        let mut engine = engine_with(backend(), Vec::new());
        let silent = SoundRef::new(SoundDefinition::default());
        assert!(engine.play(&silent).is_none());
        assert_eq!(engine.backend().total_starts(), 0);
        assert_eq!(engine.pool().idle_count(), 4);
    }

    #[test]
    fn pool_size_is_conserved_after_playback_completes() {
        let mut engine = engine_with(backend(), Vec::new());
        let sound = blip();
        let start_idle = engine.pool().idle_count();

        for _ in 0..9 {
            assert!(engine.play(&sound).is_some());
        }
        assert_eq!(engine.active_voice_count(), 9);
        assert_eq!(engine.pool().live_count(), 9);

        run_for(&mut engine, 1.0);
        assert_eq!(engine.active_voice_count(), 0);
        assert_eq!(engine.pool().idle_count(), 9);
        assert!(engine.pool().idle_count() >= start_idle);
        assert_eq!(engine.pending_tasks(), 0);
    }

    #[test]
    fn debounce_suppresses_close_repeats() {
        let sound = SoundRef::new(SoundDefinition {
            clips: vec!["blip".into()],
            allow_multiple: false,
            min_repeat_delay: 0.1,
            ..Default::default()
        });

        let mut engine = engine_with(backend(), Vec::new());
        assert!(engine.play(&sound).is_some());
        engine.tick(0.05);
        assert!(engine.play(&sound).is_none());
        assert_eq!(engine.backend().total_starts(), 1);

        let mut engine = engine_with(backend(), Vec::new());
        assert!(engine.play(&sound).is_some());
        engine.tick(0.2);
        assert!(engine.play(&sound).is_some());
        assert_eq!(engine.backend().total_starts(), 2);
    }

    #[test]
    fn denied_play_does_not_refresh_the_ledger() {
        let sound = SoundRef::new(SoundDefinition {
            clips: vec!["blip".into()],
            allow_multiple: false,
            min_repeat_delay: 0.1,
            ..Default::default()
        });
        let mut engine = engine_with(backend(), Vec::new());
        engine.play(&sound);
        engine.tick(0.06);
        assert!(engine.play(&sound).is_none());
        engine.tick(0.06);
        assert!(engine.play(&sound).is_some());
    }

    #[test]
    fn follow_target_tracks_position() {
        let mut engine = engine_with(backend(), Vec::new());
        let handle = engine
            .play_at(&blip(), Some(FollowTarget(9)), [0.0; 3])
            .unwrap();
        let channel = engine.active[&handle].channel();

        engine.sync_followers(|t| (t == FollowTarget(9)).then_some([1.0, 2.0, 3.0]));
        assert_eq!(engine.backend().channel(channel).unwrap().position, [1.0, 2.0, 3.0]);

        let fixed = engine.play_at(&blip(), None, [5.0, 0.0, 5.0]).unwrap();
        let fixed_channel = engine.active[&fixed].channel();
        engine.sync_followers(|_| Some([9.0; 3]));
        assert_eq!(
            engine.backend().channel(fixed_channel).unwrap().position,
            [5.0, 0.0, 5.0]
        );
    }

    #[test]
    fn followed_voice_ignores_the_fixed_position() {
        let mut engine = engine_with(backend(), Vec::new());
        let handle = engine
            .play_at(&blip(), Some(FollowTarget(3)), [5.0, 5.0, 5.0])
            .unwrap();
        let channel = engine.active[&handle].channel();
        assert_eq!(engine.backend().channel(channel).unwrap().position, [0.0; 3]);
    }

    #[test]
    fn slowed_voice_returns_when_playback_ends() {
        let slow = SoundRef::new(SoundDefinition {
            clips: vec!["blip".into()],
            pitch_jitter: JitterRange::new(0.5, 0.5),
            volume_jitter: JitterRange::new(0.0, 0.0),
            ..Default::default()
        });
        let mut engine = engine_with(backend(), Vec::new());
        let idle = engine.pool().idle_count();
        let handle = engine.play(&slow).unwrap();

        run_for(&mut engine, 0.3);
        assert!(engine.is_voice_active(handle));
        assert_eq!(engine.pool().idle_count() + 1, idle);

        run_for(&mut engine, 0.3);
        assert!(!engine.is_voice_active(handle));
        assert_eq!(engine.pool().idle_count(), idle);
    }

    #[test]
    fn stopping_a_loop_returns_it_immediately() {
        let hum = SoundRef::new(SoundDefinition {
            clips: vec!["hum".into()],
            looping: true,
            ..Default::default()
        });
        let mut engine = engine_with(backend(), Vec::new());
        let handle = engine.play(&hum).unwrap();
        run_for(&mut engine, 5.0);
        assert!(engine.is_voice_active(handle));

        engine.stop(handle);
        assert!(!engine.is_voice_active(handle));
        assert_eq!(engine.pool().idle_count(), 4);

        engine.stop(handle);
        assert_eq!(engine.pool().idle_count(), 4);
    }

    #[test]
    fn stopping_a_one_shot_is_reclaimed_once() {
        let mut engine = engine_with(backend(), Vec::new());
        let handle = engine.play(&blip()).unwrap();
        engine.stop(handle);
        engine.stop(handle);
        assert!(engine.is_voice_active(handle));

        engine.tick(FRAME);
        assert!(!engine.is_voice_active(handle));
        assert_eq!(engine.pool().idle_count(), 4);
        assert_eq!(engine.pool().live_count(), 4);
    }

    #[test]
    fn pause_independent_sounds_keep_playing_while_paused() {
        let ui = SoundRef::new(SoundDefinition {
            clips: vec!["blip".into()],
            respect_pause: false,
            ..Default::default()
        });
        let mut engine = engine_with(backend(), Vec::new());
        let game_voice = engine.play(&blip()).unwrap();
        let ui_voice = engine.play(&ui).unwrap();

        engine.set_paused(true);
        run_for(&mut engine, 1.0);
        assert!(engine.is_voice_active(game_voice));
        assert!(!engine.is_voice_active(ui_voice));

        engine.set_paused(false);
        run_for(&mut engine, 1.0);
        assert!(!engine.is_voice_active(game_voice));
    }
}
