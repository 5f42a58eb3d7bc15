//! Bus levels: linear 0..1 in, decibels out, persisted by key.

use super::engine::AudioEngine;
use crate::backend::AudioBackend;
use crate::definitions::MixBus;

/// Gain used for a muted bus.
pub const MUTE_DB: f32 = -80.0;
/// Level assumed for buses with nothing saved.
pub const DEFAULT_LEVEL: f32 = 0.5;

const SILENCE_THRESHOLD: f32 = 1e-4;

pub fn linear_to_db(level: f32) -> f32 {
    if level.is_nan() || level <= SILENCE_THRESHOLD {
        return MUTE_DB;
    }
    (20.0 * level.log10()).max(MUTE_DB)
}

/// Decibels back to an amplitude factor. `MUTE_DB` and below map to silence.
pub fn db_to_amplitude(db: f32) -> f32 {
    if db <= MUTE_DB {
        0.0
    } else {
        10f32.powf(db / 20.0)
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Set a bus level and persist it. Store failures are logged, the level
    /// still applies.
    pub fn set_volume(&mut self, bus: MixBus, level: f32) {
        let level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
        self.apply_level(bus, level);
        if let Err(e) = self.store.store(bus.param_key(), level) {
            log::warn!("could not save {}: {}", bus.param_key(), e);
        }
    }

    /// [`set_volume`](Self::set_volume) by parameter key (`"MusicVol"` etc.).
    /// Returns `false` for unknown keys.
    pub fn set_volume_by_key(&mut self, key: &str, level: f32) -> bool {
        match MixBus::from_param_key(key) {
            Some(bus) => {
                self.set_volume(bus, level);
                true
            }
            None => {
                log::warn!("unknown volume key {key:?}");
                false
            }
        }
    }

    /// Last level applied to `bus`, or the default.
    pub fn volume(&self, bus: MixBus) -> f32 {
        self.levels.get(&bus).copied().unwrap_or(DEFAULT_LEVEL)
    }

    /// Apply every saved level, falling back to the default for missing keys.
    pub fn load_saved_volumes(&mut self) {
        for bus in MixBus::ALL {
            let level = self.store.load(bus.param_key()).unwrap_or(DEFAULT_LEVEL);
            self.apply_level(bus, level.clamp(0.0, 1.0));
        }
    }

    fn apply_level(&mut self, bus: MixBus, level: f32) {
        let db = linear_to_db(level);
        self.backend.set_bus_gain(bus, db);
        self.levels.insert(bus, level);
        log::debug!("{} -> {:.2} ({:.1} dB)", bus.param_key(), level, db);
    }
}
