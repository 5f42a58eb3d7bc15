use std::collections::HashMap;

use super::clock::EngineClock;
use crate::definitions::SoundRef;

/// Last-play ledger keyed by sound definition identity.
#[derive(Debug, Default)]
pub struct DebounceGate {
    last_played: HashMap<SoundRef, f64>,
}

impl DebounceGate {
    /// Whether `sound` may play now. Does not record anything.
    pub fn allow(&self, sound: &SoundRef, clock: &EngineClock) -> bool {
        if sound.allow_multiple {
            return true;
        }
        match self.last_played.get(sound) {
            Some(&last) => clock.now(sound.respect_pause) - last >= sound.min_repeat_delay as f64,
            None => true,
        }
    }

    pub fn record(&mut self, sound: &SoundRef, clock: &EngineClock) {
        self.last_played
            .insert(sound.clone(), clock.now(sound.respect_pause));
    }

    pub fn last_played(&self, sound: &SoundRef) -> Option<f64> {
        self.last_played.get(sound).copied()
    }
}
