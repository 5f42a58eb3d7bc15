//! Reusable one-shot voices.

use crate::backend::{AudioBackend, ChannelId, ChannelSettings};

/// Something that can follow a voice around, e.g. a Bevy entity's bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowTarget(pub u64);

/// One backend channel lent out by the pool.
#[derive(Debug)]
pub struct Voice {
    channel: ChannelId,
    pub(crate) follow: Option<FollowTarget>,
    pub(crate) looping: bool,
}

impl Voice {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }
}

/// Idle voices plus the count of every voice the pool has minted that is
/// still alive, lent or not.
#[derive(Debug, Default)]
pub struct VoicePool {
    idle: Vec<Voice>,
    live: usize,
}

impl VoicePool {
    /// Pool with `size` voices created up front.
    pub fn with_capacity<B: AudioBackend>(backend: &mut B, size: usize) -> Self {
        let mut pool = Self::default();
        for _ in 0..size {
            let voice = pool.create(backend);
            pool.idle.push(voice);
        }
        pool
    }

    fn create<B: AudioBackend>(&mut self, backend: &mut B) -> Voice {
        self.live += 1;
        Voice {
            channel: backend.create_channel(),
            follow: None,
            looping: false,
        }
    }

    /// Take an idle voice, or mint one. Voices whose channel died while idle
    /// are dropped and replaced.
    pub fn borrow<B: AudioBackend>(&mut self, backend: &mut B) -> Voice {
        while let Some(voice) = self.idle.pop() {
            if backend.is_alive(voice.channel) {
                return voice;
            }
            log::debug!("pooled voice {:?} lost its channel, replacing", voice.channel);
            self.live -= 1;
        }
        self.create(backend)
    }

    /// Stop the voice, reset it and put it back.
    pub fn release<B: AudioBackend>(&mut self, backend: &mut B, mut voice: Voice) {
        backend.stop(voice.channel);
        backend.configure(voice.channel, &ChannelSettings::default());
        backend.set_position(voice.channel, [0.0; 3]);
        voice.follow = None;
        voice.looping = false;
        self.idle.push(voice);
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Voices minted and not yet discarded, idle or lent.
    pub fn live_count(&self) -> usize {
        self.live
    }
}
