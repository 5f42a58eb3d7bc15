//! Pause signal.
//!
//! [`PauseController`] decides whether a pause request goes through and
//! publishes the result twice: on a [`PauseFlag`] the engine reads every tick,
//! and on a [`PauseChannel`] for anyone else who wants to hear about it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared pause bit. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct PauseFlag(Arc<AtomicBool>);

impl PauseFlag {
    pub fn set(&self, paused: bool) {
        self.0.store(paused, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(bool) + Send + Sync>;

/// Listener list for pause changes.
#[derive(Default)]
pub struct PauseChannel {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl PauseChannel {
    pub fn subscribe(&mut self, listener: impl FnMut(bool) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the listener was subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Call every listener in subscription order.
    pub fn raise(&mut self, paused: bool) {
        for (_, listener) in &mut self.listeners {
            listener(paused);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for PauseChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PauseChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Gatekeeper for pause requests.
#[derive(Debug)]
pub struct PauseController {
    flag: PauseFlag,
    pub can_pause: bool,
    pub can_unpause: bool,
    channel: PauseChannel,
}

impl PauseController {
    pub fn new(flag: PauseFlag) -> Self {
        Self {
            flag,
            can_pause: true,
            can_unpause: true,
            channel: PauseChannel::default(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.flag.is_paused()
    }

    /// Request a pause state. Gated by `can_pause` / `can_unpause` unless
    /// `forced`. Returns whether the request was applied; applied requests are
    /// published even if the state did not change.
    pub fn toggle(&mut self, paused: bool, forced: bool) -> bool {
        let allowed = forced || if paused { self.can_pause } else { self.can_unpause };
        if !allowed {
            log::debug!("pause request {paused} refused");
            return false;
        }
        self.flag.set(paused);
        self.channel.raise(paused);
        true
    }

    pub fn channel(&mut self) -> &mut PauseChannel {
        &mut self.channel
    }

    pub fn flag(&self) -> &PauseFlag {
        &self.flag
    }
}
