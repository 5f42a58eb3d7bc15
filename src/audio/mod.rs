//! Engine core: pooled SFX voices, debounce, two-slot music with crossfades
//! and a self-advancing track queue, all driven by one per-frame tick.

pub mod clock;
pub mod crossfade;
pub mod debounce;
pub mod engine;
pub mod pool;
pub mod queue;
pub mod scheduler;
pub mod sfx;
pub mod volume;

pub use clock::EngineClock;
pub use crossfade::{MusicSlot, MusicSlotPair, SlotRole};
pub use debounce::DebounceGate;
pub use engine::{AudioEngine, EngineOptions, VoiceHandle, DEFAULT_CROSSFADE_SECS, DEFAULT_POOL_SIZE};
pub use pool::{FollowTarget, Voice, VoicePool};
pub use queue::{QueueState, TrackQueue};
pub use sfx::VoiceParams;
pub use volume::{db_to_amplitude, linear_to_db, MUTE_DB};
