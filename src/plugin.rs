use bevy::prelude::*;
use bevy::transform::TransformSystem;
use std::marker::PhantomData;

use crate::audio::{AudioEngine, FollowTarget};
use crate::backend::AudioBackend;

/// Bevy resource wrapping the engine. Insert it before the app runs;
/// the plugin's systems do nothing until it exists.
#[derive(Resource, Deref, DerefMut)]
pub struct AudioEngineRes<B: AudioBackend + Send + Sync + 'static>(pub AudioEngine<B>);

impl From<Entity> for FollowTarget {
    fn from(entity: Entity) -> Self {
        FollowTarget(entity.to_bits())
    }
}

/// Ticks the engine once per frame on real time, moves following voices onto
/// their entity's `GlobalTransform`, and pauses `Time<Virtual>` while the
/// engine's pause flag is set.
pub struct AudioEnginePlugin<B>(PhantomData<fn() -> B>);

impl<B> Default for AudioEnginePlugin<B> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<B: AudioBackend + Send + Sync + 'static> Plugin for AudioEnginePlugin<B> {
    fn build(&self, app: &mut App) {
        app.add_systems(PreUpdate, mirror_pause_to_virtual_time::<B>)
            .add_systems(
                PostUpdate,
                (sync_follow_targets::<B>, tick_audio_engine::<B>)
                    .chain()
                    .after(TransformSystem::TransformPropagate),
            );
    }
}

fn mirror_pause_to_virtual_time<B: AudioBackend + Send + Sync + 'static>(
    engine: Option<Res<AudioEngineRes<B>>>,
    mut time: ResMut<Time<Virtual>>,
) {
    let Some(engine) = engine else {
        return;
    };
    let paused = engine.is_paused();
    if paused != time.is_paused() {
        if paused {
            time.pause();
        } else {
            time.unpause();
        }
    }
}

fn sync_follow_targets<B: AudioBackend + Send + Sync + 'static>(
    engine: Option<ResMut<AudioEngineRes<B>>>,
    transforms: Query<&GlobalTransform>,
) {
    let Some(mut engine) = engine else {
        return;
    };
    engine.sync_followers(|target| {
        let entity = Entity::try_from_bits(target.0).ok()?;
        transforms
            .get(entity)
            .ok()
            .map(|transform| transform.translation().to_array())
    });
}

fn tick_audio_engine<B: AudioBackend + Send + Sync + 'static>(
    engine: Option<ResMut<AudioEngineRes<B>>>,
    time: Res<Time<Real>>,
) {
    if let Some(mut engine) = engine {
        engine.tick(time.delta_secs());
    }
}
