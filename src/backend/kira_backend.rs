use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use kira::manager::backend::DefaultBackend;
use kira::manager::{AudioManager, AudioManagerSettings};
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings};
use kira::sound::PlaybackState;
use kira::track::{TrackBuilder, TrackHandle, TrackRoutes};
use kira::tween::Tween;

use super::{AudioBackend, ChannelId, ChannelSettings, Position};
use crate::audio::volume::db_to_amplitude;
use crate::definitions::{ClipId, MixBus};
use crate::error::{AudioError, Result};

struct KiraChannel {
    settings: ChannelSettings,
    clip: Option<ClipId>,
    sound: Option<StaticSoundHandle>,
    position: Position,
    held_by_pause: bool,
}

impl KiraChannel {
    /// Stop and drop the current sound. Dropping a Kira handle alone leaves
    /// the sound playing.
    fn silence(&mut self) {
        if let Some(mut sound) = self.sound.take() {
            checked("stop", sound.stop(Tween::default()));
        }
        self.held_by_pause = false;
    }
}

/// Log a rejected Kira command. Returns whether it went through.
fn checked<E: std::fmt::Debug>(what: &str, result: std::result::Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::warn!("kira rejected {what}: {err:?}");
            false
        }
    }
}

/// Backend playing through a Kira `AudioManager`.
///
/// Each [`MixBus`] is a sub-track; Music, SFX and UI route into the Master
/// track. Clips are decoded on first use from `asset_root` and cached.
/// Sounds play flat: spatial parameters and positions are recorded only.
pub struct KiraBackend {
    manager: AudioManager<DefaultBackend>,
    asset_root: PathBuf,
    buses: HashMap<MixBus, TrackHandle>,
    clips: HashMap<ClipId, StaticSoundData>,
    broken_clips: HashSet<ClipId>,
    channels: Vec<KiraChannel>,
    paused: bool,
}

impl KiraBackend {
    pub fn new(asset_root: impl Into<PathBuf>) -> Result<Self> {
        let mut manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|err| AudioError::BackendInit(err.to_string()))?;

        let master = manager
            .add_sub_track(TrackBuilder::new())
            .map_err(|err| AudioError::BackendInit(format!("{err:?}")))?;
        let mut buses = HashMap::new();
        for bus in [MixBus::Music, MixBus::Sfx, MixBus::Ui] {
            let track = manager
                .add_sub_track(TrackBuilder::new().routes(TrackRoutes::parent(master.id())))
                .map_err(|err| AudioError::BackendInit(format!("{err:?}")))?;
            buses.insert(bus, track);
        }
        buses.insert(MixBus::Master, master);

        log::info!("Kira audio engine initialised");
        Ok(Self {
            manager,
            asset_root: asset_root.into(),
            buses,
            clips: HashMap::new(),
            broken_clips: HashSet::new(),
            channels: Vec::new(),
            paused: false,
        })
    }

    fn load_clip(&mut self, clip: &ClipId) -> Option<StaticSoundData> {
        if let Some(data) = self.clips.get(clip) {
            return Some(data.clone());
        }
        if self.broken_clips.contains(clip) {
            return None;
        }
        let path = self.asset_root.join(clip.as_str());
        match StaticSoundData::from_file(&path, StaticSoundSettings::default()) {
            Ok(data) => {
                log::debug!("decoded clip {clip} from {}", path.display());
                self.clips.insert(clip.clone(), data.clone());
                Some(data)
            }
            Err(err) => {
                let err = AudioError::ClipLoad {
                    clip: clip.to_string(),
                    reason: err.to_string(),
                };
                log::warn!("{err}; it will play as silence");
                self.broken_clips.insert(clip.clone());
                None
            }
        }
    }

    fn channel_mut(&mut self, channel: ChannelId) -> Option<&mut KiraChannel> {
        self.channels.get_mut(channel.0 as usize)
    }

    fn channel(&self, channel: ChannelId) -> Option<&KiraChannel> {
        self.channels.get(channel.0 as usize)
    }

    /// Last position set on a channel. Kira plays it flat regardless.
    pub fn position(&self, channel: ChannelId) -> Option<Position> {
        self.channel(channel).map(|c| c.position)
    }
}

impl AudioBackend for KiraBackend {
    fn create_channel(&mut self) -> ChannelId {
        let id = ChannelId(self.channels.len() as u32);
        self.channels.push(KiraChannel {
            settings: ChannelSettings::default(),
            clip: None,
            sound: None,
            position: [0.0; 3],
            held_by_pause: false,
        });
        id
    }

    fn is_alive(&self, channel: ChannelId) -> bool {
        self.channel(channel).is_some()
    }

    fn configure(&mut self, channel: ChannelId, settings: &ChannelSettings) {
        let Some(c) = self.channel_mut(channel) else {
            return;
        };
        c.settings = settings.clone();
        if let Some(sound) = c.sound.as_mut() {
            checked("set volume", sound.set_volume(settings.volume as f64, Tween::default()));
            checked("set pitch", sound.set_playback_rate(settings.pitch as f64, Tween::default()));
        }
    }

    fn play(&mut self, channel: ChannelId, clip: &ClipId) {
        let Some(data) = self.load_clip(clip) else {
            if let Some(c) = self.channel_mut(channel) {
                c.silence();
                c.clip = Some(clip.clone());
            }
            return;
        };
        let paused = self.paused;
        let Some(c) = self.channels.get_mut(channel.0 as usize) else {
            return;
        };
        c.silence();

        let mut settings = StaticSoundSettings::new()
            .volume(c.settings.volume as f64)
            .playback_rate(c.settings.pitch as f64);
        if let Some(track) = self.buses.get(&c.settings.bus) {
            settings = settings.output_destination(track);
        }
        if c.settings.looping {
            settings = settings.loop_region(..);
        }

        c.clip = Some(clip.clone());
        match self.manager.play(data.with_settings(settings)) {
            Ok(mut sound) => {
                if paused && !c.settings.ignore_pause {
                    checked("pause", sound.pause(Tween::default()));
                    c.held_by_pause = true;
                }
                c.sound = Some(sound);
            }
            Err(err) => log::warn!("failed to start clip {clip}: {err:?}"),
        }
    }

    fn stop(&mut self, channel: ChannelId) {
        if let Some(c) = self.channel_mut(channel) {
            c.silence();
        }
    }

    fn is_playing(&self, channel: ChannelId) -> bool {
        self.channel(channel)
            .and_then(|c| c.sound.as_ref())
            .is_some_and(|sound| !matches!(sound.state(), PlaybackState::Stopped))
    }

    fn clip(&self, channel: ChannelId) -> Option<ClipId> {
        self.channel(channel)?.clip.clone()
    }

    fn set_volume(&mut self, channel: ChannelId, volume: f32) {
        if let Some(c) = self.channel_mut(channel) {
            c.settings.volume = volume;
            if let Some(sound) = c.sound.as_mut() {
                checked("set volume", sound.set_volume(volume as f64, Tween::default()));
            }
        }
    }

    fn volume(&self, channel: ChannelId) -> f32 {
        self.channel(channel).map_or(0.0, |c| c.settings.volume)
    }

    fn set_pitch(&mut self, channel: ChannelId, pitch: f32) {
        if let Some(c) = self.channel_mut(channel) {
            c.settings.pitch = pitch;
            if let Some(sound) = c.sound.as_mut() {
                checked("set pitch", sound.set_playback_rate(pitch as f64, Tween::default()));
            }
        }
    }

    fn set_position(&mut self, channel: ChannelId, position: Position) {
        if let Some(c) = self.channel_mut(channel) {
            c.position = position;
        }
    }

    fn set_bus_gain(&mut self, bus: MixBus, db: f32) {
        if let Some(track) = self.buses.get_mut(&bus) {
            checked(
                "set bus gain",
                track.set_volume(db_to_amplitude(db) as f64, Tween::default()),
            );
        }
    }

    fn update(&mut self, _dt: f32, paused: bool) {
        if paused == self.paused {
            return;
        }
        self.paused = paused;
        for c in &mut self.channels {
            if c.settings.ignore_pause {
                continue;
            }
            let Some(sound) = c.sound.as_mut() else {
                continue;
            };
            if paused {
                checked("pause", sound.pause(Tween::default()));
                c.held_by_pause = true;
            } else if c.held_by_pause {
                checked("resume", sound.resume(Tween::default()));
                c.held_by_pause = false;
            }
        }
    }
}
