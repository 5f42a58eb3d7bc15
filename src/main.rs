use bevy::app::{AppExit, ScheduleRunnerPlugin};
use bevy::prelude::*;
use clap::Parser;
use std::time::Duration;

use sfxkit::backend::{AudioBackend, KiraBackend, VirtualBackend};
use sfxkit::plugin::{AudioEnginePlugin, AudioEngineRes};
use sfxkit::{AudioEngine, Config, SoundLibrary, TomlVolumeStore};

/// Play the configured starting playlist (and optionally one sound effect)
/// through the audio engine.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML config (default: sfxkit.toml).
    #[arg(long)]
    config: Option<String>,
    /// Use the simulated backend instead of an audio device.
    #[arg(long)]
    headless: bool,
    /// Quit after this many seconds; run until interrupted when omitted.
    #[arg(long)]
    seconds: Option<f32>,
    /// Name of a `[sounds]` entry to play once at startup.
    #[arg(long)]
    sfx: Option<String>,
}

#[derive(Resource)]
struct RunLimit(Option<f32>);

fn main() {
    env_logger::init();
    let args = Args::parse();
    let config = Config::load(args.config.as_deref());

    let library = match SoundLibrary::from_config(&config) {
        Ok(library) => library,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    if args.headless {
        run(VirtualBackend::new(), &config, &library, &args);
        return;
    }
    match KiraBackend::new(&config.asset_root) {
        Ok(backend) => run(backend, &config, &library, &args),
        Err(err) => {
            log::warn!("{err}; falling back to the simulated backend");
            run(VirtualBackend::new(), &config, &library, &args);
        }
    }
}

fn run<B: AudioBackend + Send + Sync + 'static>(
    backend: B,
    config: &Config,
    library: &SoundLibrary,
    args: &Args,
) {
    let store = TomlVolumeStore::open_or_default(&config.settings_path);
    let mut engine = AudioEngine::new(backend, library.engine_options(config)).with_volume_store(store);
    engine.load_saved_volumes();
    engine.start();

    if let Some(name) = &args.sfx {
        match library.sound(name) {
            Some(sound) => {
                if engine.play(sound).is_none() {
                    log::warn!("sound '{name}' has no clips");
                }
            }
            None => log::warn!("no sound named '{name}'"),
        }
    }

    let frame = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)))
        .add_plugins(AudioEnginePlugin::<B>::default())
        .insert_resource(AudioEngineRes(engine))
        .insert_resource(RunLimit(args.seconds))
        .add_systems(Update, (log_track_changes::<B>, stop_after_limit))
        .run();
}

fn log_track_changes<B: AudioBackend + Send + Sync + 'static>(
    engine: Res<AudioEngineRes<B>>,
    mut last: Local<Option<String>>,
) {
    let current = engine.current_track().map(|t| t.clip.to_string());
    if *last != current {
        match &current {
            Some(clip) => log::info!("track: {clip} ({} queued)", engine.queue_len()),
            None => log::info!("music idle"),
        }
        *last = current;
    }
}

fn stop_after_limit(limit: Res<RunLimit>, time: Res<Time<Real>>, mut exit: EventWriter<AppExit>) {
    if let Some(seconds) = limit.0 {
        if time.elapsed_secs() >= seconds {
            exit.send(AppExit::Success);
        }
    }
}
