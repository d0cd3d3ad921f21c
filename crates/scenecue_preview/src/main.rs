// SPDX-License-Identifier: MIT OR Apache-2.0
//! `SceneCue` Preview - headless timeline playback
//!
//! Plays a timeline document in real time:
//! - Scene and sequence evaluation every frame
//! - Config pushes to a logging renderer (reload vs. merge)
//! - Audio clips synced to the clock (with the "audio" feature)
//!
//! ## Architecture
//!
//! The host loop owns a [`ManualFrameScheduler`]: whenever the playback
//! engine has a frame outstanding, the loop ticks it with the current
//! instant and sleeps until the next frame slot. Renderer reloads run on a
//! tokio runtime.

mod args;
mod audio;
mod error;
mod renderer;

use args::PreviewArgs;
use clap::Parser;
use error::PreviewError;
use parking_lot::Mutex;
use renderer::LogRenderer;
use scenecue_playback::{ManualFrameScheduler, PlaybackEngine, PlaybackSettings, Renderer};
use scenecue_sequencer::Timeline;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Host frame pacing (about 60 fps)
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn main() {
    // RUST_LOG overrides the default filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scenecue=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = PreviewArgs::parse();

    tracing::info!("Starting SceneCue preview v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        tracing::error!("Preview failed: {e}");
        std::process::exit(1);
    }
}

fn load_timeline(path: &Path) -> Result<Timeline, PreviewError> {
    let json = std::fs::read_to_string(path).map_err(|source| PreviewError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let timeline = Timeline::from_json_str(&json)?;
    for issue in timeline.validate() {
        tracing::warn!("Timeline issue: {:?}", issue);
    }
    Ok(timeline)
}

fn run(args: &PreviewArgs) -> Result<(), PreviewError> {
    let timeline = Arc::new(load_timeline(&args.timeline)?);
    tracing::info!(
        "Loaded {:?}: {} scenes, {} audio clips, {:.2}s",
        args.timeline,
        timeline.scenes.len(),
        timeline.audio_clips.len(),
        timeline.duration()
    );
    if timeline.duration() <= 0.0 {
        tracing::warn!("Timeline is empty, nothing to play");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(PreviewError::Runtime)?;

    let output = audio::open_output();
    let base_dir = args.timeline.parent().unwrap_or_else(|| Path::new("."));
    let loaded = runtime.block_on(audio::preload_clips(&output.engine, &timeline, base_dir));
    if !timeline.audio_clips.is_empty() {
        tracing::info!("{} audio sources ready", loaded);
    }

    let settings = PlaybackSettings {
        looping: args.looping,
        ..PlaybackSettings::default()
    };
    let renderer = Arc::new(Mutex::new(LogRenderer::new(settings.program_path.clone())));
    renderer.lock().init()?;

    let frames = ManualFrameScheduler::new();
    let mut engine = PlaybackEngine::new(settings, frames.clone(), runtime.handle().clone());

    let snapshot = Arc::clone(&timeline);
    engine.set_timeline_source(move || Arc::clone(&snapshot));
    engine.attach_renderer(renderer.clone());
    engine.attach_audio(Arc::clone(&output.engine));

    let names = Arc::clone(&timeline);
    engine.on_scene_changed(move |id| match id.and_then(|id| names.scene(id)) {
        Some(scene) => tracing::info!("Scene: {} at {:.2}s", scene.name, scene.start_time),
        None => tracing::info!("No scene under the playhead"),
    });
    engine.on_time_update(|time| tracing::debug!("t = {:.2}s", time));
    engine.on_playback_ended(|| tracing::info!("Reached the end of the timeline"));

    let limit = args.seconds.map(Duration::from_secs_f64);
    let started = Instant::now();
    engine.play();

    // The engine stops requesting frames when playback ends
    while frames.take_pending().is_some() {
        engine.tick(Instant::now());
        if limit.is_some_and(|limit| started.elapsed() >= limit) {
            tracing::info!("Run time limit reached at {:.2}s", engine.current_time());
            break;
        }
        std::thread::sleep(FRAME_INTERVAL);
    }

    engine.dispose();
    output.engine.lock().dispose();

    let stats = {
        let mut renderer = renderer.lock();
        renderer.dispose();
        renderer.stats()
    };
    tracing::info!(
        "Preview finished: {} frames, {} program loads, {} parameter updates",
        stats.frames,
        stats.loads,
        stats.updates
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenecue_sequencer::evaluate_timeline_at_time;

    const DEMO: &str = include_str!("../demos/neon.json");

    #[test]
    fn test_demo_timeline_is_valid() {
        let timeline = Timeline::from_json_str(DEMO).unwrap();
        assert!(timeline.validate().is_empty());
        assert_eq!(timeline.duration(), 16.0);
    }

    #[test]
    fn test_demo_evaluates() {
        let timeline = Timeline::from_json_str(DEMO).unwrap();

        let intro = evaluate_timeline_at_time(&timeline, 4.5).config.unwrap();
        assert_eq!(intro.category("shader").as_deref(), Some("plasma"));
        assert_eq!(intro.get_path("params.glow"), Some(&serde_json::Value::Bool(true)));

        let tunnel = evaluate_timeline_at_time(&timeline, 12.0).config.unwrap();
        assert_eq!(tunnel.category("shader").as_deref(), Some("tunnel"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_timeline(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, PreviewError::Read { .. }));
    }
}
