// SPDX-License-Identifier: MIT OR Apache-2.0
//! The playback engine: one authoritative clock driving renderer and audio.
//!
//! Per tick, in order: advance the clock, evaluate the latest timeline
//! snapshot, handle the end of the timeline, detect scene changes, push the
//! config, render, sync audio, notify observers (throttled), reschedule.

use crate::audio::SharedAudioEngine;
use crate::renderer::SharedRenderer;
use crate::scheduler::{FrameRequest, FrameScheduler, TaskSpawner};
use crate::settings::PlaybackSettings;
use futures::future::FutureExt;
use scenecue_sequencer::{evaluate_timeline_at_time, ConfigTree, SceneId, Timeline};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Pulls the latest immutable timeline snapshot
pub trait TimelineSource {
    /// The timeline as it is right now
    fn snapshot(&self) -> Arc<Timeline>;
}

impl<F> TimelineSource for F
where
    F: Fn() -> Arc<Timeline>,
{
    fn snapshot(&self) -> Arc<Timeline> {
        self()
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No frame loop running
    #[default]
    Paused,
    /// Exactly one frame request outstanding at all times
    Playing,
}

impl PlaybackState {
    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

/// Last visual program pushed to the renderer
#[derive(Debug, Clone, PartialEq)]
enum ProgramMarker {
    /// Nothing pushed since the last reset
    Unknown,
    /// The program identifier of the last push (a config may have none)
    Known(Option<String>),
}

#[derive(Default)]
struct Callbacks {
    time_update: Option<Box<dyn FnMut(f64)>>,
    playback_ended: Option<Box<dyn FnMut()>>,
    scene_changed: Option<Box<dyn FnMut(Option<SceneId>)>>,
}

/// Drives rendering and audio from a single playback clock.
///
/// The engine is single-threaded and cooperative: the host calls
/// [`PlaybackEngine::tick`] whenever the frame it requested fires. Heavy
/// renderer reloads run on the [`TaskSpawner`] and are tracked only by an
/// in-flight flag; pausing does not cancel a reload that already started.
pub struct PlaybackEngine {
    settings: PlaybackSettings,
    state: PlaybackState,
    current_time: f64,
    last_frame_at: Option<Instant>,
    last_time_update_at: Option<Instant>,
    pending_frame: Option<FrameRequest>,
    scheduler: Box<dyn FrameScheduler>,
    spawner: Box<dyn TaskSpawner>,
    timeline: Option<Box<dyn TimelineSource>>,
    renderer: Option<SharedRenderer>,
    audio: Option<SharedAudioEngine>,
    callbacks: Callbacks,
    active_scene: Option<SceneId>,
    last_pushed: Option<ConfigTree>,
    program: ProgramMarker,
    reload_in_flight: Arc<AtomicBool>,
    disposed: bool,
}

impl PlaybackEngine {
    /// Create a paused engine at time zero
    pub fn new(
        settings: PlaybackSettings,
        scheduler: impl FrameScheduler + 'static,
        spawner: impl TaskSpawner + 'static,
    ) -> Self {
        Self {
            settings,
            state: PlaybackState::Paused,
            current_time: 0.0,
            last_frame_at: None,
            last_time_update_at: None,
            pending_frame: None,
            scheduler: Box::new(scheduler),
            spawner: Box::new(spawner),
            timeline: None,
            renderer: None,
            audio: None,
            callbacks: Callbacks::default(),
            active_scene: None,
            last_pushed: None,
            program: ProgramMarker::Unknown,
            reload_in_flight: Arc::new(AtomicBool::new(false)),
            disposed: false,
        }
    }


    /// Set the timeline accessor
    pub fn set_timeline_source(&mut self, source: impl TimelineSource + 'static) {
        if !self.disposed {
            self.timeline = Some(Box::new(source));
        }
    }

    /// Attach the renderer. Pushed-config markers reset so the next frame
    /// loads the full config.
    pub fn attach_renderer(&mut self, renderer: SharedRenderer) {
        if self.disposed {
            return;
        }
        self.renderer = Some(renderer);
        self.last_pushed = None;
        self.program = ProgramMarker::Unknown;
    }

    /// Release the renderer reference
    pub fn detach_renderer(&mut self) -> Option<SharedRenderer> {
        self.last_pushed = None;
        self.program = ProgramMarker::Unknown;
        self.renderer.take()
    }

    /// Attach the audio engine
    pub fn attach_audio(&mut self, audio: SharedAudioEngine) {
        if !self.disposed {
            self.audio = Some(audio);
        }
    }

    /// Release the audio engine reference
    pub fn detach_audio(&mut self) -> Option<SharedAudioEngine> {
        self.audio.take()
    }

    /// Called with the playback time, at most once per
    /// [`PlaybackSettings::time_update_interval`] while playing and
    /// immediately on seek/stop
    pub fn on_time_update(&mut self, callback: impl FnMut(f64) + 'static) {
        if !self.disposed {
            self.callbacks.time_update = Some(Box::new(callback));
        }
    }

    /// Called when playback reaches the end without looping
    pub fn on_playback_ended(&mut self, callback: impl FnMut() + 'static) {
        if !self.disposed {
            self.callbacks.playback_ended = Some(Box::new(callback));
        }
    }

    /// Called when the scene under the playhead changes
    pub fn on_scene_changed(&mut self, callback: impl FnMut(Option<SceneId>) + 'static) {
        if !self.disposed {
            self.callbacks.scene_changed = Some(Box::new(callback));
        }
    }


    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Playback time in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// The scene seen on the last tick
    pub fn active_scene_id(&self) -> Option<SceneId> {
        self.active_scene
    }

    /// Current settings
    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// Enable or disable looping
    pub fn set_looping(&mut self, looping: bool) {
        self.settings.looping = looping;
    }

    /// Whether a heavy renderer reload is running
    pub fn is_reload_in_flight(&self) -> bool {
        self.reload_in_flight.load(Ordering::Acquire)
    }

    /// Whether [`PlaybackEngine::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }


    /// Start playing from the current time. No-op if already playing.
    pub fn play(&mut self) {
        if self.state.is_playing() || self.disposed {
            return;
        }
        self.state = PlaybackState::Playing;
        self.last_frame_at = None;
        tracing::debug!("Playback started at {:.3}s", self.current_time);
        self.schedule_frame();
    }

    /// Pause, keeping the current time. Sounding clips are silenced; they
    /// resume at the right offset on the next play.
    pub fn pause(&mut self) {
        let was_playing = self.state.is_playing();
        self.state = PlaybackState::Paused;
        self.cancel_frame();
        self.stop_audio();
        if was_playing {
            tracing::debug!("Playback paused at {:.3}s", self.current_time);
        }
    }

    /// Stop and rewind to zero
    pub fn stop(&mut self) {
        self.state = PlaybackState::Paused;
        self.cancel_frame();
        self.current_time = 0.0;
        self.last_frame_at = None;
        self.reset_scene_tracking();
        self.notify_time_update(0.0);
        self.stop_audio();
        tracing::debug!("Playback stopped");
    }

    /// Move the playhead. Negative times clamp to zero. Does not render; the
    /// next tick or [`PlaybackEngine::render_frame`] does.
    pub fn seek(&mut self, time: f64) {
        let time = if time.is_nan() { 0.0 } else { time.max(0.0) };
        self.current_time = time;
        self.last_frame_at = None;
        self.last_pushed = None;
        // Voices started before the jump play from the wrong offset
        self.stop_audio();
        tracing::debug!("Seek to {:.3}s", time);
        self.notify_time_update(time);
    }

    /// Forward a surface resize to the renderer
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(renderer) = &self.renderer {
            renderer.lock().resize(width, height);
        }
    }


    /// Run one frame. Call when the frame requested from the scheduler
    /// fires; `now` is the frame's wall-clock timestamp.
    pub fn tick(&mut self, now: Instant) {
        self.pending_frame = None;
        if !self.state.is_playing() || self.disposed {
            return;
        }

        let delta = self
            .last_frame_at
            .map_or(0.0, |previous| now.saturating_duration_since(previous).as_secs_f64());
        self.last_frame_at = Some(now);
        self.current_time += delta;

        let Some(timeline) = self.timeline.as_ref().map(|source| source.snapshot()) else {
            tracing::trace!("No timeline source attached; skipping frame");
            self.schedule_frame();
            return;
        };

        let evaluation = evaluate_timeline_at_time(&timeline, self.current_time);

        if self.current_time >= timeline.duration() {
            if self.settings.looping {
                tracing::debug!("Looping back to start");
                self.current_time = 0.0;
                self.reset_scene_tracking();
                // Voices from the end of the pass would block restarts at zero
                self.stop_audio();
            } else {
                self.state = PlaybackState::Paused;
                self.cancel_frame();
                tracing::debug!("Playback ended at {:.3}s", self.current_time);
                if let Some(callback) = self.callbacks.playback_ended.as_mut() {
                    callback();
                }
                return;
            }
        }

        let scene_id = evaluation.active_scene.map(|scene| scene.id);
        if scene_id != self.active_scene {
            tracing::debug!("Scene changed: {:?} -> {:?}", self.active_scene, scene_id);
            self.active_scene = scene_id;
            self.last_pushed = None;
            self.program = ProgramMarker::Unknown;
            if let Some(callback) = self.callbacks.scene_changed.as_mut() {
                callback(scene_id);
            }
        }

        if let Some(config) = &evaluation.config {
            self.push_config(config);
        }
        self.render_current();

        if self.state.is_playing() {
            if let Some(audio) = &self.audio {
                audio.lock().sync_to_time(&timeline.audio_clips, self.current_time);
            }
        }

        let due = self
            .last_time_update_at
            .map_or(true, |last| now.saturating_duration_since(last) >= self.settings.time_update_interval);
        if due {
            self.last_time_update_at = Some(now);
            self.notify_time_update(self.current_time);
        }

        tracing::trace!("Frame at {:.3}s", self.current_time);
        if self.state.is_playing() {
            self.schedule_frame();
        }
    }

    /// Evaluate the timeline at the current time and render once. For
    /// scrubbing and edits while paused; does nothing while playing.
    pub fn render_frame(&mut self) {
        if self.state.is_playing() || self.disposed {
            return;
        }
        let Some(timeline) = self.timeline.as_ref().map(|source| source.snapshot()) else {
            return;
        };
        let evaluation = evaluate_timeline_at_time(&timeline, self.current_time);
        if let Some(config) = &evaluation.config {
            self.push_config(config);
        }
        self.render_current();
    }

    /// Push an explicit config and render once, for editing a scene that is
    /// not under the playhead. Does nothing while playing.
    pub fn render_selected_config(&mut self, config: &ConfigTree) {
        if self.state.is_playing() || self.disposed {
            return;
        }
        self.push_config(config);
        self.render_current();
    }

    /// Stop the loop and release every collaborator and callback. The
    /// collaborators themselves stay alive; their owners dispose them.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.pause();
        self.timeline = None;
        self.renderer = None;
        self.audio = None;
        self.callbacks = Callbacks::default();
        self.reset_scene_tracking();
        self.disposed = true;
        tracing::info!("Playback engine disposed");
    }


    /// Send `config` to the renderer, choosing between a full reload (the
    /// program changed) and an in-place merge.
    fn push_config(&mut self, config: &ConfigTree) {
        let Some(renderer) = self.renderer.clone() else {
            return;
        };
        if self.last_pushed.as_ref() == Some(config) {
            return;
        }

        let mut renderer = renderer.lock();
        if !renderer.is_ready() {
            return;
        }

        let program = config.category(&self.settings.program_path);
        if self.program == ProgramMarker::Known(program.clone()) {
            renderer.update_config(config);
        } else {
            if self.reload_in_flight.load(Ordering::Acquire) {
                tracing::trace!("Reload in flight; keeping stale program this frame");
                return;
            }
            tracing::debug!("Loading program {:?}", program);
            self.reload_in_flight.store(true, Ordering::Release);
            let reload = renderer.load_config(config);
            let in_flight = Arc::clone(&self.reload_in_flight);
            self.spawner.spawn_task(
                async move {
                    if let Err(e) = reload.await {
                        tracing::warn!("Renderer reload failed: {}", e);
                    }
                    in_flight.store(false, Ordering::Release);
                }
                .boxed(),
            );
            self.program = ProgramMarker::Known(program);
        }
        self.last_pushed = Some(config.clone());
    }

    fn render_current(&mut self) {
        if let Some(renderer) = &self.renderer {
            let mut renderer = renderer.lock();
            if renderer.is_ready() {
                renderer.render(self.current_time);
            }
        }
    }

    fn stop_audio(&mut self) {
        if let Some(audio) = &self.audio {
            audio.lock().stop_all();
        }
    }

    fn reset_scene_tracking(&mut self) {
        self.active_scene = None;
        self.last_pushed = None;
        self.program = ProgramMarker::Unknown;
    }

    fn notify_time_update(&mut self, time: f64) {
        if let Some(callback) = self.callbacks.time_update.as_mut() {
            callback(time);
        }
    }

    fn schedule_frame(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(self.scheduler.request_frame());
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(request) = self.pending_frame.take() {
            self.scheduler.cancel_frame(request);
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.cancel_frame();
    }
}
