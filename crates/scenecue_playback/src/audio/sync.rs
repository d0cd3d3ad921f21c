// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keeps the set of sounding clips in step with the playback clock.

use crate::audio::buffer::{AudioBuffer, AudioDecoder, BufferCache};
use crate::audio::graph::{MixGraph, NodeId};
use crate::error::{AudioError, Result};
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use parking_lot::Mutex;
use scenecue_sequencer::{AudioClip, ClipId};
use std::collections::HashSet;
use std::sync::Arc;

/// Audio engine shared between the playback engine and whoever loads clips
pub type SharedAudioEngine = Arc<Mutex<AudioSyncEngine>>;

/// A clip that is currently sounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveVoice {
    /// Buffer source node
    pub source: NodeId,
    /// Per-clip gain node
    pub gain: NodeId,
    /// Where in the buffer playback began, seconds
    pub buffer_offset: f64,
    /// How long the voice was scheduled to play, seconds
    pub remaining: f64,
}

/// What one [`AudioSyncEngine::sync_to_time`] call changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Clips that started sounding
    pub started: Vec<ClipId>,
    /// Clips that were stopped
    pub stopped: Vec<ClipId>,
    /// Clips that should sound but have no decoded buffer yet
    pub waiting: Vec<ClipId>,
}

impl SyncReport {
    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty() && self.waiting.is_empty()
    }
}

/// Starts and stops clip voices so that exactly the clips under the
/// playhead are sounding.
///
/// Topology: clip source -> clip gain -> master gain -> analyser -> output.
pub struct AudioSyncEngine {
    graph: Box<dyn MixGraph>,
    cache: Arc<BufferCache>,
    master: NodeId,
    master_volume: f32,
    active: IndexMap<ClipId, ActiveVoice>,
    disposed: bool,
}

impl AudioSyncEngine {
    /// Create an engine playing through `graph`
    pub fn new(mut graph: Box<dyn MixGraph>, decoder: Arc<dyn AudioDecoder>) -> Self {
        let master = graph.create_gain(1.0);
        let analyser = graph.analyser();
        graph.connect(master, analyser);
        tracing::info!("Audio sync engine initialized");

        Self {
            graph,
            cache: BufferCache::new(decoder),
            master,
            master_volume: 1.0,
            active: IndexMap::new(),
            disposed: false,
        }
    }

    /// Wrap into the shared handle the playback engine expects
    pub fn into_shared(self) -> SharedAudioEngine {
        Arc::new(Mutex::new(self))
    }

    /// The buffer cache. Loading through it does not need the engine lock.
    pub fn buffer_cache(&self) -> Arc<BufferCache> {
        Arc::clone(&self.cache)
    }

    /// Load and decode a clip source from the filesystem (cached per source).
    ///
    /// The future must be polled inside a tokio runtime.
    pub fn load_clip_buffer(&self, source: &str) -> BoxFuture<'static, Result<Arc<AudioBuffer>>> {
        if self.disposed {
            return future::ready(Err(AudioError::Disposed)).boxed();
        }
        self.cache.load_file(source)
    }

    /// Decode caller-supplied bytes for a clip source (cached per source)
    pub fn load_clip_from_buffer(
        &self,
        source: &str,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, Result<Arc<AudioBuffer>>> {
        if self.disposed {
            return future::ready(Err(AudioError::Disposed)).boxed();
        }
        self.cache.load_bytes(source, bytes)
    }

    /// Bring the sounding set in line with `time`.
    ///
    /// A clip should sound when it is unmuted and `start <= time < end`.
    /// Missing clips start at the matching offset into their buffer and are
    /// scheduled to end with the clip; clips without a decoded buffer are
    /// skipped and retried on the next call. Clips that should no longer
    /// sound are stopped.
    pub fn sync_to_time(&mut self, clips: &[AudioClip], time: f64) -> SyncReport {
        let mut report = SyncReport::default();
        if self.disposed {
            return report;
        }

        let mut should_sound = HashSet::new();
        for clip in clips.iter().filter(|c| c.is_audible_at(time)) {
            if !should_sound.insert(clip.id) || self.active.contains_key(&clip.id) {
                continue;
            }

            let Some(buffer) = self.cache.get(&clip.source) else {
                tracing::trace!("Clip {} waiting for {}", clip.id, clip.source);
                report.waiting.push(clip.id);
                continue;
            };

            let elapsed = time - clip.start_time;
            let buffer_offset = clip.trim_start + elapsed;
            let remaining = clip.duration - elapsed;
            match self.start_voice(&buffer, clip.volume, buffer_offset, remaining) {
                Ok(voice) => {
                    tracing::debug!(
                        "Started clip {} at offset {:.3}s for {:.3}s",
                        clip.id,
                        buffer_offset,
                        remaining
                    );
                    self.active.insert(clip.id, voice);
                    report.started.push(clip.id);
                }
                Err(e) => tracing::warn!("Failed to start clip {}: {}", clip.id, e),
            }
        }

        let stale: Vec<ClipId> = self
            .active
            .keys()
            .filter(|id| !should_sound.contains(*id))
            .copied()
            .collect();
        for id in stale {
            self.stop_clip(id);
            report.stopped.push(id);
        }

        report
    }

    fn start_voice(
        &mut self,
        buffer: &AudioBuffer,
        volume: f32,
        buffer_offset: f64,
        remaining: f64,
    ) -> Result<ActiveVoice> {
        let gain = self.graph.create_gain(volume.clamp(0.0, 1.0));
        self.graph.connect(gain, self.master);
        match self.graph.start_source(buffer, gain, buffer_offset, remaining) {
            Ok(source) => Ok(ActiveVoice {
                source,
                gain,
                buffer_offset,
                remaining,
            }),
            Err(e) => {
                self.graph.disconnect(gain);
                Err(e)
            }
        }
    }

    /// Stop one clip if it is sounding
    pub fn stop_clip(&mut self, id: ClipId) -> bool {
        let Some(voice) = self.active.shift_remove(&id) else {
            return false;
        };
        self.graph.stop_source(voice.source);
        self.graph.disconnect(voice.source);
        self.graph.disconnect(voice.gain);
        true
    }

    /// Stop every sounding clip
    pub fn stop_all(&mut self) {
        let ids: Vec<ClipId> = self.active.keys().copied().collect();
        for id in ids {
            self.stop_clip(id);
        }
    }

    /// Set the master level, clamped to [0, 1]
    pub fn set_master_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.master_volume = volume;
        if !self.disposed {
            self.graph.set_gain(self.master, volume);
        }
    }

    /// Current master level
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// The master gain node
    pub fn master_node(&self) -> NodeId {
        self.master
    }

    /// Ids of the clips currently sounding
    pub fn active_clip_ids(&self) -> Vec<ClipId> {
        self.active.keys().copied().collect()
    }

    /// The live voice for a clip
    pub fn voice(&self, id: ClipId) -> Option<&ActiveVoice> {
        self.active.get(&id)
    }

    /// Whether [`AudioSyncEngine::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stop everything, detach the master gain and drop decoded buffers.
    /// Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop_all();
        self.graph.disconnect(self.master);
        self.cache.clear();
        self.disposed = true;
        tracing::info!("Audio sync engine disposed");
    }
}

impl Drop for AudioSyncEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
