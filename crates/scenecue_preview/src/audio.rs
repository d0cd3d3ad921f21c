// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio output for the preview.
//!
//! With the "audio" feature the sync engine plays through the default
//! output device. Without it, or when no device can be opened, clips are
//! tracked by a silent graph so playback logic still runs.

use futures::future::join_all;
use scenecue_playback::{AudioSyncEngine, SharedAudioEngine};
use scenecue_sequencer::Timeline;
use std::path::{Path, PathBuf};

/// The audio engine plus whatever keeps the device open
pub struct AudioOutput {
    /// Engine handed to the playback engine
    pub engine: SharedAudioEngine,
    #[cfg(feature = "audio")]
    _stream: Option<rodio::OutputStream>,
}

#[cfg(feature = "audio")]
mod backend {
    use super::*;
    use scenecue_playback::audio::{RodioDecoder, RodioGraph};
    use scenecue_playback::SilentGraph;
    use std::sync::Arc;

    /// Open the default output device, falling back to silence
    pub fn open_output() -> AudioOutput {
        match rodio::OutputStream::try_default() {
            Ok((stream, handle)) => {
                tracing::info!("Audio output opened");
                let graph = RodioGraph::new(handle);
                AudioOutput {
                    engine: AudioSyncEngine::new(Box::new(graph), Arc::new(RodioDecoder)).into_shared(),
                    _stream: Some(stream),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to open audio output: {}. Clips will be silent", e);
                AudioOutput {
                    engine: AudioSyncEngine::new(Box::new(SilentGraph::new()), Arc::new(RodioDecoder))
                        .into_shared(),
                    _stream: None,
                }
            }
        }
    }
}

#[cfg(not(feature = "audio"))]
mod backend {
    use super::*;
    use scenecue_playback::{AudioBuffer, AudioDecoder, AudioError, SilentGraph};
    use std::sync::Arc;

    /// Decoder used when no codec support is compiled in
    struct NoDecoder;

    impl AudioDecoder for NoDecoder {
        fn decode(&self, _bytes: &[u8]) -> Result<AudioBuffer, AudioError> {
            Err(AudioError::Unsupported(
                "built without the \"audio\" feature".to_string(),
            ))
        }
    }

    /// Audio stub: a silent graph that never receives decoded buffers
    pub fn open_output() -> AudioOutput {
        tracing::warn!("Audio feature not enabled. Audio clips will not play");
        AudioOutput {
            engine: AudioSyncEngine::new(Box::new(SilentGraph::new()), Arc::new(NoDecoder)).into_shared(),
        }
    }
}

pub use backend::open_output;

/// Resolve a clip source against the timeline's directory
pub fn resolve_source(base_dir: &Path, source: &str) -> PathBuf {
    let path = Path::new(source);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Distinct clip sources in first-use order
pub fn clip_sources(timeline: &Timeline) -> Vec<&str> {
    let mut sources: Vec<&str> = Vec::new();
    for clip in &timeline.audio_clips {
        if !sources.contains(&clip.source.as_str()) {
            sources.push(&clip.source);
        }
    }
    sources
}

/// Read and decode every clip source before playback starts.
///
/// Failures are logged; those clips stay silent. Returns the number of
/// sources that decoded.
pub async fn preload_clips(engine: &SharedAudioEngine, timeline: &Timeline, base_dir: &Path) -> usize {
    let loads = clip_sources(timeline).into_iter().map(|source| {
        let path = resolve_source(base_dir, source);
        let engine = SharedAudioEngine::clone(engine);
        let source = source.to_string();
        async move {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Failed to read audio {:?}: {}", path, e);
                    return false;
                }
            };
            let decode = engine.lock().load_clip_from_buffer(&source, bytes);
            match decode.await {
                Ok(buffer) => {
                    tracing::info!("Loaded {} ({:.2}s)", source, buffer.duration());
                    true
                }
                Err(e) => {
                    tracing::warn!("Failed to load audio {}: {}", source, e);
                    false
                }
            }
        }
    });
    join_all(loads).await.into_iter().filter(|ok| *ok).count()
}
