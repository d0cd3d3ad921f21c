// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decoded audio buffers and the per-source decode cache.

use crate::error::{AudioError, Result};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};

/// Interleaved PCM samples ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Frames per second
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Interleaved samples in [-1, 1]
    pub samples: Arc<[f32]>,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples
    pub fn new(sample_rate: u32, channels: u16, samples: impl Into<Arc<[f32]>>) -> Self {
        Self {
            sample_rate,
            channels,
            samples: samples.into(),
        }
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / usize::from(self.channels)
        }
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / f64::from(self.sample_rate)
        }
    }
}

/// Turns encoded bytes into an [`AudioBuffer`]
pub trait AudioDecoder: Send + Sync {
    /// Decode a complete encoded file
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer>;
}

type SharedDecode = Shared<BoxFuture<'static, Result<Arc<AudioBuffer>>>>;

/// Cache of decoded buffers keyed by source identifier.
///
/// Each source is decoded at most once while the cache lives. Concurrent
/// loads of a source that is still decoding all wait on the same decode.
/// Failed decodes are not cached, so a later load retries.
pub struct BufferCache {
    decoder: Arc<dyn AudioDecoder>,
    ready: RwLock<HashMap<String, Arc<AudioBuffer>>>,
    in_flight: Mutex<HashMap<String, SharedDecode>>,
}

impl BufferCache {
    /// Create an empty cache
    pub fn new(decoder: Arc<dyn AudioDecoder>) -> Arc<Self> {
        Arc::new(Self {
            decoder,
            ready: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Get an already decoded buffer without waiting
    pub fn get(&self, source: &str) -> Option<Arc<AudioBuffer>> {
        self.ready.read().get(source).cloned()
    }

    /// Whether a decoded buffer is available for `source`
    pub fn contains(&self, source: &str) -> bool {
        self.ready.read().contains_key(source)
    }

    /// Whether a decode for `source` is still running
    pub fn is_loading(&self, source: &str) -> bool {
        self.in_flight.lock().contains_key(source)
    }

    /// Number of decoded buffers
    pub fn len(&self) -> usize {
        self.ready.read().len()
    }

    /// Whether no buffers are decoded
    pub fn is_empty(&self) -> bool {
        self.ready.read().is_empty()
    }

    /// Drop every decoded buffer
    pub fn clear(&self) {
        self.ready.write().clear();
        self.in_flight.lock().clear();
    }

    /// Load `source` from the filesystem.
    ///
    /// The returned future reads through `tokio::fs` and must be polled
    /// inside a tokio runtime.
    pub fn load_file(self: &Arc<Self>, source: &str) -> BoxFuture<'static, Result<Arc<AudioBuffer>>> {
        let path = source.to_owned();
        self.load_with(source, async move {
            tokio::fs::read(&path)
                .await
                .map_err(|e| AudioError::Io(format!("{path}: {e}")))
        })
    }

    /// Decode caller-supplied bytes for `source`
    pub fn load_bytes(
        self: &Arc<Self>,
        source: &str,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, Result<Arc<AudioBuffer>>> {
        self.load_with(source, future::ready(Ok(bytes)))
    }

    /// Load `source`, fetching its bytes with `fetch` only if no decoded
    /// buffer or running decode exists for it.
    pub fn load_with<F>(self: &Arc<Self>, source: &str, fetch: F) -> BoxFuture<'static, Result<Arc<AudioBuffer>>>
    where
        F: Future<Output = Result<Vec<u8>>> + Send + 'static,
    {
        if let Some(buffer) = self.get(source) {
            return future::ready(Ok(buffer)).boxed();
        }

        let decode = {
            let mut in_flight = self.in_flight.lock();
            in_flight
                .entry(source.to_owned())
                .or_insert_with(|| {
                    tracing::debug!("Decoding audio source {source}");
                    decode_task(Arc::downgrade(self), Arc::clone(&self.decoder), source.to_owned(), fetch)
                })
                .clone()
        };
        decode.boxed()
    }

    fn settle(&self, source: &str, result: &Result<Arc<AudioBuffer>>) {
        self.in_flight.lock().remove(source);
        if let Ok(buffer) = result {
            self.ready.write().insert(source.to_owned(), Arc::clone(buffer));
        }
    }
}

fn decode_task<F>(
    cache: Weak<BufferCache>,
    decoder: Arc<dyn AudioDecoder>,
    source: String,
    fetch: F,
) -> SharedDecode
where
    F: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    async move {
        let result = match fetch.await {
            Ok(bytes) => decoder.decode(&bytes).map(Arc::new),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::warn!("Audio source {source} failed to load: {e}");
        }
        if let Some(cache) = cache.upgrade() {
            cache.settle(&source, &result);
        }
        result
    }
    .boxed()
    .shared()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Treats every byte as one mono sample
    struct CountingDecoder {
        calls: AtomicUsize,
    }

    impl AudioDecoder for CountingDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if bytes.is_empty() {
                return Err(AudioError::Decode("empty".to_string()));
            }
            let samples: Vec<f32> = bytes.iter().map(|b| f32::from(*b) / 255.0).collect();
            Ok(AudioBuffer::new(4, 1, samples))
        }
    }

    fn cache() -> (Arc<BufferCache>, Arc<CountingDecoder>) {
        let decoder = Arc::new(CountingDecoder { calls: AtomicUsize::new(0) });
        (BufferCache::new(decoder.clone()), decoder)
    }

    #[test]
    fn test_buffer_duration() {
        let buffer = AudioBuffer::new(48_000, 2, vec![0.0; 96_000]);
        assert_eq!(buffer.frames(), 48_000);
        assert!((buffer.duration() - 1.0).abs() < 1e-12);
        assert_eq!(AudioBuffer::new(0, 0, Vec::new()).duration(), 0.0);
    }

    #[test]
    fn test_decodes_once_per_source() {
        let (cache, decoder) = cache();
        let first = block_on(cache.load_bytes("a.wav", vec![1, 2, 3, 4])).unwrap();
        let second = block_on(cache.load_bytes("a.wav", vec![9, 9])).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("a.wav"));
    }

    #[test]
    fn test_concurrent_loads_share_one_decode() {
        let (cache, decoder) = cache();
        let a = cache.load_bytes("b.wav", vec![1, 2]);
        let b = cache.load_bytes("b.wav", vec![3, 4]);
        assert!(cache.is_loading("b.wav"));

        let (a, b) = block_on(future::join(a, b));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
        assert!(!cache.is_loading("b.wav"));
    }

    #[test]
    fn test_failed_decode_is_retried() {
        let (cache, decoder) = cache();
        let err = block_on(cache.load_bytes("bad.wav", Vec::new())).unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)));
        assert!(!cache.contains("bad.wav"));

        assert!(block_on(cache.load_bytes("bad.wav", vec![7])).is_ok());
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_file_reports_io_error() {
        let (cache, _) = cache();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = runtime
            .block_on(cache.load_file("/definitely/not/here.wav"))
            .unwrap_err();
        assert!(matches!(err, AudioError::Io(_)));
    }

    #[test]
    fn test_clear_drops_buffers() {
        let (cache, _) = cache();
        block_on(cache.load_bytes("a.wav", vec![1])).unwrap();
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
