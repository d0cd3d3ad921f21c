// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mixing graph and decoder backed by rodio.
//!
//! rodio has no node graph, so gain stages are bookkeeping: each source gets
//! its own `Sink` whose volume is the product of the gains along its route.
//! The `OutputStream` stays with the caller; only its handle is kept here.

use crate::audio::buffer::{AudioBuffer, AudioDecoder};
use crate::audio::graph::{MixGraph, NodeId};
use crate::error::{AudioError, Result};
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;

struct Voice {
    sink: Sink,
    destination: NodeId,
}

/// [`MixGraph`] playing through a rodio output stream
pub struct RodioGraph {
    handle: OutputStreamHandle,
    next_id: u64,
    analyser: NodeId,
    gains: HashMap<NodeId, f32>,
    routes: HashMap<NodeId, NodeId>,
    voices: HashMap<NodeId, Voice>,
}

impl RodioGraph {
    /// Create a graph on an open output stream
    pub fn new(handle: OutputStreamHandle) -> Self {
        let mut graph = Self {
            handle,
            next_id: 0,
            analyser: NodeId(0),
            gains: HashMap::new(),
            routes: HashMap::new(),
            voices: HashMap::new(),
        };
        graph.analyser = graph.allocate();
        graph
    }

    fn allocate(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    /// Product of gains from `node` down to the analyser. A route that never
    /// reaches the analyser is silent.
    fn effective_gain(&self, node: NodeId) -> f32 {
        let mut level = 1.0;
        let mut current = node;
        for _ in 0..=self.gains.len() {
            if current == self.analyser {
                return level;
            }
            level *= self.gains.get(&current).copied().unwrap_or(1.0);
            match self.routes.get(&current) {
                Some(next) => current = *next,
                None => return 0.0,
            }
        }
        0.0
    }

    fn refresh_volumes(&self) {
        for voice in self.voices.values() {
            voice.sink.set_volume(self.effective_gain(voice.destination));
        }
    }
}

fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

impl MixGraph for RodioGraph {
    fn create_gain(&mut self, gain: f32) -> NodeId {
        let id = self.allocate();
        self.gains.insert(id, gain);
        id
    }

    fn set_gain(&mut self, node: NodeId, gain: f32) {
        if let Some(level) = self.gains.get_mut(&node) {
            *level = gain;
            self.refresh_volumes();
        }
    }

    fn connect(&mut self, from: NodeId, to: NodeId) {
        self.routes.insert(from, to);
        self.refresh_volumes();
    }

    fn disconnect(&mut self, node: NodeId) {
        self.routes.remove(&node);
        if let Some(voice) = self.voices.remove(&node) {
            voice.sink.stop();
        }
        self.gains.remove(&node);
        self.refresh_volumes();
    }

    fn analyser(&self) -> NodeId {
        self.analyser
    }

    fn start_source(
        &mut self,
        buffer: &AudioBuffer,
        destination: NodeId,
        offset: f64,
        duration: f64,
    ) -> Result<NodeId> {
        let sink = Sink::try_new(&self.handle).map_err(|e| AudioError::Output(e.to_string()))?;
        let source = SamplesBuffer::new(buffer.channels, buffer.sample_rate, buffer.samples.to_vec())
            .skip_duration(seconds(offset))
            .take_duration(seconds(duration));
        sink.set_volume(self.effective_gain(destination));
        sink.append(source);

        let id = self.allocate();
        self.voices.insert(id, Voice { sink, destination });
        Ok(id)
    }

    fn stop_source(&mut self, source: NodeId) {
        if let Some(voice) = self.voices.remove(&source) {
            voice.sink.stop();
        }
    }
}

/// [`AudioDecoder`] for the formats rodio's decoder supports
#[derive(Debug, Clone, Copy, Default)]
pub struct RodioDecoder;

impl AudioDecoder for RodioDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer> {
        let decoder =
            Decoder::new(Cursor::new(bytes.to_vec())).map_err(|e| AudioError::Decode(e.to_string()))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();
        if samples.is_empty() {
            return Err(AudioError::Decode("no samples".to_string()));
        }
        Ok(AudioBuffer::new(sample_rate, channels, samples))
    }
}
