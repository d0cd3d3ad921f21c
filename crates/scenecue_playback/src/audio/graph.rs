// SPDX-License-Identifier: MIT OR Apache-2.0
//! The mixing graph the audio sync engine plays through.
//!
//! The graph itself belongs to the caller. The sync engine only creates,
//! connects and removes the nodes it needs: one master gain feeding the
//! caller's analysis node, and a gain plus a buffer source per sounding clip.

use crate::audio::buffer::AudioBuffer;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to a node inside a [`MixGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// A platform mixing graph
pub trait MixGraph: Send {
    /// Create a gain stage
    fn create_gain(&mut self, gain: f32) -> NodeId;

    /// Change a gain stage's level
    fn set_gain(&mut self, node: NodeId, gain: f32);

    /// Route `from` into `to`
    fn connect(&mut self, from: NodeId, to: NodeId);

    /// Remove every outgoing connection of `node`
    fn disconnect(&mut self, node: NodeId);

    /// The shared analysis node (metering), owned by the caller. Whatever
    /// feeds it reaches the output.
    fn analyser(&self) -> NodeId;

    /// Start playing `buffer` into `destination` from `offset` seconds for
    /// `duration` seconds
    fn start_source(
        &mut self,
        buffer: &AudioBuffer,
        destination: NodeId,
        offset: f64,
        duration: f64,
    ) -> Result<NodeId>;

    /// Stop a source started with [`MixGraph::start_source`]
    fn stop_source(&mut self, source: NodeId);
}

/// What a [`SilentGraph`] node is
#[derive(Debug, Clone, PartialEq)]
pub enum SilentNodeKind {
    /// The analysis node
    Analyser,
    /// A gain stage and its level
    Gain(f32),
    /// A buffer source
    Source {
        /// Start offset into the buffer, seconds
        offset: f64,
        /// Requested play length, seconds
        duration: f64,
        /// Whether the source is still playing
        playing: bool,
    },
}

#[derive(Debug, Clone)]
struct SilentNode {
    kind: SilentNodeKind,
    output: Option<NodeId>,
}

#[derive(Debug, Default)]
struct SilentState {
    next_id: u64,
    nodes: HashMap<NodeId, SilentNode>,
    started: u64,
}

impl SilentState {
    fn add(&mut self, kind: SilentNodeKind) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, SilentNode { kind, output: None });
        id
    }
}

/// A graph that tracks routing without producing sound.
///
/// Used for headless previews; clones share the same graph so the owner can
/// inspect what the engine did.
#[derive(Debug, Clone)]
pub struct SilentGraph {
    state: Arc<Mutex<SilentState>>,
    analyser: NodeId,
}

impl SilentGraph {
    /// Create a graph containing only the analysis node
    pub fn new() -> Self {
        let mut state = SilentState::default();
        let analyser = state.add(SilentNodeKind::Analyser);
        Self {
            state: Arc::new(Mutex::new(state)),
            analyser,
        }
    }

    /// Kind of a node, if it exists
    pub fn node_kind(&self, node: NodeId) -> Option<SilentNodeKind> {
        self.state.lock().nodes.get(&node).map(|n| n.kind.clone())
    }

    /// Where a node is routed
    pub fn output_of(&self, node: NodeId) -> Option<NodeId> {
        self.state.lock().nodes.get(&node).and_then(|n| n.output)
    }

    /// Sources currently playing, as `(node, offset, duration)`
    pub fn playing_sources(&self) -> Vec<(NodeId, f64, f64)> {
        let state = self.state.lock();
        let mut playing: Vec<_> = state
            .nodes
            .iter()
            .filter_map(|(id, node)| match node.kind {
                SilentNodeKind::Source { offset, duration, playing: true } => Some((*id, offset, duration)),
                _ => None,
            })
            .collect();
        playing.sort_by_key(|(id, _, _)| *id);
        playing
    }

    /// Total number of sources ever started
    pub fn started_count(&self) -> u64 {
        self.state.lock().started
    }

    /// Gain level of a gain node
    pub fn gain_of(&self, node: NodeId) -> Option<f32> {
        match self.node_kind(node)? {
            SilentNodeKind::Gain(gain) => Some(gain),
            _ => None,
        }
    }
}

impl Default for SilentGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MixGraph for SilentGraph {
    fn create_gain(&mut self, gain: f32) -> NodeId {
        self.state.lock().add(SilentNodeKind::Gain(gain))
    }

    fn set_gain(&mut self, node: NodeId, gain: f32) {
        if let Some(n) = self.state.lock().nodes.get_mut(&node) {
            if let SilentNodeKind::Gain(level) = &mut n.kind {
                *level = gain;
            }
        }
    }

    fn connect(&mut self, from: NodeId, to: NodeId) {
        if let Some(n) = self.state.lock().nodes.get_mut(&from) {
            n.output = Some(to);
        }
    }

    fn disconnect(&mut self, node: NodeId) {
        if let Some(n) = self.state.lock().nodes.get_mut(&node) {
            n.output = None;
        }
    }

    fn analyser(&self) -> NodeId {
        self.analyser
    }

    fn start_source(
        &mut self,
        _buffer: &AudioBuffer,
        destination: NodeId,
        offset: f64,
        duration: f64,
    ) -> Result<NodeId> {
        let mut state = self.state.lock();
        state.started += 1;
        let id = state.add(SilentNodeKind::Source { offset, duration, playing: true });
        if let Some(n) = state.nodes.get_mut(&id) {
            n.output = Some(destination);
        }
        Ok(id)
    }

    fn stop_source(&mut self, source: NodeId) {
        if let Some(n) = self.state.lock().nodes.get_mut(&source) {
            if let SilentNodeKind::Source { playing, .. } = &mut n.kind {
                *playing = false;
            }
        }
    }
}
