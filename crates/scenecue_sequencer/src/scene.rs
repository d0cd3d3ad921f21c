// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenes and the timeline-level entities around them.

use crate::easing::Easing;
use crate::ids::{ClipId, IdGenerator, SceneId, TransitionId};
use crate::sequence::Sequence;
use crate::tree::ConfigTree;
use serde::{Deserialize, Serialize};

/// A time-boxed block owning a full parameter tree and its animation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Unique scene ID
    pub id: SceneId,
    /// Scene name
    pub name: String,
    /// Absolute start, in seconds
    pub start_time: f64,
    /// Length in seconds
    pub duration: f64,
    /// Authoring lane; not used for evaluation
    #[serde(default)]
    pub track_index: u32,
    /// Every parameter the renderer understands
    #[serde(default)]
    pub base_config: ConfigTree,
    /// Animation layers
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

impl Scene {
    /// Create a new scene with an empty parameter tree
    pub fn new(
        ids: &mut impl IdGenerator,
        name: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self {
            id: SceneId::generate(ids),
            name: name.into(),
            start_time,
            duration,
            track_index: 0,
            base_config: ConfigTree::new(),
            sequences: Vec::new(),
        }
    }

    /// Set the base parameter tree
    pub fn with_config(mut self, config: impl Into<ConfigTree>) -> Self {
        self.base_config = config.into();
        self
    }

    /// Set the authoring lane
    pub fn with_track(mut self, track_index: u32) -> Self {
        self.track_index = track_index;
        self
    }

    /// Add a sequence
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    /// Absolute end time (exclusive)
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether absolute `time` falls in `[start_time, end_time)`
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }
}

/// An audio clip placed on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioClip {
    /// Clip ID
    pub id: ClipId,
    /// Source identifier (path or URL) used as the buffer cache key
    pub source: String,
    /// Absolute start, in seconds
    pub start_time: f64,
    /// Playback length on the timeline; may be shorter than the source
    pub duration: f64,
    /// Offset into the source, in seconds
    #[serde(default)]
    pub trim_start: f64,
    /// Clip volume in [0, 1]
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Muted clips never sound
    #[serde(default)]
    pub muted: bool,
    /// Authoring lane
    #[serde(default)]
    pub track_index: u32,
}

fn default_volume() -> f32 {
    1.0
}

impl AudioClip {
    /// Create a new clip playing `source` from its beginning
    pub fn new(
        ids: &mut impl IdGenerator,
        source: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self {
            id: ClipId::generate(ids),
            source: source.into(),
            start_time,
            duration,
            trim_start: 0.0,
            volume: 1.0,
            muted: false,
            track_index: 0,
        }
    }

    /// Set the source offset
    pub fn with_trim_start(mut self, trim_start: f64) -> Self {
        self.trim_start = trim_start;
        self
    }

    /// Set the volume, clamped to [0, 1]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Set the muted flag
    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Absolute end time (exclusive)
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether the clip should be sounding at absolute `time`
    pub fn is_audible_at(&self, time: f64) -> bool {
        !self.muted && time >= self.start_time && time < self.end_time()
    }
}

/// Crossfade metadata between two scenes. Consumed by UI layers; the
/// evaluator ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Transition ID
    pub id: TransitionId,
    /// Outgoing scene
    pub from_scene: SceneId,
    /// Incoming scene
    pub to_scene: SceneId,
    /// Crossfade length in seconds
    pub duration: f64,
    /// Crossfade curve
    #[serde(default)]
    pub easing: Easing,
}

impl Transition {
    /// Create a linear crossfade
    pub fn new(ids: &mut impl IdGenerator, from_scene: SceneId, to_scene: SceneId, duration: f64) -> Self {
        Self {
            id: TransitionId::generate(ids),
            from_scene,
            to_scene,
            duration,
            easing: Easing::Linear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    #[test]
    fn test_scene_bounds() {
        let mut ids = SequentialIds::new();
        let scene = Scene::new(&mut ids, "intro", 2.0, 3.0);
        assert_eq!(scene.end_time(), 5.0);
        assert!(scene.contains(2.0));
        assert!(!scene.contains(5.0));
    }

    #[test]
    fn test_clip_audibility() {
        let mut ids = SequentialIds::new();
        let clip = AudioClip::new(&mut ids, "a.wav", 5.0, 10.0);
        assert!(!clip.is_audible_at(4.9));
        assert!(clip.is_audible_at(5.0));
        assert!(!clip.is_audible_at(15.0));
        assert!(!clip.with_muted(true).is_audible_at(6.0));
    }

    #[test]
    fn test_clip_volume_clamped() {
        let mut ids = SequentialIds::new();
        assert_eq!(AudioClip::new(&mut ids, "a.wav", 0.0, 1.0).with_volume(3.0).volume, 1.0);
    }

    #[test]
    fn test_clip_defaults_from_json() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "source": "music/loop.ogg",
            "startTime": 1.0,
            "duration": 4.0
        }"#;
        let clip: AudioClip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.volume, 1.0);
        assert_eq!(clip.trim_start, 0.0);
        assert!(!clip.muted);
    }
}
