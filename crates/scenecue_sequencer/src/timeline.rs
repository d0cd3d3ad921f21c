// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline document: scenes, transitions and audio clips.

use crate::error::Result;
use crate::evaluator::find_active_scene;
use crate::ids::{ClipId, KeyframeId, SceneId, SequenceId};
use crate::scene::{AudioClip, Scene, Transition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Root aggregate evaluated by the playback engine.
///
/// The engine only ever reads a timeline; edits happen elsewhere and a fresh
/// snapshot is handed over for every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Scenes, in authoring order
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Scene crossfades
    #[serde(default)]
    pub transitions: Vec<Transition>,
    /// Audio clips
    #[serde(default)]
    pub audio_clips: Vec<AudioClip>,
}

/// A problem found by [`Timeline::validate`]
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineIssue {
    /// Scene with a negative or non-finite duration
    InvalidSceneDuration(SceneId),
    /// Sequence with a negative or non-finite duration
    InvalidSequenceDuration(SequenceId),
    /// Keyframe placed outside its sequence's time span
    KeyframeOutsideSequence {
        /// Owning sequence
        sequence: SequenceId,
        /// Offending keyframe
        keyframe: KeyframeId,
    },
    /// Keyframe whose easing cannot be solved
    UnsolvableEasing(KeyframeId),
    /// Clip with a negative or non-finite duration
    InvalidClipDuration(ClipId),
    /// Two clips sharing one id
    DuplicateClipId(ClipId),
}

fn valid_length(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a timeline from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the timeline to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total length: the latest end over all scenes and clips
    pub fn duration(&self) -> f64 {
        let scene_end = self.scenes.iter().map(Scene::end_time);
        let clip_end = self.audio_clips.iter().map(AudioClip::end_time);
        scene_end.chain(clip_end).fold(0.0, f64::max)
    }

    /// The scene under the playhead at `time`. This is the one rule every
    /// caller uses to decide which scene is active.
    pub fn active_scene_at(&self, time: f64) -> Option<&Scene> {
        find_active_scene(&self.scenes, time)
    }

    /// Get a scene
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Report authoring problems. Evaluation tolerates all of them.
    pub fn validate(&self) -> Vec<TimelineIssue> {
        let mut issues = Vec::new();

        for scene in &self.scenes {
            if !valid_length(scene.duration) {
                issues.push(TimelineIssue::InvalidSceneDuration(scene.id));
            }
            for sequence in &scene.sequences {
                if !valid_length(sequence.duration) {
                    issues.push(TimelineIssue::InvalidSequenceDuration(sequence.id));
                }
                for keyframe in &sequence.keyframes {
                    if keyframe.time < 0.0 || keyframe.time > sequence.duration {
                        issues.push(TimelineIssue::KeyframeOutsideSequence {
                            sequence: sequence.id,
                            keyframe: keyframe.id,
                        });
                    }
                    if !keyframe.easing.is_solvable() {
                        issues.push(TimelineIssue::UnsolvableEasing(keyframe.id));
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for clip in &self.audio_clips {
            if !valid_length(clip.duration) {
                issues.push(TimelineIssue::InvalidClipDuration(clip.id));
            }
            if !seen.insert(clip.id) {
                issues.push(TimelineIssue::DuplicateClipId(clip.id));
            }
        }

        issues
    }
}
