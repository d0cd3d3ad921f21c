// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequences: layered, time-boxed animation tracks inside a scene.

use crate::ids::{IdGenerator, KeyframeId, SequenceId};
use crate::keyframe::{evaluate_keyframes, Keyframe, ParamValue};
use crate::tree::ConfigTree;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An animation layer scoped to one parameter category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    /// Unique sequence ID
    pub id: SequenceId,
    /// Sequence name
    pub name: String,
    /// Parameter category this layer animates (effects, overlay text, ...)
    #[serde(default)]
    pub category: String,
    /// Start, in seconds relative to the scene start
    pub start_offset: f64,
    /// Length in seconds
    pub duration: f64,
    /// Layer order; higher orders are applied later and win conflicts
    #[serde(default)]
    pub order: i32,
    /// Path overrides written before keyframes are evaluated
    #[serde(default)]
    pub base_config: IndexMap<String, ParamValue>,
    /// Keyframes, in declaration order
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl Sequence {
    /// Create a new empty sequence
    pub fn new(
        ids: &mut impl IdGenerator,
        name: impl Into<String>,
        start_offset: f64,
        duration: f64,
    ) -> Self {
        Self {
            id: SequenceId::generate(ids),
            name: name.into(),
            category: String::new(),
            start_offset,
            duration,
            order: 0,
            base_config: IndexMap::new(),
            keyframes: Vec::new(),
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the layer order
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Add a base override
    pub fn with_override(mut self, path: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.base_config.insert(path.into(), value.into());
        self
    }

    /// Add a keyframe
    pub fn with_keyframe(mut self, keyframe: Keyframe) -> Self {
        self.add_keyframe(keyframe);
        self
    }

    /// Add a keyframe. Declaration order is kept; it breaks ties between
    /// keyframes that share a time.
    pub fn add_keyframe(&mut self, keyframe: Keyframe) -> KeyframeId {
        let id = keyframe.id;
        self.keyframes.push(keyframe);
        id
    }

    /// Remove a keyframe
    pub fn remove_keyframe(&mut self, keyframe_id: KeyframeId) -> Option<Keyframe> {
        let idx = self.keyframes.iter().position(|k| k.id == keyframe_id)?;
        Some(self.keyframes.remove(idx))
    }

    /// End of the sequence, relative to the scene start
    pub fn end_offset(&self) -> f64 {
        self.start_offset + self.duration
    }

    /// Whether scene-local `time` falls in `[start_offset, start_offset + duration)`
    pub fn is_active_at(&self, scene_time: f64) -> bool {
        scene_time >= self.start_offset && scene_time < self.end_offset()
    }

    /// Keyframes grouped by path, in first-appearance order of the paths
    pub fn keyframes_by_path(&self) -> IndexMap<&str, Vec<&Keyframe>> {
        let mut groups: IndexMap<&str, Vec<&Keyframe>> = IndexMap::new();
        for keyframe in &self.keyframes {
            groups.entry(keyframe.path.as_str()).or_default().push(keyframe);
        }
        groups
    }

    /// Evaluate every animated path at sequence-local `time`
    pub fn evaluate_paths(&self, time: f64) -> IndexMap<&str, ParamValue> {
        self.keyframes_by_path()
            .into_iter()
            .filter_map(|(path, keys)| Some((path, evaluate_keyframes(&keys, time)?)))
            .collect()
    }

    /// Apply this layer to `tree` at scene-local `scene_time`.
    ///
    /// Returns `false` and leaves the tree untouched when the sequence is not
    /// active at that time.
    pub fn apply(&self, tree: &mut ConfigTree, scene_time: f64) -> bool {
        if !self.is_active_at(scene_time) {
            return false;
        }

        for (path, value) in &self.base_config {
            tree.set_param(path, value);
        }

        let sequence_time = scene_time - self.start_offset;
        for (path, value) in self.evaluate_paths(sequence_time) {
            tree.set_param(path, &value);
        }
        true
    }
}
