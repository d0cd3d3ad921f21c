// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene timeline model and evaluation for `SceneCue`.
//!
//! This crate answers "what should be on screen at time T":
//! - Scenes holding a full parameter tree
//! - Layered sequences of keyframes addressed by dot-path
//! - Easing curves and value interpolation (numbers, hex colors, snaps)
//! - Active-scene selection and scene evaluation
//!
//! ## Architecture
//!
//! Everything here is pure. A [`Timeline`] is read, never mutated, and each
//! evaluation produces a fresh [`ConfigTree`]. Clocks, rendering and audio
//! live in `scenecue_playback`.

pub mod easing;
pub mod error;
pub mod evaluator;
pub mod ids;
pub mod keyframe;
pub mod scene;
pub mod sequence;
pub mod timeline;
pub mod tree;

pub use easing::{apply_easing, Easing};
pub use error::{Result, SequencerError};
pub use evaluator::{evaluate_scene, evaluate_timeline_at_time, find_active_scene, TimelineEvaluation};
pub use ids::{ClipId, IdGenerator, KeyframeId, RandomIds, SceneId, SequenceId, SequentialIds, TransitionId};
pub use keyframe::{evaluate_keyframes, interpolate_value, Keyframe, ParamValue};
pub use scene::{AudioClip, Scene, Transition};
pub use sequence::Sequence;
pub use timeline::{Timeline, TimelineIssue};
pub use tree::ConfigTree;
