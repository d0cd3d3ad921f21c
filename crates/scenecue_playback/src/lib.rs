// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback synchronization for `SceneCue`.
//!
//! This crate keeps three things consistent with a single clock:
//! - The rendering surface (config pushes and per-frame renders)
//! - The audio mix (which clips sound, and from where)
//! - Observers (throttled time updates, scene changes, end of playback)
//!
//! ## Architecture
//!
//! The [`PlaybackEngine`] owns the clock and asks the host for frames through
//! a [`FrameScheduler`]. Each tick it evaluates a fresh timeline snapshot
//! with `scenecue_sequencer`, pushes the result to the [`Renderer`], and
//! hands the clip list to the [`AudioSyncEngine`]. Nothing runs while
//! paused.

pub mod audio;
pub mod engine;
pub mod error;
pub mod renderer;
pub mod scheduler;
pub mod settings;

pub use audio::{
    ActiveVoice, AudioBuffer, AudioDecoder, AudioSyncEngine, BufferCache, MixGraph, NodeId,
    SharedAudioEngine, SilentGraph, SyncReport,
};
pub use engine::{PlaybackEngine, PlaybackState, TimelineSource};
pub use error::{AudioError, RenderError};
pub use renderer::{share_renderer, Renderer, SharedRenderer};
pub use scheduler::{FrameRequest, FrameScheduler, ManualFrameScheduler, TaskSpawner};
pub use settings::PlaybackSettings;
