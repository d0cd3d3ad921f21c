// SPDX-License-Identifier: MIT OR Apache-2.0
//! Multi-clip audio playback synchronized to the timeline clock.
//!
//! This module provides:
//! - Decoded buffer cache with coalesced loads
//! - Mixing graph abstraction and a silent headless graph
//! - The sync engine that starts clips mid-way at the right offset
//! - A rodio backend (when the "audio" feature is enabled)

pub mod buffer;
pub mod graph;
pub mod sync;

#[cfg(feature = "audio")]
pub mod rodio_backend;

pub use buffer::{AudioBuffer, AudioDecoder, BufferCache};
pub use graph::{MixGraph, NodeId, SilentGraph, SilentNodeKind};
pub use sync::{ActiveVoice, AudioSyncEngine, SharedAudioEngine, SyncReport};

#[cfg(feature = "audio")]
pub use rodio_backend::{RodioDecoder, RodioGraph};
