// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for playback and audio.

use thiserror::Error;

/// Errors reported by a rendering collaborator
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The renderer has not been initialized yet
    #[error("Renderer not initialized")]
    NotInitialized,
    /// The renderer was disposed
    #[error("Renderer disposed")]
    Disposed,
    /// A full config reload failed (shader compile, asset load, ...)
    #[error("Config reload failed: {0}")]
    Reload(String),
}

/// Errors from audio loading and playback.
///
/// Payloads are strings so results can be shared between everyone waiting
/// on the same decode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// Reading the source failed
    #[error("IO error: {0}")]
    Io(String),
    /// The bytes could not be decoded
    #[error("Failed to decode audio: {0}")]
    Decode(String),
    /// No decoder for this kind of source
    #[error("Unsupported audio source: {0}")]
    Unsupported(String),
    /// The output device refused a new voice
    #[error("Audio output error: {0}")]
    Output(String),
    /// The audio engine was disposed
    #[error("Audio engine disposed")]
    Disposed,
}

/// Result type for audio operations
pub type Result<T> = std::result::Result<T, AudioError>;
