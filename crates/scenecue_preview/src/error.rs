// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview errors.

use scenecue_playback::RenderError;
use scenecue_sequencer::SequencerError;
use std::path::PathBuf;
use thiserror::Error;

/// Anything that stops the preview from running
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Reading the timeline file failed
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// The timeline document is malformed
    #[error("Invalid timeline: {0}")]
    Timeline(#[from] SequencerError),
    /// The renderer could not start
    #[error("Renderer error: {0}")]
    Render(#[from] RenderError),
    /// The async runtime could not start
    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),
}
