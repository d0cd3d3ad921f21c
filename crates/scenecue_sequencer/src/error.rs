// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the sequencer crate.

use thiserror::Error;

/// Sequencer errors
#[derive(Debug, Error)]
pub enum SequencerError {
    /// Timeline JSON could not be parsed or written
    #[error("Timeline JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cubic bezier control points outside the solvable range
    #[error("Invalid cubic bezier ({x1}, {y1}, {x2}, {y2}): x control points must lie in [0, 1]")]
    InvalidBezier {
        /// First control point x
        x1: f64,
        /// First control point y
        y1: f64,
        /// Second control point x
        x2: f64,
        /// Second control point y
        y2: f64,
    },
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, SequencerError>;
