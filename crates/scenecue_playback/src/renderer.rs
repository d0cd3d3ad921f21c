// SPDX-License-Identifier: MIT OR Apache-2.0
//! The rendering collaborator the playback engine drives.

use crate::error::RenderError;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use scenecue_sequencer::ConfigTree;
use std::sync::Arc;

/// A rendering surface fed with resolved parameter trees.
///
/// The renderer is created and disposed by its owner; the playback engine
/// only borrows it through a [`SharedRenderer`].
pub trait Renderer: Send {
    /// Prepare GPU resources
    fn init(&mut self) -> Result<(), RenderError>;

    /// Swap the active visual program. Heavy; completes asynchronously.
    fn load_config(&mut self, config: &ConfigTree) -> BoxFuture<'static, Result<(), RenderError>>;

    /// Merge parameter changes into the active program. Cheap.
    fn update_config(&mut self, config: &ConfigTree);

    /// Draw one frame at `time` seconds
    fn render(&mut self, time: f64);

    /// Resize the surface
    fn resize(&mut self, width: u32, height: u32);

    /// Whether [`Renderer::init`] has completed
    fn is_initialized(&self) -> bool;

    /// Whether [`Renderer::dispose`] has run
    fn is_disposed(&self) -> bool;

    /// Release resources
    fn dispose(&mut self);

    /// Whether the renderer can take work right now
    fn is_ready(&self) -> bool {
        self.is_initialized() && !self.is_disposed()
    }
}

/// Renderer handle shared between the engine and its owner
pub type SharedRenderer = Arc<Mutex<dyn Renderer>>;

/// Wrap a renderer into a [`SharedRenderer`]
pub fn share_renderer(renderer: impl Renderer + 'static) -> SharedRenderer {
    Arc::new(Mutex::new(renderer))
}
