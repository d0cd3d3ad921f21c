// SPDX-License-Identifier: MIT OR Apache-2.0
//! A renderer that draws nothing and logs what it would draw.

use futures::future::{self, BoxFuture, FutureExt};
use scenecue_playback::{RenderError, Renderer};
use scenecue_sequencer::ConfigTree;

/// Frames between periodic progress lines
const LOG_EVERY_FRAMES: u64 = 120;

/// Counters collected while previewing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames rendered
    pub frames: u64,
    /// Full program loads
    pub loads: u64,
    /// In-place parameter merges
    pub updates: u64,
}

/// Headless [`Renderer`] that reports config pushes through tracing
#[derive(Debug)]
pub struct LogRenderer {
    program_path: String,
    initialized: bool,
    disposed: bool,
    size: (u32, u32),
    stats: RenderStats,
}

impl LogRenderer {
    /// Create a renderer reading the program name at `program_path`
    pub fn new(program_path: impl Into<String>) -> Self {
        Self {
            program_path: program_path.into(),
            initialized: false,
            disposed: false,
            size: (1280, 720),
            stats: RenderStats::default(),
        }
    }

    /// Counters so far
    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl Renderer for LogRenderer {
    fn init(&mut self) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.initialized = true;
        tracing::info!("Log renderer ready at {}x{}", self.size.0, self.size.1);
        Ok(())
    }

    fn load_config(&mut self, config: &ConfigTree) -> BoxFuture<'static, Result<(), RenderError>> {
        if !self.initialized {
            return future::ready(Err(RenderError::NotInitialized)).boxed();
        }
        self.stats.loads += 1;
        let program = config.category(&self.program_path);
        tracing::info!(
            "Loading program {}",
            program.as_deref().unwrap_or("<none>")
        );
        tracing::trace!("Config: {}", config.as_value());
        future::ready(Ok(())).boxed()
    }

    fn update_config(&mut self, config: &ConfigTree) {
        self.stats.updates += 1;
        tracing::trace!("Update: {}", config.as_value());
    }

    fn render(&mut self, time: f64) {
        self.stats.frames += 1;
        if self.stats.frames % LOG_EVERY_FRAMES == 0 {
            tracing::debug!(
                "Rendered {} frames (t = {:.2}s, {} loads, {} updates)",
                self.stats.frames,
                time,
                self.stats.loads,
                self.stats.updates
            );
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        tracing::debug!("Resized to {}x{}", width, height);
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            tracing::debug!("Log renderer disposed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_counts_pushes_and_frames() {
        let mut renderer = LogRenderer::new("shader");
        renderer.init().unwrap();
        let config = ConfigTree::new();
        block_on(renderer.load_config(&config)).unwrap();
        renderer.update_config(&config);
        renderer.render(0.0);
        renderer.render(0.016);

        assert_eq!(
            renderer.stats(),
            RenderStats {
                frames: 2,
                loads: 1,
                updates: 1,
            }
        );
    }

    #[test]
    fn test_load_before_init_fails() {
        let mut renderer = LogRenderer::new("shader");
        let result = block_on(renderer.load_config(&ConfigTree::new()));
        assert!(matches!(result, Err(RenderError::NotInitialized)));
        assert!(!renderer.is_ready());
    }

    #[test]
    fn test_dispose() {
        let mut renderer = LogRenderer::new("shader");
        renderer.init().unwrap();
        renderer.dispose();
        assert!(!renderer.is_ready());
        assert!(matches!(renderer.init(), Err(RenderError::Disposed)));
    }
}
