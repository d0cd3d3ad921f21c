// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame scheduling and background task spawning.
//!
//! The engine never runs its own loop. It asks the host for one frame at a
//! time and the host calls [`crate::PlaybackEngine::tick`] when that frame
//! fires; with no request outstanding the engine does no work at all.

use futures::executor::LocalSpawner;
use futures::future::BoxFuture;
use futures::task::SpawnExt;
use parking_lot::Mutex;
use std::sync::Arc;

/// Token for one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// The host's per-frame callback mechanism
pub trait FrameScheduler {
    /// Ask for one frame callback
    fn request_frame(&mut self) -> FrameRequest;

    /// Withdraw a request that has not fired yet
    fn cancel_frame(&mut self, request: FrameRequest);
}

#[derive(Debug, Default)]
struct ManualState {
    next_id: u64,
    pending: Option<FrameRequest>,
    requested: u64,
    cancelled: u64,
}

/// Frame scheduler driven by hand.
///
/// Clones share state: give one to the engine, keep one in the host loop and
/// call [`ManualFrameScheduler::take_pending`] to fire the frame.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualFrameScheduler {
    /// Create a scheduler with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, if any
    pub fn pending(&self) -> Option<FrameRequest> {
        self.state.lock().pending
    }

    /// Whether a frame is outstanding
    pub fn has_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// Consume the outstanding request; the caller then ticks the engine
    pub fn take_pending(&self) -> Option<FrameRequest> {
        self.state.lock().pending.take()
    }

    /// Total frames ever requested
    pub fn requested_count(&self) -> u64 {
        self.state.lock().requested
    }

    /// Total requests cancelled before firing
    pub fn cancelled_count(&self) -> u64 {
        self.state.lock().cancelled
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        let mut state = self.state.lock();
        state.next_id += 1;
        state.requested += 1;
        let request = FrameRequest(state.next_id);
        state.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut state = self.state.lock();
        if state.pending == Some(request) {
            state.pending = None;
            state.cancelled += 1;
        }
    }
}

/// Runs fire-and-forget background work such as renderer reloads
pub trait TaskSpawner {
    /// Start `task` without waiting for it
    fn spawn_task(&self, task: BoxFuture<'static, ()>);
}

impl TaskSpawner for tokio::runtime::Handle {
    fn spawn_task(&self, task: BoxFuture<'static, ()>) {
        drop(self.spawn(task));
    }
}

impl TaskSpawner for LocalSpawner {
    fn spawn_task(&self, task: BoxFuture<'static, ()>) {
        if let Err(e) = self.spawn(task) {
            tracing::warn!("Failed to spawn background task: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_and_cancel() {
        let mut scheduler = ManualFrameScheduler::new();
        let host = scheduler.clone();

        let request = scheduler.request_frame();
        assert_eq!(host.pending(), Some(request));

        scheduler.cancel_frame(request);
        assert!(!host.has_pending());
        assert_eq!(host.cancelled_count(), 1);
    }

    #[test]
    fn test_stale_cancel_is_ignored() {
        let mut scheduler = ManualFrameScheduler::new();
        let old = scheduler.request_frame();
        let _ = scheduler.take_pending();
        let new = scheduler.request_frame();
        scheduler.cancel_frame(old);
        assert_eq!(scheduler.pending(), Some(new));
    }
}
