//! Frame scheduling and debouncing.
//!
//! [`FrameLoop`] is the cancelable handle for the per-frame animation
//! callback. The host asks it before stepping a frame; once cancelled (field
//! torn down, window hidden) it refuses every frame until a fresh loop is
//! started, so a cancelled loop performs no further state mutation.
//!
//! [`Debounce`] collapses a burst of events (window resizes) into the last
//! one, delivered after a quiet period.
//!
//! # Example
//!
//! ```ignore
//! use glyphdust::time::FrameLoop;
//!
//! let mut frames = FrameLoop::new();
//! frames.start();
//!
//! // In the redraw handler:
//! if frames.begin_frame().is_some() {
//!     field.step(&ctx, focused);
//!     window.request_redraw();
//! }
//! ```

use std::time::{Duration, Instant};

/// Cancelable per-frame scheduling state.
#[derive(Debug, Default)]
pub struct FrameLoop {
    /// Incremented every time a fresh loop starts.
    generation: u64,
    running: bool,
    /// Frames stepped by the current loop.
    frame_count: u64,
    /// Frames stepped across all loops.
    total_frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh loop. Returns `false` if one is already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.generation += 1;
        self.running = true;
        self.frame_count = 0;
        log::debug!("frame loop {} started", self.generation);
        true
    }

    /// Stop scheduling frames. Returns `false` if nothing was running.
    pub fn cancel(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        log::debug!(
            "frame loop {} cancelled after {} frames",
            self.generation,
            self.frame_count
        );
        true
    }

    /// Start or cancel to follow window visibility.
    pub fn follow_visibility(&mut self, visible: bool) {
        if visible {
            self.start();
        } else {
            self.cancel();
        }
    }

    /// Claim the next frame.
    ///
    /// Returns the frame index within the current loop, or `None` if the
    /// loop is cancelled and the frame must not touch any state.
    pub fn begin_frame(&mut self) -> Option<u64> {
        if !self.running {
            return None;
        }
        let index = self.frame_count;
        self.frame_count += 1;
        self.total_frames += 1;
        Some(index)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of loops started so far.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Frames stepped across all loops.
    #[inline]
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

/// Delivers the latest value once no new value arrived for `wait`.
#[derive(Debug)]
pub struct Debounce<T> {
    wait: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debounce<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    /// Record a new value, restarting the quiet period.
    pub fn trigger(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.wait, value));
    }

    /// Take the pending value if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    /// When the pending value becomes ready, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_loop_refuses_frames() {
        let mut frames = FrameLoop::new();
        assert_eq!(frames.begin_frame(), None);

        assert!(frames.start());
        assert_eq!(frames.begin_frame(), Some(0));
        assert_eq!(frames.begin_frame(), Some(1));

        assert!(frames.cancel());
        assert_eq!(frames.begin_frame(), None);
        assert!(!frames.cancel());
    }

    #[test]
    fn test_restart_is_a_fresh_loop() {
        let mut frames = FrameLoop::new();
        frames.start();
        frames.begin_frame();
        frames.begin_frame();
        assert!(!frames.start());

        frames.follow_visibility(false);
        frames.follow_visibility(true);
        assert_eq!(frames.generation(), 2);
        assert_eq!(frames.begin_frame(), Some(0));
        assert_eq!(frames.total_frames(), 3);
    }

    #[test]
    fn test_debounce_delivers_last_value() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(100));

        debounce.trigger(1, start);
        debounce.trigger(2, start + Duration::from_millis(60));
        assert_eq!(debounce.poll(start + Duration::from_millis(120)), None);
        assert_eq!(debounce.poll(start + Duration::from_millis(160)), Some(2));
        assert_eq!(debounce.poll(start + Duration::from_millis(500)), None);
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_debounce_cancel() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(10));
        debounce.trigger("resize", start);
        assert_eq!(debounce.deadline(), Some(start + Duration::from_millis(10)));
        debounce.cancel();
        assert_eq!(debounce.poll(start + Duration::from_secs(1)), None);
    }
}
