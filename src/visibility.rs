//! Foreground/background tracking for the host window.
//!
//! The frame loop only runs while the window can actually be seen. A window
//! counts as hidden while it is occluded (another window covers it, or it is
//! on another workspace) or minimized.

use winit::event::WindowEvent;

/// Whether the host window is currently visible.
#[derive(Debug, Clone)]
pub struct VisibilityGate {
    occluded: bool,
    minimized: bool,
}

impl VisibilityGate {
    /// A gate for a window that starts out visible.
    pub fn new() -> Self {
        Self {
            occluded: false,
            minimized: false,
        }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        !self.occluded && !self.minimized
    }

    pub fn set_occluded(&mut self, occluded: bool) -> Option<bool> {
        let before = self.is_visible();
        self.occluded = occluded;
        self.changed(before)
    }

    pub fn set_minimized(&mut self, minimized: bool) -> Option<bool> {
        let before = self.is_visible();
        self.minimized = minimized;
        self.changed(before)
    }

    /// Process a winit window event.
    ///
    /// Returns the new visibility if this event flipped it.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<bool> {
        match event {
            WindowEvent::Occluded(occluded) => self.set_occluded(*occluded),
            // winit reports minimizing as a resize to zero on most platforms.
            WindowEvent::Resized(size) => self.set_minimized(size.width == 0 || size.height == 0),
            _ => None,
        }
    }

    fn changed(&self, before: bool) -> Option<bool> {
        let now = self.is_visible();
        (now != before).then_some(now)
    }
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self::new()
    }
}
