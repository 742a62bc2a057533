//! Pointer and keyboard tracking.
//!
//! [`PointerTracker`] turns raw window events into the single repulsion
//! point both fields read once per frame. The point lives in the coordinate
//! space of the active field: pixels relative to the container for the text
//! field, percent of the container for the image field.
//!
//! Writes come from the event source and reads come from the frame loop, on
//! the same thread, so the latest event simply wins.
//!
//! ```ignore
//! tracker.handle_event(&event);
//! let ctx = InputContext::new(tracker.state(), gate.is_visible());
//! text_field.step(&ctx, focused);
//! ```

use glam::Vec2;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::config::InputConfig;
use crate::layout::Rect;

/// Keys the fields react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => KeyCode::Enter,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Tab => KeyCode::Tab,
            WinitKeyCode::Backspace => KeyCode::Backspace,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Coordinate space the tracked pointer is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerSpace {
    /// Pixels relative to the container's top-left corner.
    #[default]
    Pixels,
    /// Percent (0-100) of the container per axis.
    Percent,
}

/// The repulsion point as seen by the integrators.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    /// Pointer location in the active field's space.
    pub position: Vec2,
    /// Whether the pointer is interacting (moving over or pressing the field).
    pub active: bool,
    /// Whether the interaction is a press/touch rather than a hover.
    pub touch: bool,
}

/// Everything an integrator reads from the outside world for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputContext {
    pub pointer: PointerState,
    pub is_visible: bool,
}

impl InputContext {
    pub fn new(pointer: PointerState, is_visible: bool) -> Self {
        Self { pointer, is_visible }
    }

    /// A visible context with the pointer at `position` and no interaction.
    pub fn at(position: Vec2) -> Self {
        Self::new(
            PointerState {
                position,
                ..Default::default()
            },
            true,
        )
    }
}

impl Default for InputContext {
    fn default() -> Self {
        Self::new(PointerState::default(), true)
    }
}

/// Maintains the shared repulsion point from pointer and keyboard events.
#[derive(Debug)]
pub struct PointerTracker {
    space: PointerSpace,
    container: Rect,
    state: PointerState,
    keyboard_step: f32,
}

impl PointerTracker {
    pub fn new(space: PointerSpace, config: &InputConfig) -> Self {
        Self {
            space,
            container: Rect::default(),
            state: PointerState::default(),
            keyboard_step: config.keyboard_step,
        }
    }

    /// Current pointer state.
    #[inline]
    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn space(&self) -> PointerSpace {
        self.space
    }

    /// Switch coordinate space, e.g. when the active field changes.
    ///
    /// Interaction flags are dropped; the position is kept until the next
    /// pointer event.
    pub fn set_space(&mut self, space: PointerSpace) {
        if self.space != space {
            self.space = space;
            self.state.active = false;
            self.state.touch = false;
        }
    }

    /// Update the container rectangle events are mapped into.
    pub fn set_container(&mut self, container: Rect) {
        self.container = container;
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    /// Pointer moved to `window_pos` (window pixels).
    ///
    /// In percent space the pointer only interacts while it is over the
    /// container; moving off it ends the interaction.
    pub fn pointer_moved(&mut self, window_pos: Vec2) {
        match self.space {
            PointerSpace::Pixels => {
                self.state.position = self.container.to_local(window_pos);
            }
            PointerSpace::Percent => {
                self.state.position = self.container.to_percent(window_pos);
                if self.over_container() {
                    self.state.active = true;
                } else {
                    self.state.active = false;
                    self.state.touch = false;
                }
            }
        }
    }

    /// Primary button or finger went down at the last known position.
    pub fn pointer_pressed(&mut self) {
        if self.space == PointerSpace::Percent && !self.over_container() {
            return;
        }
        self.state.touch = true;
        self.state.active = true;
    }

    fn over_container(&self) -> bool {
        let p = self.state.position;
        (0.0..=100.0).contains(&p.x) && (0.0..=100.0).contains(&p.y)
    }

    /// Primary button or finger came up.
    pub fn pointer_released(&mut self) {
        self.state.touch = false;
        self.state.active = false;
    }

    /// Pointer left the window.
    pub fn pointer_left(&mut self) {
        self.state.active = false;
    }

    /// Apply a key press.
    ///
    /// Arrow keys nudge the pixel-space pointer by the keyboard step so the
    /// letters can be pushed around without a mouse. In percent space Enter
    /// and Space toggle interaction instead.
    pub fn key_pressed(&mut self, key: KeyCode) {
        let step = self.keyboard_step;
        match (self.space, key) {
            (PointerSpace::Pixels, KeyCode::Up) => self.state.position.y -= step,
            (PointerSpace::Pixels, KeyCode::Down) => self.state.position.y += step,
            (PointerSpace::Pixels, KeyCode::Left) => self.state.position.x -= step,
            (PointerSpace::Pixels, KeyCode::Right) => self.state.position.x += step,
            (PointerSpace::Percent, KeyCode::Enter | KeyCode::Space) => {
                self.state.active = !self.state.active;
            }
            _ => {}
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => self.pointer_left(),

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.pointer_pressed(),
                ElementState::Released => self.pointer_released(),
            },

            WindowEvent::Touch(touch) => {
                let pos = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => {
                        self.pointer_moved(pos);
                        self.pointer_pressed();
                    }
                    TouchPhase::Moved => self.pointer_moved(pos),
                    TouchPhase::Ended | TouchPhase::Cancelled => self.pointer_released(),
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.key_pressed(KeyCode::from(code));
                    }
                }
            }

            _ => {}
        }
    }
}

/// Pull-down-to-reseed gesture on touch screens.
///
/// A drag that starts on the surface and moves down displaces the field by
/// half the drag distance, capped at the threshold. Releasing after pulling
/// further than the threshold asks the host to reseed.
#[derive(Debug, Clone)]
pub struct PullGesture {
    threshold: f32,
    start_y: Option<f32>,
    current_y: f32,
}

impl PullGesture {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            start_y: None,
            current_y: 0.0,
        }
    }

    pub fn begin(&mut self, y: f32) {
        self.start_y = Some(y);
        self.current_y = y;
    }

    pub fn update(&mut self, y: f32) {
        if self.start_y.is_some() {
            self.current_y = y;
        }
    }

    /// Signed drag distance since `begin`, zero when idle.
    pub fn pull_distance(&self) -> f32 {
        self.start_y.map_or(0.0, |start| self.current_y - start)
    }

    /// Vertical displacement to draw the field with.
    pub fn offset(&self) -> f32 {
        let pull = self.pull_distance();
        if pull > 0.0 {
            (pull * 0.5).min(self.threshold)
        } else {
            0.0
        }
    }

    /// Finish the gesture. Returns `true` if it should trigger a reseed.
    pub fn end(&mut self) -> bool {
        let triggered = self.pull_distance() > self.threshold;
        self.start_y = None;
        self.current_y = 0.0;
        triggered
    }

    pub fn is_active(&self) -> bool {
        self.start_y.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(space: PointerSpace) -> PointerTracker {
        let mut t = PointerTracker::new(space, &InputConfig::default());
        t.set_container(Rect::new(Vec2::new(100.0, 100.0), Vec2::new(200.0, 200.0)));
        t
    }

    #[test]
    fn test_pixel_space_is_container_relative() {
        let mut t = tracker(PointerSpace::Pixels);
        t.pointer_moved(Vec2::new(150.0, 120.0));
        assert_eq!(t.state().position, Vec2::new(50.0, 20.0));
        // Hover alone does not gate the text field.
        assert!(!t.state().active);
    }

    #[test]
    fn test_arrow_keys_nudge_pointer() {
        let mut t = tracker(PointerSpace::Pixels);
        t.pointer_moved(Vec2::new(100.0, 100.0));
        t.key_pressed(KeyCode::Right);
        t.key_pressed(KeyCode::Down);
        t.key_pressed(KeyCode::Down);
        assert_eq!(t.state().position, Vec2::new(20.0, 40.0));
        t.key_pressed(KeyCode::Left);
        t.key_pressed(KeyCode::Up);
        assert_eq!(t.state().position, Vec2::new(0.0, 20.0));
    }

    #[test]
    fn test_percent_space_tracks_interaction() {
        let mut t = tracker(PointerSpace::Percent);
        assert!(!t.state().active);

        t.pointer_moved(Vec2::new(200.0, 150.0));
        let s = t.state();
        assert!(s.active);
        assert!(!s.touch);
        assert!((s.position - Vec2::new(50.0, 25.0)).length() < 1e-4);

        t.pointer_pressed();
        assert!(t.state().touch);
        t.pointer_released();
        assert!(!t.state().active);
        assert!(!t.state().touch);

        t.pointer_moved(Vec2::new(200.0, 150.0));
        t.pointer_left();
        assert!(!t.state().active);
    }

    #[test]
    fn test_leaving_container_ends_interaction() {
        let mut t = PointerTracker::new(PointerSpace::Percent, &InputConfig::default());
        t.set_container(Rect::new(Vec2::new(340.0, 60.0), Vec2::new(600.0, 600.0)));

        t.pointer_moved(Vec2::new(640.0, 360.0));
        assert!(t.state().active);
        t.pointer_pressed();
        assert!(t.state().touch);

        // Side margin, left of the square.
        t.pointer_moved(Vec2::new(100.0, 300.0));
        let s = t.state();
        assert!(!s.active);
        assert!(!s.touch);
        assert!((s.position - Vec2::new(-40.0, 40.0)).length() < 1e-4);

        // Pressing in the margin does not start an interaction either.
        t.pointer_pressed();
        assert!(!t.state().active);
        assert!(!t.state().touch);

        t.pointer_moved(Vec2::new(400.0, 100.0));
        assert!(t.state().active);
    }

    #[test]
    fn test_arrows_ignored_in_percent_space() {
        let mut t = tracker(PointerSpace::Percent);
        t.key_pressed(KeyCode::Right);
        assert_eq!(t.state().position, Vec2::ZERO);

        t.key_pressed(KeyCode::Enter);
        assert!(t.state().active);
        t.key_pressed(KeyCode::Space);
        assert!(!t.state().active);
    }

    #[test]
    fn test_switching_space_drops_interaction() {
        let mut t = tracker(PointerSpace::Percent);
        t.pointer_pressed();
        t.set_space(PointerSpace::Pixels);
        assert!(!t.state().active);
        assert!(!t.state().touch);
    }

    #[test]
    fn test_pull_gesture() {
        let mut pull = PullGesture::new(100.0);
        assert_eq!(pull.offset(), 0.0);

        pull.begin(10.0);
        pull.update(70.0);
        assert_eq!(pull.offset(), 30.0);
        pull.update(400.0);
        assert_eq!(pull.offset(), 100.0);
        assert!(pull.end());
        assert!(!pull.is_active());

        pull.begin(10.0);
        pull.update(90.0);
        assert!(!pull.end());

        // Upward drags never displace the field.
        pull.begin(300.0);
        pull.update(100.0);
        assert_eq!(pull.offset(), 0.0);
        assert!(!pull.end());
    }
}
