//! Letter slot layout for the text field.
//!
//! A word is laid out as a single horizontally centered row of fixed-size
//! slots, vertically centered in the container:
//!
//! ```text
//! word_width = len * letter_width + (len - 1) * gap
//! start_x    = (container_width - word_width) / 2
//! slot[i]    = (start_x + i * (letter_width + gap), container_height / 2)
//! ```

use glam::Vec2;

use crate::config::TextFieldConfig;

/// Slot geometry for a row of letters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordLayout {
    pub letter_width: f32,
    pub letter_gap: f32,
}

impl Default for WordLayout {
    fn default() -> Self {
        Self {
            letter_width: 40.0,
            letter_gap: 4.0,
        }
    }
}

impl From<&TextFieldConfig> for WordLayout {
    fn from(config: &TextFieldConfig) -> Self {
        Self {
            letter_width: config.letter_width,
            letter_gap: config.letter_gap,
        }
    }
}

impl WordLayout {
    /// Distance between the left edges of two neighbouring slots.
    #[inline]
    pub fn stride(&self) -> f32 {
        self.letter_width + self.letter_gap
    }

    /// Total width of a row of `len` slots.
    pub fn word_width(&self, len: usize) -> f32 {
        if len == 0 {
            return 0.0;
        }
        len as f32 * self.letter_width + (len - 1) as f32 * self.letter_gap
    }

    /// Target of slot `index` in a row of `len` slots.
    pub fn slot(&self, index: usize, len: usize, container: Vec2) -> Vec2 {
        let start_x = (container.x - self.word_width(len)) / 2.0;
        Vec2::new(start_x + index as f32 * self.stride(), container.y / 2.0)
    }

    /// Targets for every slot of a row of `len` slots, in index order.
    pub fn targets(&self, len: usize, container: Vec2) -> Vec<Vec2> {
        (0..len).map(|i| self.slot(i, len, container)).collect()
    }
}

/// An axis-aligned rectangle in window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// A rectangle anchored at the window origin.
    pub fn from_size(size: Vec2) -> Self {
        Self { origin: Vec2::ZERO, size }
    }

    /// Largest square centered in `outer`, no wider than `max_side`.
    pub fn centered_square(outer: Rect, max_side: f32) -> Self {
        let side = outer.size.min_element().min(max_side).max(0.0);
        let origin = outer.origin + (outer.size - Vec2::splat(side)) / 2.0;
        Self { origin, size: Vec2::splat(side) }
    }

    /// Window point relative to the top-left corner.
    #[inline]
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        point - self.origin
    }

    /// Window point as percent (0-100) of the rectangle per axis.
    pub fn to_percent(&self, point: Vec2) -> Vec2 {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return Vec2::ZERO;
        }
        self.to_local(point) / self.size * 100.0
    }

    /// Percent coordinates back to window pixels.
    pub fn from_percent(&self, percent: Vec2) -> Vec2 {
        self.origin + percent / 100.0 * self.size
    }
}
