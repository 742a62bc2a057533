//! CPU rasterization of the particle fields.
//!
//! Both fields draw into a [`Canvas`], a tightly packed RGBA8 frame that the
//! window presenter uploads once per changed frame. Letters are
//! rounded grey tiles anchored at their top-left corner; image cells are
//! round dots centered on their position.

mod font;

pub use font::{draw_char, draw_str, glyph, FONT_HEIGHT, FONT_WIDTH};

use glam::Vec2;

use crate::image_field::ImageField;
use crate::layout::Rect;
use crate::text_field::TextField;

/// Letter tile fill (#6b7280).
pub const TILE_COLOR: [u8; 3] = [0x6b, 0x72, 0x80];
/// Letter glyph color.
pub const GLYPH_COLOR: [u8; 3] = [0xff, 0xff, 0xff];
/// Tile corner radius in pixels.
const TILE_RADIUS: f32 = 8.0;
/// Font pixel size inside a tile.
const GLYPH_SCALE: i32 = 2;
/// Side cap of the image container in pixels.
pub const IMAGE_MAX_SIDE: f32 = 600.0;

/// An RGBA8 frame buffer.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Resize, discarding the contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize((width * height * 4) as usize, 0);
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn clear(&mut self, color: [u8; 3]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[color[0], color[1], color[2], 255]);
        }
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.pixels[i..i + 4].copy_from_slice(&[color[0], color[1], color[2], 255]);
    }

    /// Fill a rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: [u8; 3]) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.put(px, py, color);
            }
        }
    }

    /// Fill a rectangle with circular corners of `radius`.
    pub fn fill_rounded_rect(&mut self, x: i32, y: i32, w: i32, h: i32, radius: f32, color: [u8; 3]) {
        let r = radius.min(w as f32 / 2.0).min(h as f32 / 2.0).max(0.0);
        for py in y.max(0)..(y + h).min(self.height as i32) {
            for px in x.max(0)..(x + w).min(self.width as i32) {
                // Distance from the pixel center to the nearest inner corner box.
                let cx = (px - x) as f32 + 0.5;
                let cy = (py - y) as f32 + 0.5;
                let dx = (r - cx).max(cx - (w as f32 - r)).max(0.0);
                let dy = (r - cy).max(cy - (h as f32 - r)).max(0.0);
                if dx * dx + dy * dy <= r * r {
                    self.put(px, py, color);
                }
            }
        }
    }

    /// Fill a disc centered on `center`.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: [u8; 3]) {
        let r2 = radius * radius;
        let x0 = (center.x - radius).floor() as i32;
        let x1 = (center.x + radius).ceil() as i32;
        let y0 = (center.y - radius).floor() as i32;
        let y1 = (center.y + radius).ceil() as i32;
        for py in y0..y1 {
            for px in x0..x1 {
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - center;
                if d.length_squared() <= r2 {
                    self.put(px, py, color);
                }
            }
        }
    }
}

/// Draw every letter tile. `offset_y` shifts the whole field (pull gesture).
pub fn draw_text_field(canvas: &mut Canvas, field: &TextField, offset_y: f32) {
    let size = field.config().letter_width.round() as i32;
    let glyph_w = FONT_WIDTH as i32 * GLYPH_SCALE;
    let glyph_h = FONT_HEIGHT as i32 * GLYPH_SCALE;

    for particle in field.particles() {
        let x = particle.position.x.round() as i32;
        let y = (particle.position.y + offset_y).round() as i32;
        canvas.fill_rounded_rect(x, y, size, size, TILE_RADIUS, TILE_COLOR);
        draw_char(
            canvas,
            x + (size - glyph_w) / 2,
            y + (size - glyph_h) / 2,
            particle.letter(),
            GLYPH_SCALE,
            GLYPH_COLOR,
        );
    }
}

/// Dot diameter in pixels for a grid drawn into `container`.
pub fn dot_diameter(container: Rect, grid_size: u32) -> f32 {
    if grid_size == 0 {
        return 0.0;
    }
    let gap = if grid_size > 30 { 4.0 } else { 2.0 };
    (container.size.x / grid_size as f32 - gap).max(1.0)
}

/// Draw every image cell as a dot inside `container`.
pub fn draw_image_field(canvas: &mut Canvas, field: &ImageField, container: Rect) {
    let radius = dot_diameter(container, field.grid_size()) / 2.0;
    for particle in field.particles() {
        let center = container.from_percent(particle.position);
        canvas.fill_circle(center, radius, particle.color().to_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImageFieldConfig, TextFieldConfig};
    use crate::image_field::{CellColor, ImageParticle};

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(-2, -2, 4, 4, [1, 2, 3]);
        assert_eq!(canvas.pixel(0, 0), Some([1, 2, 3, 255]));
        assert_eq!(canvas.pixel(1, 1), Some([1, 2, 3, 255]));
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_rounded_corners_are_cut() {
        let mut canvas = Canvas::new(40, 40);
        canvas.fill_rounded_rect(0, 0, 40, 40, 8.0, [9, 9, 9]);
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(20, 0), Some([9, 9, 9, 255]));
        assert_eq!(canvas.pixel(20, 20), Some([9, 9, 9, 255]));
    }

    #[test]
    fn test_circle_is_centered() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_circle(Vec2::new(5.0, 5.0), 2.0, [7, 7, 7]);
        assert_eq!(canvas.pixel(5, 5), Some([7, 7, 7, 255]));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(8, 5), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_dot_gap_depends_on_grid() {
        let container = Rect::from_size(Vec2::splat(600.0));
        assert_eq!(dot_diameter(container, 50), 8.0);
        assert_eq!(dot_diameter(container, 20), 28.0);
        assert_eq!(dot_diameter(container, 0), 0.0);
    }

    #[test]
    fn test_text_field_draws_tiles() {
        let config = TextFieldConfig {
            seed: Some(1),
            ..Default::default()
        };
        let mut field = TextField::new(config, Vec2::new(200.0, 200.0));
        field.set_word("I");

        let mut canvas = Canvas::new(200, 200);
        canvas.clear([0, 0, 0]);
        draw_text_field(&mut canvas, &field, 0.0);
        // Tile spans (100..140, 100..140); its edge midpoint is grey.
        assert_eq!(canvas.pixel(101, 120), Some([0x6b, 0x72, 0x80, 255]));
    }

    #[test]
    fn test_image_field_draws_dots() {
        let mut field = ImageField::new(ImageFieldConfig::default());
        field.load(
            2,
            vec![ImageParticle::at_rest(Vec2::new(50.0, 50.0), CellColor::new(200, 10, 10))],
        );
        let mut canvas = Canvas::new(100, 100);
        draw_image_field(&mut canvas, &field, Rect::from_size(Vec2::splat(100.0)));
        assert_eq!(canvas.pixel(50, 50), Some([200, 10, 10, 255]));
        assert_eq!(canvas.pixel(5, 5), Some([0, 0, 0, 0]));
    }
}
