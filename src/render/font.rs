//! 5x7 bitmap font for letter tiles.

use super::Canvas;

pub const FONT_WIDTH: usize = 5;
pub const FONT_HEIGHT: usize = 7;

/// Glyph rows for `ch`. Each row is a u8 with lower 5 bits = pixels (bit4=left).
///
/// Lowercase letters share the uppercase shapes; anything unknown draws as `?`.
pub const fn glyph(ch: char) -> [u8; FONT_HEIGHT] {
    match ch.to_ascii_uppercase() {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

/// Draw `ch` with its top-left at (x, y), each font pixel `scale`×`scale`.
pub fn draw_char(canvas: &mut Canvas, x: i32, y: i32, ch: char, scale: i32, color: [u8; 3]) {
    let g = glyph(ch);
    for (row, bits) in g.iter().enumerate() {
        for col in 0..FONT_WIDTH {
            if bits & (1 << (FONT_WIDTH - 1 - col)) != 0 {
                canvas.fill_rect(
                    x + col as i32 * scale,
                    y + row as i32 * scale,
                    scale,
                    scale,
                    color,
                );
            }
        }
    }
}

/// Draw a line of text left to right, one font column of spacing between glyphs.
pub fn draw_str(canvas: &mut Canvas, x: i32, y: i32, text: &str, scale: i32, color: [u8; 3]) {
    let advance = (FONT_WIDTH as i32 + 1) * scale;
    for (i, ch) in text.chars().enumerate() {
        draw_char(canvas, x + i as i32 * advance, y, ch, scale, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_uses_uppercase_shape() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph('z'), glyph('Z'));
    }

    #[test]
    fn test_space_is_blank() {
        assert!(glyph(' ').iter().all(|row| *row == 0));
    }

    #[test]
    fn test_unknown_falls_back_to_question_mark() {
        assert_eq!(glyph('~'), glyph('¿'));
        assert_ne!(glyph('~'), glyph(' '));
    }

    #[test]
    fn test_draw_char_scales() {
        let mut canvas = Canvas::new(20, 20);
        draw_char(&mut canvas, 0, 0, 'L', 2, [255, 255, 255]);
        // 'L' has a full left column: 7 rows * 2 = 14 pixels tall.
        assert_eq!(canvas.pixel(0, 13), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(1, 0), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(0, 14), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_draw_str_advances() {
        let mut canvas = Canvas::new(20, 10);
        draw_str(&mut canvas, 0, 0, "LL", 1, [255, 255, 255]);
        // Second 'L' starts at column 6.
        assert_eq!(canvas.pixel(6, 0), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(5, 0), Some([0, 0, 0, 0]));
    }
}
