//! Fixed-size RGB canvas and deterministic text fitting.
//!
//! The canvas is an in-memory framebuffer implementing
//! [`embedded_graphics::draw_target::DrawTarget`] at `Rgb888`, so every panel
//! draws with the usual embedded-graphics primitives and styles. After
//! composition it is handed to the palette encoder read-only.
//!
//! Text fitting works on monospace font metrics, which makes truncation and
//! wrapping exact and idempotent: re-measuring the same string with the same
//! font always yields the same result.

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

/// Fixed-size RGB raster the layout engine composes into.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Canvas {
    /// Create a white canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::WHITE; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y). Out-of-bounds reads come back white, matching the
    /// background the encoder would otherwise see.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb888 {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize]
        } else {
            Rgb888::WHITE
        }
    }

    /// Write a single pixel; out-of-bounds writes are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            self.pixels[(y as u32 * self.width + x as u32) as usize] = color;
        }
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }
}

/// Advance width of one character cell, including inter-character spacing.
pub fn char_advance(font: &MonoFont) -> u32 {
    font.character_size.width + font.character_spacing
}

/// Rendered width of `text` in pixels for a monospace font.
pub fn text_width(font: &MonoFont, text: &str) -> u32 {
    text.chars().count() as u32 * char_advance(font)
}

/// Truncate `text` so it fits `max_w` pixels, appending `...` when trimmed.
///
/// Returns the empty string when not even the ellipsis fits.
pub fn truncate_text(font: &MonoFont, text: &str, max_w: u32) -> String {
    if text_width(font, text) <= max_w {
        return text.to_string();
    }
    let suffix = "...";
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        let candidate: String = chars.iter().collect::<String>() + suffix;
        if text_width(font, &candidate) <= max_w {
            return candidate;
        }
        chars.pop();
    }
    String::new()
}

/// Word-wrap `text` into lines no wider than `max_w` pixels.
///
/// A single word wider than the column still gets its own line; callers cap
/// the result (agenda rows keep at most two lines) and truncate the last one.
pub fn wrap_text(font: &MonoFont, text: &str, max_w: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        if word.is_empty() {
            continue;
        }
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(font, &candidate) <= max_w {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(current);
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mono_font::ascii::FONT_6X10;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_canvas_starts_white() {
        let canvas = Canvas::new(4, 4);
        assert_eq!(canvas.pixel(0, 0), Rgb888::WHITE);
        assert_eq!(canvas.pixel(3, 3), Rgb888::WHITE);
    }

    #[test]
    fn test_draw_target_clipping() {
        let mut canvas = Canvas::new(4, 4);
        // Rectangle partially outside the canvas must not panic.
        Rectangle::new(Point::new(2, 2), Size::new(10, 10))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
            .draw(&mut canvas)
            .unwrap();
        assert_eq!(canvas.pixel(3, 3), Rgb888::RED);
        assert_eq!(canvas.pixel(1, 1), Rgb888::WHITE);
        // Out-of-bounds read is white.
        assert_eq!(canvas.pixel(10, 10), Rgb888::WHITE);
    }

    #[test]
    fn test_text_width_monospace() {
        assert_eq!(text_width(&FONT_6X10, "abc"), 18);
        assert_eq!(text_width(&FONT_6X10, ""), 0);
        // Umlauts count as one cell each.
        assert_eq!(text_width(&FONT_6X10, "über"), 24);
    }

    #[test]
    fn test_truncate_text() {
        // "hello" is 30px wide; 24px forces "h..." (4 chars = 24px).
        assert_eq!(truncate_text(&FONT_6X10, "hello", 30), "hello");
        assert_eq!(truncate_text(&FONT_6X10, "hello", 24), "h...");
        assert_eq!(truncate_text(&FONT_6X10, "hello", 10), "");
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let once = truncate_text(&FONT_6X10, "hello world", 40);
        let twice = truncate_text(&FONT_6X10, &once, 40);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_wrap_text() {
        // 36px column fits 6 chars per line.
        let lines = wrap_text(&FONT_6X10, "one two three", 36);
        assert_eq!(lines, vec!["one", "two", "three"]);

        let lines = wrap_text(&FONT_6X10, "ab cd", 36);
        assert_eq!(lines, vec!["ab cd"]);

        // An oversized word still produces a line.
        let lines = wrap_text(&FONT_6X10, "extraordinarily", 36);
        assert_eq!(lines, vec!["extraordinarily"]);
    }
}
