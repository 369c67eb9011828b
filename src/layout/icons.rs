//! Procedural icon glyphs.
//!
//! The display has no icon font, so every glyph is drawn from primitives at
//! the requested size. Rendering goes through a read-through stamp cache:
//! each (kind, size) pair is rasterized once into a coverage mask and then
//! blitted in any color. Entries are immutable once written, so a cache can
//! live across renders.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle, Triangle};
use std::collections::HashMap;

use crate::canvas::Canvas;

/// Everything the panels stamp repeatedly in a single color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Sun,
    ClearNight,
    PartlyCloudy,
    Cloud,
    Drizzle,
    Rain,
    Thunder,
    Snow,
    Fog,
    Sunrise,
    Sunset,
    Wind,
    Raindrop,
    Refresh,
    Cutlery,
    MoonPhase(u8),
}

/// Glyph for an OWM condition code; unknown codes render as a cloud.
pub fn condition_icon(code: &str) -> IconKind {
    match code {
        "01d" => IconKind::Sun,
        "01n" => IconKind::ClearNight,
        "02d" | "02n" => IconKind::PartlyCloudy,
        "03d" | "03n" | "04d" | "04n" => IconKind::Cloud,
        "09d" | "09n" => IconKind::Drizzle,
        "10d" | "10n" => IconKind::Rain,
        "11d" | "11n" => IconKind::Thunder,
        "13d" | "13n" => IconKind::Snow,
        "50d" | "50n" => IconKind::Fog,
        _ => IconKind::Cloud,
    }
}

struct Stamp {
    size: u32,
    mask: Vec<bool>,
}

/// Read-through cache of rasterized glyph masks.
pub struct IconCache {
    stamps: HashMap<(IconKind, u32), Stamp>,
}

impl IconCache {
    pub fn new() -> Self {
        Self {
            stamps: HashMap::new(),
        }
    }

    /// Stamp a glyph with its top-left corner at `origin`.
    pub fn draw(
        &mut self,
        canvas: &mut Canvas,
        kind: IconKind,
        origin: Point,
        size: u32,
        color: Rgb888,
    ) {
        let size = size.max(8);
        let stamp = self
            .stamps
            .entry((kind, size))
            .or_insert_with(|| render_stamp(kind, size));
        for dy in 0..stamp.size {
            for dx in 0..stamp.size {
                if stamp.mask[(dy * stamp.size + dx) as usize] {
                    canvas.set_pixel(origin.x + dx as i32, origin.y + dy as i32, color);
                }
            }
        }
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Rasterize a glyph black-on-white and keep the coverage mask.
fn render_stamp(kind: IconKind, size: u32) -> Stamp {
    let mut scratch = Canvas::new(size, size);
    draw_glyph(&mut scratch, kind, size);
    let mask = (0..size * size)
        .map(|i| scratch.pixel(i % size, i / size) != Rgb888::WHITE)
        .collect();
    Stamp { size, mask }
}

fn fill() -> PrimitiveStyle<Rgb888> {
    PrimitiveStyle::with_fill(Rgb888::BLACK)
}

fn stroke() -> PrimitiveStyle<Rgb888> {
    PrimitiveStyle::with_stroke(Rgb888::BLACK, 1)
}

fn draw_glyph(canvas: &mut Canvas, kind: IconKind, size: u32) {
    let s = size as i32;
    match kind {
        IconKind::Sun => {
            let r = s * 3 / 10;
            let c = s / 2;
            let _ = Circle::with_center(Point::new(c, c), (r * 2) as u32)
                .into_styled(fill())
                .draw(canvas);
            // Eight rays.
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)]
            {
                let inner = Point::new(c + dx * (r + 2), c + dy * (r + 2));
                let outer = Point::new(c + dx * (s / 2 - 1), c + dy * (s / 2 - 1));
                let _ = Line::new(inner, outer).into_styled(stroke()).draw(canvas);
            }
        }
        IconKind::ClearNight => {
            draw_moon_disc(canvas, size, 1);
        }
        IconKind::PartlyCloudy => {
            let r = s / 4;
            let _ = Circle::with_center(Point::new(s / 3, s / 3), (r * 2) as u32)
                .into_styled(fill())
                .draw(canvas);
            draw_cloud(canvas, s / 2, s * 5 / 8, s / 2);
        }
        IconKind::Cloud => {
            draw_cloud(canvas, s / 2, s / 2, s * 2 / 3);
        }
        IconKind::Drizzle | IconKind::Rain => {
            draw_cloud(canvas, s / 2, s * 2 / 5, s * 3 / 5);
            let drops = if kind == IconKind::Drizzle { 4 } else { 3 };
            for i in 0..drops {
                let x = s / 5 + i * (s * 3 / 5) / drops;
                let top = s * 3 / 5 + (i % 2) * 2;
                let _ = Line::new(Point::new(x + 2, top), Point::new(x, top + s / 5))
                    .into_styled(stroke())
                    .draw(canvas);
            }
        }
        IconKind::Thunder => {
            draw_cloud(canvas, s / 2, s * 2 / 5, s * 3 / 5);
            let _ = Triangle::new(
                Point::new(s / 2, s * 11 / 20),
                Point::new(s * 2 / 5, s * 4 / 5),
                Point::new(s / 2, s * 7 / 10),
            )
            .into_styled(fill())
            .draw(canvas);
            let _ = Line::new(
                Point::new(s / 2, s * 7 / 10),
                Point::new(s * 9 / 20, s - 2),
            )
            .into_styled(stroke())
            .draw(canvas);
        }
        IconKind::Snow => {
            draw_cloud(canvas, s / 2, s * 2 / 5, s * 3 / 5);
            for i in 0..3 {
                let x = s / 4 + i * s / 4;
                let y = s * 7 / 10 + (i % 2) * 3;
                let _ = Line::new(Point::new(x - 2, y), Point::new(x + 2, y))
                    .into_styled(stroke())
                    .draw(canvas);
                let _ = Line::new(Point::new(x, y - 2), Point::new(x, y + 2))
                    .into_styled(stroke())
                    .draw(canvas);
            }
        }
        IconKind::Fog => {
            for i in 0..4 {
                let y = s / 4 + i * s / 6;
                let inset = if i % 2 == 0 { 2 } else { s / 8 };
                let _ = Line::new(Point::new(inset, y), Point::new(s - inset - 1, y))
                    .into_styled(stroke())
                    .draw(canvas);
            }
        }
        IconKind::Sunrise | IconKind::Sunset => {
            let c = s / 2;
            let horizon = s * 7 / 10;
            let r = s / 4;
            // Half sun above the horizon.
            let _ = Circle::with_center(Point::new(c, horizon), (r * 2) as u32)
                .into_styled(fill())
                .draw(canvas);
            let _ = Rectangle::new(
                Point::new(0, horizon),
                Size::new(size, (s - horizon).max(1) as u32),
            )
            .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
            .draw(canvas);
            let _ = Line::new(Point::new(2, horizon), Point::new(s - 3, horizon))
                .into_styled(stroke())
                .draw(canvas);
            // Direction arrow above the sun.
            let tip_y = if kind == IconKind::Sunrise { 2 } else { s * 2 / 5 };
            let base_y = if kind == IconKind::Sunrise { s * 2 / 5 } else { 2 };
            let _ = Triangle::new(
                Point::new(c, tip_y),
                Point::new(c - s / 6, base_y),
                Point::new(c + s / 6, base_y),
            )
            .into_styled(fill())
            .draw(canvas);
        }
        IconKind::Wind => {
            for i in 0..3 {
                let y = s / 3 + i * s / 5;
                let end = s - 2 - i * s / 6;
                let _ = Line::new(Point::new(2, y), Point::new(end, y))
                    .into_styled(stroke())
                    .draw(canvas);
                let _ = Line::new(Point::new(end, y), Point::new(end - 2, y - 2))
                    .into_styled(stroke())
                    .draw(canvas);
            }
        }
        IconKind::Raindrop => {
            let c = s / 2;
            let r = s / 4;
            let _ = Circle::with_center(Point::new(c, s * 3 / 5), (r * 2) as u32)
                .into_styled(fill())
                .draw(canvas);
            let _ = Triangle::new(
                Point::new(c, 1),
                Point::new(c - r, s * 3 / 5),
                Point::new(c + r, s * 3 / 5),
            )
            .into_styled(fill())
            .draw(canvas);
        }
        IconKind::Refresh => {
            let c = s / 2;
            let _ = Circle::with_center(Point::new(c, c), (s - 4) as u32)
                .into_styled(stroke())
                .draw(canvas);
            // Gap plus arrowhead at the top right.
            let _ = Rectangle::new(Point::new(c + 1, 0), Size::new(size / 2, size / 3))
                .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
                .draw(canvas);
            let _ = Triangle::new(
                Point::new(c + 1, 1),
                Point::new(c + 1, s / 3),
                Point::new(c + s / 4, s / 6),
            )
            .into_styled(fill())
            .draw(canvas);
        }
        IconKind::Cutlery => {
            draw_pot(canvas, s);
        }
        IconKind::MoonPhase(index) => {
            draw_moon_disc(canvas, size, index);
        }
    }
}

/// Two overlapping circles on a flat base.
fn draw_cloud(canvas: &mut Canvas, cx: i32, cy: i32, w: i32) {
    let r_big = w * 2 / 5;
    let r_small = w * 3 / 10;
    let _ = Circle::with_center(Point::new(cx - w / 5, cy), (r_big * 2) as u32)
        .into_styled(fill())
        .draw(canvas);
    let _ = Circle::with_center(Point::new(cx + w / 4, cy + 2), (r_small * 2) as u32)
        .into_styled(fill())
        .draw(canvas);
    let _ = Rectangle::new(
        Point::new(cx - w / 2, cy),
        Size::new(w as u32, (r_big / 2 + 2).max(1) as u32),
    )
    .into_styled(fill())
    .draw(canvas);
}

/// Cooking pot with steam, the meal-feed marker.
fn draw_pot(canvas: &mut Canvas, s: i32) {
    let cx = s / 2;
    let left = 2;
    let right = s - 3;
    let body_top = s * 2 / 5;
    let _ = Rectangle::new(
        Point::new(left, body_top),
        Size::new((right - left + 1) as u32, (s - 1 - body_top) as u32),
    )
    .into_styled(stroke())
    .draw(canvas);
    // Lid and knob.
    let _ = Line::new(
        Point::new(left + 1, body_top - 1),
        Point::new(right - 1, body_top - 1),
    )
    .into_styled(stroke())
    .draw(canvas);
    let _ = Line::new(
        Point::new(cx - 1, body_top - 2),
        Point::new(cx + 1, body_top - 2),
    )
    .into_styled(stroke())
    .draw(canvas);
    // Handles.
    let _ = Line::new(
        Point::new(left - 1, body_top + 1),
        Point::new(left - 1, s - 2),
    )
    .into_styled(stroke())
    .draw(canvas);
    let _ = Line::new(
        Point::new(right + 1, body_top + 1),
        Point::new(right + 1, s - 2),
    )
    .into_styled(stroke())
    .draw(canvas);
    // Steam.
    for dx in [-2, 0, 2] {
        let _ = Line::new(
            Point::new(cx + dx, 1),
            Point::new(cx + dx, body_top - 3),
        )
        .into_styled(stroke())
        .draw(canvas);
    }
}

/// Disc with the lit portion of an 8-step phase filled in.
///
/// The terminator is approximated by scaling each row's half-width with the
/// cosine of the phase angle; waxing phases light up from the right.
fn draw_moon_disc(canvas: &mut Canvas, size: u32, index: u8) {
    let s = size as i32;
    let c = (s - 1) as f64 / 2.0;
    let r = c - 1.0;
    let index = index & 7;
    let cos_phase = (f64::from(index) / 8.0 * std::f64::consts::TAU).cos();
    for y in 0..s {
        for x in 0..s {
            let dx = f64::from(x) - c;
            let dy = f64::from(y) - c;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > r {
                continue;
            }
            let on_rim = dist > r - 1.2;
            let half_width = (r * r - dy * dy).max(0.0).sqrt();
            let lit = match index {
                0 => false,
                4 => true,
                1..=3 => dx >= cos_phase * half_width,
                _ => dx <= -cos_phase * half_width,
            };
            if lit || on_rim {
                canvas.set_pixel(x, y, Rgb888::BLACK);
            }
        }
    }
}

/// Warning triangle with an exclamation mark. Two-colored, so it is drawn
/// directly instead of going through the stamp cache.
pub fn draw_alert(canvas: &mut Canvas, x: i32, y: i32, size: u32, color: Rgb888) {
    let s = size.max(10) as i32;
    let _ = Triangle::new(
        Point::new(x + s / 2, y),
        Point::new(x, y + s - 1),
        Point::new(x + s - 1, y + s - 1),
    )
    .into_styled(PrimitiveStyle::with_fill(color))
    .draw(canvas);
    let cx = x + s / 2;
    let _ = Line::new(Point::new(cx, y + 3), Point::new(cx, y + s - 5))
        .into_styled(PrimitiveStyle::with_stroke(Rgb888::BLACK, 1))
        .draw(canvas);
    canvas.set_pixel(cx, y + s - 3, Rgb888::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped_pixels(kind: IconKind, size: u32) -> usize {
        let mut cache = IconCache::new();
        let mut canvas = Canvas::new(size + 4, size + 4);
        cache.draw(&mut canvas, kind, Point::new(2, 2), size, Rgb888::RED);
        let mut count = 0;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.pixel(x, y) == Rgb888::RED {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_every_kind_draws_something() {
        let kinds = [
            IconKind::Sun,
            IconKind::ClearNight,
            IconKind::PartlyCloudy,
            IconKind::Cloud,
            IconKind::Drizzle,
            IconKind::Rain,
            IconKind::Thunder,
            IconKind::Snow,
            IconKind::Fog,
            IconKind::Sunrise,
            IconKind::Sunset,
            IconKind::Wind,
            IconKind::Raindrop,
            IconKind::Refresh,
            IconKind::Cutlery,
            IconKind::MoonPhase(3),
        ];
        for kind in kinds {
            assert!(stamped_pixels(kind, 24) > 0, "{:?} drew nothing", kind);
        }
    }

    #[test]
    fn test_condition_icon_mapping() {
        assert_eq!(condition_icon("01d"), IconKind::Sun);
        assert_eq!(condition_icon("04n"), IconKind::Cloud);
        assert_eq!(condition_icon("10d"), IconKind::Rain);
        assert_eq!(condition_icon("bogus"), IconKind::Cloud);
    }

    #[test]
    fn test_moon_phase_fill_ordering() {
        // A fuller phase lights strictly more pixels than a crescent.
        let crescent = stamped_pixels(IconKind::MoonPhase(1), 20);
        let quarter = stamped_pixels(IconKind::MoonPhase(2), 20);
        let full = stamped_pixels(IconKind::MoonPhase(4), 20);
        let new = stamped_pixels(IconKind::MoonPhase(0), 20);
        assert!(new < crescent);
        assert!(crescent < quarter);
        assert!(quarter < full);
    }

    #[test]
    fn test_cache_reuses_stamps() {
        let mut cache = IconCache::new();
        let mut canvas = Canvas::new(64, 64);
        cache.draw(&mut canvas, IconKind::Sun, Point::new(0, 0), 24, Rgb888::BLACK);
        cache.draw(&mut canvas, IconKind::Sun, Point::new(32, 0), 24, Rgb888::RED);
        cache.draw(&mut canvas, IconKind::Sun, Point::new(0, 32), 16, Rgb888::BLACK);
        assert_eq!(cache.stamps.len(), 2);
    }

    #[test]
    fn test_stamp_is_deterministic() {
        let a = render_stamp(IconKind::Thunder, 24);
        let b = render_stamp(IconKind::Thunder, 24);
        assert_eq!(a.mask, b.mask);
    }

    #[test]
    fn test_alert_triangle() {
        let mut canvas = Canvas::new(20, 20);
        draw_alert(&mut canvas, 2, 2, 14, Rgb888::new(200, 0, 0));
        // Apex area is colored, exclamation column is black.
        assert_eq!(canvas.pixel(9, 14), Rgb888::new(200, 0, 0));
        assert_eq!(canvas.pixel(9, 6), Rgb888::BLACK);
    }
}
