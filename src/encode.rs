//! Palette quantization and device frame serialization.
//!
//! The display firmware consumes a raw token stream: two 4-bit palette
//! indices packed per byte, emitted as uppercase hex pairs with a comma after
//! every value and a line break after every 16 values. No enclosing array
//! syntax, no identifiers. This exact textual shape is the wire contract and
//! must not change.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::canvas::Canvas;

/// The display's 6-color gamut, in raw palette order.
pub const PALETTE: [Rgb888; 6] = [
    Rgb888::new(0, 0, 0),
    Rgb888::new(255, 255, 255),
    Rgb888::new(255, 255, 0),
    Rgb888::new(255, 0, 0),
    Rgb888::new(0, 0, 255),
    Rgb888::new(0, 255, 0),
];

/// Raw index above which the device's color table has a hole.
///
/// The controller's fixed color table has no entry at slot 4, so every raw
/// index greater than 3 shifts up by one on the wire. This is a quirk of the
/// device, not part of quantization; keep the remap in [`device_index`] so a
/// port cannot silently "fix" it.
const SKIPPED_DEVICE_SLOT: u8 = 4;

/// Raw palette index (0..=5) nearest to `color` in RGB Euclidean distance.
///
/// Ties resolve to the lowest index (first minimum found).
pub fn nearest_palette_index(color: Rgb888) -> u8 {
    let mut best = 0u8;
    let mut best_dist = u32::MAX;
    for (i, entry) in PALETTE.iter().enumerate() {
        let dr = i32::from(color.r()) - i32::from(entry.r());
        let dg = i32::from(color.g()) - i32::from(entry.g());
        let db = i32::from(color.b()) - i32::from(entry.b());
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = i as u8;
        }
    }
    best
}

/// Map a raw palette index to the device's color-table index.
pub fn device_index(raw: u8) -> u8 {
    if raw >= SKIPPED_DEVICE_SLOT {
        raw + 1
    } else {
        raw
    }
}

/// Encode a composed canvas into the firmware's hex token stream.
///
/// Two horizontally adjacent pixels pack into one byte: high nibble is the
/// left pixel, low nibble the right one. An odd-width row leaves the last
/// low nibble zero.
pub fn encode(canvas: &Canvas) -> String {
    let width = canvas.width();
    let height = canvas.height();
    // Two pixels per byte, 3 output chars per byte plus newlines.
    let byte_count = (width as usize + 1) / 2 * height as usize;
    let mut out = String::with_capacity(byte_count * 3 + byte_count / 16 + 1);

    let mut emitted = 0usize;
    for y in 0..height {
        let mut x = 0;
        while x < width {
            let left = device_index(nearest_palette_index(canvas.pixel(x, y)));
            let right = if x + 1 < width {
                device_index(nearest_palette_index(canvas.pixel(x + 1, y)))
            } else {
                0
            };
            let byte = (left << 4) | right;
            out.push_str(&format!("{:02X},", byte));
            emitted += 1;
            if emitted % 16 == 0 {
                out.push('\n');
            }
            x += 2;
        }
    }
    out
}
