//! Weather band: text summary on top, temperature/precipitation chart below.

use chrono::Timelike;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Triangle};

use super::chart;
use super::icons::{self, IconCache, IconKind};
use super::{draw_text, Region, RenderInput, NOTE_FONT, TEXT_FONT, TITLE_FONT, VALUE_FONT};
use crate::astro;
use crate::canvas::{self, Canvas};
use crate::config::RenderConfig;
use crate::locale;

pub(super) fn draw(
    canvas: &mut Canvas,
    region: Region,
    config: &RenderConfig,
    icons: &mut IconCache,
    input: &RenderInput,
) {
    let summary_h = region.height() * 44 / 100;
    let summary_region = Region {
        y1: region.y0 + summary_h,
        ..region
    };
    let chart_region = Region {
        y0: region.y0 + summary_h,
        ..region
    };
    draw_summary(canvas, summary_region, config, icons, input);
    chart::draw(canvas, chart_region, config, input);
}

fn condition_color(code: &str, colored: bool) -> Rgb888 {
    if !colored {
        return Rgb888::BLACK;
    }
    match code {
        "09d" | "10d" | "09n" | "10n" => Rgb888::new(0, 80, 200),
        "11d" | "11n" => Rgb888::new(120, 0, 120),
        "01d" => Rgb888::new(255, 170, 0),
        "01n" => Rgb888::new(120, 0, 180),
        "13d" | "13n" => Rgb888::new(0, 120, 200),
        _ => Rgb888::new(60, 60, 60),
    }
}

/// Min/max strings: when both round to the same integer but actually differ,
/// show one decimal so the pair does not read as equal.
fn min_max_strings(tmin: f64, tmax: f64) -> (String, String) {
    if tmin.round() == tmax.round() && (tmax - tmin).abs() >= 0.2 {
        (format!("{:.1}°C", tmin), format!("{:.1}°C", tmax))
    } else {
        (format!("{:.0}°C", tmin), format!("{:.0}°C", tmax))
    }
}

fn draw_summary(
    canvas: &mut Canvas,
    region: Region,
    config: &RenderConfig,
    icons: &mut IconCache,
    input: &RenderInput,
) {
    let summary = input.summary;
    let lang = config.lang();
    let fontsize = config.fontsize as i32;

    let line_gap = fontsize * 11 / 10;
    let line1_y = region.y0 + 6;
    let line2_y = line1_y + line_gap;
    let line3_y = line2_y + line_gap;

    // Condition icon on the far left, centered across the three lines.
    let icon_size = (fontsize * 2) as u32;
    let icon_color = condition_color(&summary.icon, config.color_conditions);
    let lines_center = line1_y + (line3_y - line1_y + line_gap) / 2;
    icons.draw(
        canvas,
        icons::condition_icon(&summary.icon),
        Point::new(region.x0 + 4, lines_center - icon_size as i32 / 2 - fontsize / 3),
        icon_size,
        icon_color,
    );

    let text_left = region.x0 + 66;
    let sun_col_x = region.x0 + region.width() * 40 / 100;
    let right_x = region.x0 + region.width() * 70 / 100;

    let (sun_color, precip_color, wind_color, moon_color, max_color, min_color) =
        if config.color_conditions {
            (
                Rgb888::new(160, 60, 0),
                Rgb888::new(0, 80, 200),
                Rgb888::new(0, 120, 0),
                Rgb888::new(130, 0, 180),
                Rgb888::new(180, 0, 0),
                Rgb888::new(0, 70, 170),
            )
        } else {
            (
                Rgb888::BLACK,
                Rgb888::BLACK,
                Rgb888::BLACK,
                Rgb888::BLACK,
                Rgb888::BLACK,
                Rgb888::BLACK,
            )
        };

    // Current temperature and condition text in the left column.
    let mut temp_str = String::new();
    let mut temp_y = line1_y;
    let status_y;
    if config.show_current_temp {
        temp_str = format!("{:.0}°C", summary.temp_now);
        let temp_h = TITLE_FONT.character_size.height as i32;
        temp_y = (line1_y + line2_y) / 2 - temp_h / 2 + fontsize / 4;
        draw_text(canvas, &temp_str, text_left, temp_y, TITLE_FONT, Rgb888::BLACK);
        status_y = line3_y - 2;
    } else {
        status_y = line1_y - 2;
    }

    let status = locale::condition_text(&summary.condition_text, &lang);
    let max_status_w = ((right_x - 12) - text_left).max(10) as u32;
    if !status.is_empty() {
        if canvas::text_width(VALUE_FONT, &status) <= max_status_w {
            draw_text(canvas, &status, text_left, status_y, VALUE_FONT, Rgb888::BLACK);
        } else {
            let lines = canvas::wrap_text(TEXT_FONT, &status, max_status_w);
            let line_h = TEXT_FONT.character_size.height as i32 + 1;
            match lines.as_slice() {
                [] => {}
                [only] => {
                    let only = canvas::truncate_text(TEXT_FONT, only, max_status_w);
                    draw_text(canvas, &only, text_left, status_y, TEXT_FONT, Rgb888::BLACK);
                }
                [first, second, ..] => {
                    draw_text(canvas, first, text_left, status_y - line_h, TEXT_FONT, Rgb888::BLACK);
                    let second = canvas::truncate_text(TEXT_FONT, second, max_status_w);
                    draw_text(canvas, &second, text_left, status_y, TEXT_FONT, Rgb888::BLACK);
                }
            }
        }
    }

    // Sunrise / sunset / moon in the middle column.
    let glyph_size = fontsize as u32;
    if let Some(sunrise) = summary.sunrise {
        icons.draw(
            canvas,
            IconKind::Sunrise,
            Point::new(sun_col_x, line1_y - 1),
            glyph_size,
            sun_color,
        );
        let time = format!("{:02}:{:02}", sunrise.hour(), sunrise.minute());
        let time_x = sun_col_x + glyph_size as i32 + 4;
        draw_text(canvas, &time, time_x, line1_y, VALUE_FONT, sun_color);
        if config.show_suntime {
            if let Some(hours) = summary.sunshine_hours {
                let note = format!(" ({})", locale::format_suntime(hours, &lang));
                let main_w = canvas::text_width(VALUE_FONT, &time) as i32;
                draw_text(canvas, &note, time_x + main_w + 3, line1_y + 5, NOTE_FONT, sun_color);
            }
        }
    }
    if let Some(sunset) = summary.sunset {
        icons.draw(
            canvas,
            IconKind::Sunset,
            Point::new(sun_col_x, line2_y - 1),
            glyph_size,
            sun_color,
        );
        let time = format!("{:02}:{:02}", sunset.hour(), sunset.minute());
        draw_text(
            canvas,
            &time,
            sun_col_x + glyph_size as i32 + 4,
            line2_y,
            VALUE_FONT,
            sun_color,
        );
    }

    let moon_index = astro::moon_phase_index(input.now);
    icons.draw(
        canvas,
        IconKind::MoonPhase(moon_index),
        Point::new(sun_col_x + 5, line3_y - 1),
        glyph_size,
        moon_color,
    );
    let moon_name_x = sun_col_x + glyph_size as i32 + 11;
    let max_moon_w = ((right_x - 6) - moon_name_x).max(0) as u32;
    let moon_name = canvas::truncate_text(
        VALUE_FONT,
        locale::moon_phase_name(moon_index, &lang),
        max_moon_w,
    );
    draw_text(canvas, &moon_name, moon_name_x, line3_y, VALUE_FONT, moon_color);

    // Right column: min/max, precipitation, wind.
    let (tmin_str, tmax_str) = min_max_strings(summary.temp_min, summary.temp_max);
    draw_arrow(canvas, right_x, line1_y, fontsize, true, max_color);
    draw_text(canvas, &tmax_str, right_x + 14, line1_y, VALUE_FONT, max_color);
    draw_arrow(canvas, right_x + 60, line1_y, fontsize, false, min_color);
    draw_text(canvas, &tmin_str, right_x + 74, line1_y, VALUE_FONT, min_color);

    let pop = summary.precip_probability_max.round() as i64;
    let precip_glyph = if summary.icon.starts_with("13") {
        IconKind::Snow
    } else {
        IconKind::Raindrop
    };
    icons.draw(
        canvas,
        precip_glyph,
        Point::new(right_x, line2_y - 2),
        glyph_size,
        precip_color,
    );
    let precip_text_x = right_x + glyph_size as i32 + 6;
    let precip_main = format!("{}%", pop);
    let precip_note = format!(" ({} mm/h)", locale::format_rate(summary.precip_rate_now, &lang));
    draw_text(canvas, &precip_main, precip_text_x, line2_y, VALUE_FONT, precip_color);
    let precip_main_w = canvas::text_width(VALUE_FONT, &precip_main) as i32;
    draw_text(
        canvas,
        &precip_note,
        precip_text_x + precip_main_w + 3,
        line2_y + 5,
        NOTE_FONT,
        precip_color,
    );

    icons.draw(
        canvas,
        IconKind::Wind,
        Point::new(right_x, line3_y - 2),
        glyph_size,
        wind_color,
    );
    let wind_text = format!("{:.0} km/h", summary.wind_max * 3.6);
    let wind_text_x = right_x + glyph_size as i32 + 6;
    draw_text(canvas, &wind_text, wind_text_x, line3_y, VALUE_FONT, wind_color);

    // Warning markers last so nothing overlaps them. Each focus anchors next
    // to the value it concerns; generic markers sit next to the temperature.
    let min_w = canvas::text_width(VALUE_FONT, &tmin_str) as i32;
    let max_w = canvas::text_width(VALUE_FONT, &tmax_str) as i32;
    let precip_note_w = canvas::text_width(NOTE_FONT, &precip_note) as i32;
    let wind_text_w = canvas::text_width(VALUE_FONT, &wind_text) as i32;
    let mut focus_counts: std::collections::HashMap<Option<crate::weather::Focus>, i32> =
        std::collections::HashMap::new();
    for marker in &summary.warning_markers {
        use crate::weather::Focus;
        let focused = marker.focus.is_some();
        let warn_size = if focused {
            fontsize * 74 / 100
        } else {
            fontsize
        };
        let idx = *focus_counts.entry(marker.focus).or_insert(0);
        focus_counts.insert(marker.focus, idx + 1);
        let (mut warn_x, mut warn_y) = match marker.focus {
            Some(Focus::MinTemp) => (right_x + 74 + min_w + 4 + idx * (warn_size + 2), line1_y + 1),
            Some(Focus::MaxTemp) => (right_x + 14 + max_w + 4 + idx * (warn_size + 2), line1_y + 1),
            Some(Focus::Precip) => (
                precip_text_x + precip_main_w + precip_note_w + 4 + idx * (warn_size + 2),
                line2_y + 1,
            ),
            Some(Focus::Wind) => (
                wind_text_x + wind_text_w + 4 + idx * (warn_size + 2),
                line3_y + 1,
            ),
            None => {
                if config.show_current_temp {
                    let temp_w = canvas::text_width(TITLE_FONT, &temp_str) as i32;
                    (text_left + temp_w + 12 + idx * (warn_size + 3), temp_y + 5)
                } else {
                    (text_left + 6 + idx * (warn_size + 3), line1_y + 1)
                }
            }
        };
        warn_x = warn_x.clamp(region.x0 + 2, region.x1 - warn_size - 2);
        warn_y = warn_y.clamp(region.y0 + 1, region.y1 - warn_size - 1);
        icons::draw_alert(canvas, warn_x, warn_y, warn_size as u32, marker.color);
    }
}

/// Small solid up/down arrow for the min/max temperatures.
fn draw_arrow(canvas: &mut Canvas, x: i32, y: i32, fontsize: i32, up: bool, color: Rgb888) {
    let s = (fontsize / 2).max(6);
    let style = PrimitiveStyle::with_fill(color);
    let triangle = if up {
        Triangle::new(
            Point::new(x + s / 2, y + 2),
            Point::new(x, y + s),
            Point::new(x + s, y + s),
        )
    } else {
        Triangle::new(
            Point::new(x, y + 2),
            Point::new(x + s, y + 2),
            Point::new(x + s / 2, y + s),
        )
    };
    let _ = triangle.into_styled(style).draw(canvas);
}
