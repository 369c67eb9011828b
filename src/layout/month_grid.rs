//! Month grid band: a scrolling multi-week calendar with ISO week numbers,
//! weekend tinting, principal moon phases, and per-day event markers.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle};

use super::icons::{IconCache, IconKind};
use super::{draw_text, grid_start, Region, RenderInput, NOTE_FONT, TEXT_BOLD_FONT, VALUE_BOLD_FONT};
use crate::astro;
use crate::canvas::{self, Canvas};
use crate::config::RenderConfig;
use crate::events::CalendarEvent;
use crate::locale;

const TODAY_FILL: Rgb888 = Rgb888::new(220, 0, 0);
const WEEKEND_FILL: Rgb888 = Rgb888::new(220, 220, 220);
const MOON_COLOR: Rgb888 = Rgb888::new(130, 0, 180);

/// Cell and column measurements for one grid render.
struct Grid {
    week_col_w: i32,
    day_col_w: i32,
    header_h: i32,
    row_h: i32,
}

impl Grid {
    fn new(region: Region, config: &RenderConfig) -> Self {
        let width = region.width();
        let height = region.height();
        let week_col_w = width * 8 / 100;
        let day_col_w = (width - week_col_w) / 7;
        let fontsize = config.fontsize as i32;
        let header_h = (fontsize * 22 / 10).max(height * 16 / 100);
        let weeks = config.weeks.max(1) as i32;
        let row_h = ((height - header_h) / weeks).max(fontsize * 14 / 10);
        Self { week_col_w, day_col_w, header_h, row_h }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// A principal phase (new, quarter, full) is marked on the day its index
/// first changes to one of the four principal values.
fn principal_phase_today(date: NaiveDate) -> Option<u8> {
    let noon = date.and_hms_opt(12, 0, 0)?;
    let index = astro::moon_phase_index(noon);
    let previous = astro::moon_phase_index(noon - Duration::days(1));
    if index != previous && astro::is_principal_phase(index) {
        Some(index)
    } else {
        None
    }
}

pub(super) fn draw(
    canvas: &mut Canvas,
    region: Region,
    config: &RenderConfig,
    icons: &mut IconCache,
    input: &RenderInput,
) {
    let grid = Grid::new(region, config);
    let lang = config.lang();
    let today = input.now.date();
    let start = grid_start(today, config.week_start, config.week_start_offset);

    // Weekday header, tinted over the weekend columns. The labels follow the
    // first grid row, so they rotate with the configured week start.
    for col in 0..7 {
        let date = start + Duration::days(i64::from(col));
        let cell_x = region.x0 + grid.week_col_w + col * grid.day_col_w;
        if is_weekend(date) {
            let _ = Rectangle::new(
                Point::new(cell_x, region.y0),
                Size::new(grid.day_col_w as u32, grid.header_h as u32),
            )
            .into_styled(PrimitiveStyle::with_fill(WEEKEND_FILL))
            .draw(canvas);
        }
        let label = locale::weekday_abbrev(date.weekday(), &lang);
        let w = canvas::text_width(VALUE_BOLD_FONT, label) as i32;
        let h = VALUE_BOLD_FONT.character_size.height as i32;
        draw_text(
            canvas,
            label,
            cell_x + (grid.day_col_w - w) / 2,
            region.y0 + ((grid.header_h - h) / 2).max(4),
            VALUE_BOLD_FONT,
            Rgb888::BLACK,
        );
    }

    for week in 0..config.weeks.max(1) as i32 {
        let week_start = start + Duration::weeks(i64::from(week));
        let row_y = region.y0 + grid.header_h + week * grid.row_h;
        if row_y + grid.row_h > region.y1 {
            break;
        }

        let week_num = week_start.iso_week().week().to_string();
        let ww = canvas::text_width(NOTE_FONT, &week_num) as i32;
        draw_text(
            canvas,
            &week_num,
            region.x0 + (grid.week_col_w - ww) / 2,
            row_y + grid.row_h * 35 / 100,
            NOTE_FONT,
            Rgb888::BLACK,
        );

        for col in 0..7 {
            let date = week_start + Duration::days(i64::from(col));
            let cell_x = region.x0 + grid.week_col_w + col * grid.day_col_w;
            let origin = Point::new(cell_x, row_y);
            draw_cell(canvas, config, icons, input, &grid, origin, date, &lang);
        }
    }
}

fn draw_cell(
    canvas: &mut Canvas,
    config: &RenderConfig,
    icons: &mut IconCache,
    input: &RenderInput,
    grid: &Grid,
    origin: Point,
    date: NaiveDate,
    lang: &str,
) {
    let cell_x = origin.x;
    let cell_y = origin.y;
    if is_weekend(date) {
        let _ = Rectangle::new(
            Point::new(cell_x, cell_y),
            Size::new(grid.day_col_w as u32, grid.row_h as u32),
        )
        .into_styled(PrimitiveStyle::with_fill(WEEKEND_FILL))
        .draw(canvas);
    }

    let day_num = if config.month_label_first_day && date.day() == 1 {
        locale::month_abbrev(date.month(), lang)
    } else {
        date.day().to_string()
    };
    let w = canvas::text_width(TEXT_BOLD_FONT, &day_num) as i32;
    let h = TEXT_BOLD_FONT.character_size.height as i32;
    if date == input.now.date() {
        let r = (grid.day_col_w.min(grid.row_h) * 28 / 100).max(2);
        let cx = cell_x + grid.day_col_w / 2;
        let cy = cell_y + grid.row_h * 35 / 100;
        let _ = Circle::with_center(Point::new(cx, cy), (r * 2 + 1) as u32)
            .into_styled(PrimitiveStyle::with_fill(TODAY_FILL))
            .draw(canvas);
        draw_text(canvas, &day_num, cx - w / 2, cy - h / 2, TEXT_BOLD_FONT, Rgb888::WHITE);
    } else {
        draw_text(
            canvas,
            &day_num,
            cell_x + (grid.day_col_w - w) / 2,
            cell_y + 4,
            TEXT_BOLD_FONT,
            Rgb888::BLACK,
        );
    }

    if config.calendar_show_moon {
        if let Some(index) = principal_phase_today(date) {
            let size = (config.fontsize / 2).max(8);
            let moon_x = cell_x + grid.day_col_w - size as i32 - 6;
            icons.draw(
                canvas,
                IconKind::MoonPhase(index),
                Point::new(moon_x, cell_y + 1),
                size,
                MOON_COLOR,
            );
        }
    }

    if let Some(indices) = input.day_map.get(&date) {
        draw_markers(canvas, icons, input.events, indices, grid, cell_x, cell_y);
    }
}

/// Up to four event markers per cell: cutlery for meal feeds, a square for
/// all-day events, a dot for timed ones. Recurring non-meal events get a
/// white center.
fn draw_markers(
    canvas: &mut Canvas,
    icons: &mut IconCache,
    events: &[CalendarEvent],
    indices: &[usize],
    grid: &Grid,
    cell_x: i32,
    cell_y: i32,
) {
    let dot_r = 4;
    let shown = indices.len().min(4) as i32;
    if shown == 0 {
        return;
    }
    let dot_y = cell_y + grid.row_h - 18;
    let total_w = shown * (dot_r * 2 + 2) - 2;
    let start_x = cell_x + grid.day_col_w / 2 - total_w / 2;

    for (slot, &index) in indices.iter().take(shown as usize).enumerate() {
        let event = &events[index];
        let dx = start_x + slot as i32 * (dot_r * 2 + 2);
        if event.is_meals {
            let size = (dot_r * 2 + 3) as u32;
            icons.draw(
                canvas,
                IconKind::Cutlery,
                Point::new(dx + dot_r - size as i32 / 2, dot_y + dot_r - 1 - size as i32 / 2),
                size,
                event.feed_color,
            );
            continue;
        }
        if event.is_all_day() {
            let _ = Rectangle::new(
                Point::new(dx, dot_y),
                Size::new((dot_r * 2 + 1) as u32, (dot_r * 2 + 1) as u32),
            )
            .into_styled(PrimitiveStyle::with_fill(event.feed_color))
            .draw(canvas);
        } else {
            let _ = Circle::new(Point::new(dx, dot_y), (dot_r * 2 + 1) as u32)
                .into_styled(PrimitiveStyle::with_fill(event.feed_color))
                .draw(canvas);
        }
        if event.is_recurring {
            let inner_r = (dot_r - 2).max(1);
            let ix = dx + dot_r - inner_r;
            let iy = dot_y + dot_r - inner_r;
            if event.is_all_day() {
                let _ = Rectangle::new(
                    Point::new(ix, iy),
                    Size::new((inner_r * 2 + 1) as u32, (inner_r * 2 + 1) as u32),
                )
                .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
                .draw(canvas);
            } else {
                let _ = Circle::new(Point::new(ix, iy), (inner_r * 2 + 1) as u32)
                    .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
                    .draw(canvas);
            }
        }
    }
}
