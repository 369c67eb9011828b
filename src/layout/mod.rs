//! Canvas composition.
//!
//! One render partitions the canvas into four horizontal bands (header,
//! weather, month grid, agenda) and hands each to its drawing routine. All
//! positioning is integer math over the configured canvas size, and every
//! dynamic string is measured before it is drawn, so identical inputs always
//! compose an identical canvas.

mod agenda_panel;
mod chart;
mod icons;
mod month_grid;
mod weather_panel;

pub use icons::IconCache;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use embedded_graphics::mono_font::iso_8859_1::{
    FONT_10X20, FONT_6X10, FONT_7X13, FONT_7X13_BOLD, FONT_9X15, FONT_9X15_BOLD,
};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::canvas::{self, Canvas};
use crate::config::{RenderConfig, WeekStart};
use crate::events::{CalendarEvent, DayMap};
use crate::locale;
use crate::weather::{HourlySample, WeatherSummary};

pub(crate) const TITLE_FONT: &MonoFont<'static> = &FONT_10X20;
pub(crate) const VALUE_FONT: &MonoFont<'static> = &FONT_9X15;
pub(crate) const VALUE_BOLD_FONT: &MonoFont<'static> = &FONT_9X15_BOLD;
pub(crate) const TEXT_FONT: &MonoFont<'static> = &FONT_7X13;
pub(crate) const TEXT_BOLD_FONT: &MonoFont<'static> = &FONT_7X13_BOLD;
pub(crate) const NOTE_FONT: &MonoFont<'static> = &FONT_6X10;

/// Axis-aligned sub-area of the canvas, endpoints exclusive on the right
/// and bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Region {
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}

/// The four content bands, proportional to canvas height.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bands {
    pub header: Region,
    pub weather: Region,
    pub grid: Region,
    pub agenda: Region,
}

impl Bands {
    pub fn split(width: u32, height: u32) -> Self {
        let w = width as i32;
        let h = height as i32;
        let header_h = h * 6 / 100;
        let weather_h = h * 30 / 100;
        let grid_h = h * 39 / 100;
        let agenda_h = h - header_h - weather_h - grid_h - 4;

        let mut y = 0;
        let header = Region { x0: 0, y0: y, x1: w, y1: y + header_h };
        y += header_h + 1;
        let weather = Region { x0: 0, y0: y, x1: w, y1: y + weather_h };
        y += weather_h + 2;
        let grid = Region { x0: 0, y0: y, x1: w, y1: y + grid_h };
        y += grid_h + 2;
        let agenda = Region { x0: 0, y0: y, x1: w, y1: y + agenda_h };
        Self { header, weather, grid, agenda }
    }
}

/// First date shown in the month grid: start of the current week, shifted
/// by the configured week offset.
pub(crate) fn grid_start(today: NaiveDate, week_start: WeekStart, offset_weeks: i64) -> NaiveDate {
    let back = match week_start {
        WeekStart::Monday => today.weekday().num_days_from_monday(),
        WeekStart::Sunday => today.weekday().num_days_from_sunday(),
    };
    today - Duration::days(i64::from(back)) + Duration::weeks(offset_weeks)
}

/// Draw `text` with its top-left corner at (x, y).
pub(crate) fn draw_text(
    canvas: &mut Canvas,
    text: &str,
    x: i32,
    y: i32,
    font: &'static MonoFont<'static>,
    color: Rgb888,
) {
    let style = MonoTextStyle::new(font, color);
    let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(canvas);
}

/// Everything one render needs besides the configuration.
pub struct RenderInput<'a> {
    pub summary: &'a WeatherSummary,
    pub hourly: &'a [HourlySample],
    pub events: &'a [CalendarEvent],
    pub day_map: &'a DayMap,
    pub agenda: &'a DayMap,
    pub now: NaiveDateTime,
    pub battery_percent: Option<f32>,
    pub fallback_used: bool,
}

/// Composes render inputs into a canvas. Holds the icon stamp cache, so one
/// engine should be reused across renders.
pub struct LayoutEngine {
    config: RenderConfig,
    icons: IconCache,
}

impl LayoutEngine {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            icons: IconCache::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Compose one full frame.
    pub fn render(&mut self, input: &RenderInput) -> Canvas {
        let mut canvas = Canvas::new(self.config.width, self.config.height);
        let bands = Bands::split(self.config.width, self.config.height);

        self.draw_header(&mut canvas, bands.header, input.now);
        weather_panel::draw(
            &mut canvas,
            bands.weather,
            &self.config,
            &mut self.icons,
            input,
        );
        month_grid::draw(&mut canvas, bands.grid, &self.config, &mut self.icons, input);
        agenda_panel::draw(&mut canvas, bands.agenda, &self.config, &mut self.icons, input);
        self.draw_footer(&mut canvas, input);
        canvas
    }

    fn draw_header(&self, canvas: &mut Canvas, region: Region, now: NaiveDateTime) {
        let lang = self.config.lang();
        let title = locale::format_datetime(now, &self.config.title_format, &lang);
        let title = canvas::truncate_text(TITLE_FONT, &title, region.width() as u32);
        let w = canvas::text_width(TITLE_FONT, &title) as i32;
        let x = region.x0 + (region.width() - w) / 2;
        draw_text(canvas, &title, x, region.y0, TITLE_FONT, Rgb888::BLACK);
    }

    /// Bottom-right footer: refresh glyph + last-updated text (+ fallback
    /// notice) and the battery gauge when charge is low.
    fn draw_footer(&mut self, canvas: &mut Canvas, input: &RenderInput) {
        let config = &self.config;
        let lang = config.lang();
        let w = config.width as i32;
        let h = config.height as i32;

        let mut text = if config.show_last_updated {
            locale::format_datetime(input.now, &config.last_updated_format, &lang)
        } else {
            String::new()
        };
        if config.show_weather_fallback_info && input.fallback_used {
            let notice = locale::fallback_notice(&lang);
            if text.is_empty() {
                text = notice.to_string();
            } else {
                text = format!("{} | {}", text, notice);
            }
        }

        let show_battery = input
            .battery_percent
            .map(|p| p <= config.battery_show_below)
            .unwrap_or(false);
        if text.is_empty() && !show_battery {
            return;
        }

        let batt_w = 38;
        let batt_h = 16;
        let batt_pad = 6;
        let icon_size = 10;

        let mut text_w = 0;
        if !text.is_empty() {
            let reserved = if show_battery { batt_w + batt_pad } else { 0 };
            let max_text_w = (w - 12 - reserved - (icon_size + 4)).max(40);
            text = canvas::truncate_text(NOTE_FONT, &text, max_text_w as u32);
            text_w = canvas::text_width(NOTE_FONT, &text) as i32;
        }
        let total_w = if text.is_empty() { 0 } else { icon_size + 4 + text_w }
            + if show_battery {
                batt_w + if text.is_empty() { 0 } else { batt_pad }
            } else {
                0
            };

        let mut x = w - total_w - 4;
        let y = h - (self.config.fontsize as i32 * 9 / 10) - 1;

        if !text.is_empty() {
            self.icons.draw(
                canvas,
                icons::IconKind::Refresh,
                Point::new(x, y - 1),
                icon_size as u32,
                Rgb888::BLACK,
            );
            x += icon_size + 4;
            draw_text(canvas, &text, x, y, NOTE_FONT, Rgb888::BLACK);
            x += text_w + batt_pad;
        }

        if show_battery {
            let percent = input.battery_percent.unwrap_or(0.0);
            draw_battery(canvas, x, y, batt_w, batt_h, percent);
        }
    }
}

/// Battery outline with terminal, proportional fill, and percent readout.
fn draw_battery(canvas: &mut Canvas, x: i32, y: i32, w: i32, h: i32, percent: f32) {
    let outline = PrimitiveStyle::with_stroke(Rgb888::BLACK, 1);
    let _ = Rectangle::new(Point::new(x, y), Size::new(w as u32 + 1, h as u32 + 1))
        .into_styled(outline)
        .draw(canvas);
    let _ = Rectangle::new(Point::new(x + w + 1, y + 4), Size::new(3, (h - 8).max(1) as u32))
        .into_styled(outline)
        .draw(canvas);

    let level = percent.clamp(0.0, 100.0) as i32;
    let fill_w = (w - 4) * level / 100;
    if fill_w > 0 {
        let _ = Rectangle::new(
            Point::new(x + 2, y + 2),
            Size::new(fill_w as u32 + 1, (h - 4).max(1) as u32 + 1),
        )
        .into_styled(PrimitiveStyle::with_fill(Rgb888::BLACK))
        .draw(canvas);
    }

    let label = format!("{}%", level);
    let lw = canvas::text_width(NOTE_FONT, &label) as i32;
    let lh = NOTE_FONT.character_size.height as i32;
    let color = if level > 40 { Rgb888::WHITE } else { Rgb888::BLACK };
    draw_text(
        canvas,
        &label,
        x + (w - lw) / 2,
        y + (h - lh) / 2,
        NOTE_FONT,
        color,
    );
}
