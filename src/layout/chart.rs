//! Temperature / precipitation chart in the lower weather band.
//!
//! Temperature draws as a polyline with a shaded min/max envelope on the
//! left axis; precipitation as bars on an independent right axis. Vertical
//! guides mark midnight and noon, day ticks carry weekday labels, and the
//! plot background is dimmed between sunset and sunrise.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};

use super::{draw_text, Region, RenderInput, NOTE_FONT};
use crate::canvas::{self, Canvas};
use crate::config::RenderConfig;
use crate::locale;
use crate::weather::HourlySample;

const TEMP_LINE: Rgb888 = Rgb888::new(155, 0, 25);
const TEMP_BAND: Rgb888 = Rgb888::new(240, 168, 168);
const TEMP_AXIS: Rgb888 = Rgb888::new(214, 40, 40);
const PRECIP_BAR: Rgb888 = Rgb888::new(7, 44, 122);
const PRECIP_AXIS: Rgb888 = Rgb888::new(29, 78, 216);
const NIGHT_SHADE: Rgb888 = Rgb888::new(196, 196, 196);
const DAY_GUIDE: Rgb888 = Rgb888::new(107, 107, 107);
const NOON_GUIDE: Rgb888 = Rgb888::new(163, 163, 163);
const ZERO_LINE: Rgb888 = Rgb888::new(138, 60, 60);

/// Snap a precipitation maximum up to the next "nice" axis bound from the
/// {1, 2, 2.5, 5, 10} × 10^n ladder.
pub(super) fn nice_upper_precip_bound(value: f64) -> f64 {
    let v = value.max(0.1);
    let exp = v.log10().floor();
    let scale = 10f64.powf(exp);
    let frac = v / scale;
    let nice = if frac <= 1.0 {
        1.0
    } else if frac <= 2.0 {
        2.0
    } else if frac <= 2.5 {
        2.5
    } else if frac <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * scale
}

/// Clip the series to the configured display window.
///
/// The window opens at "now" (or today's midnight when past hours are kept)
/// and spans at least six hours. An empty clip result falls back to the
/// whole series so the chart never goes blank.
pub(super) fn window_series<'a>(
    hourly: &'a [HourlySample],
    now: NaiveDateTime,
    display_hours: i64,
    include_past_hours: bool,
) -> Vec<&'a HourlySample> {
    if hourly.is_empty() {
        return Vec::new();
    }
    let data_min = hourly.iter().map(|s| s.timestamp).min().unwrap_or(now);
    let data_max = hourly.iter().map(|s| s.timestamp).max().unwrap_or(now);
    let open = if include_past_hours {
        now.date().and_hms_opt(0, 0, 0).unwrap_or(now)
    } else {
        now
    };
    let start = data_min.max(open);
    let end = data_max.min(start + Duration::hours(display_hours.max(6)));
    let windowed: Vec<&HourlySample> = hourly
        .iter()
        .filter(|s| s.timestamp >= start && s.timestamp <= end)
        .collect();
    if windowed.is_empty() {
        hourly.iter().collect()
    } else {
        windowed
    }
}

/// Pixel mapping for one composed chart.
struct Scale {
    plot: Region,
    start: NaiveDateTime,
    span_minutes: i64,
    tmin: f64,
    tmax: f64,
    pmax: f64,
}

impl Scale {
    fn new(plot: Region, series: &[&HourlySample], config: &RenderConfig) -> Self {
        let start = series
            .iter()
            .map(|s| s.timestamp)
            .min()
            .unwrap_or_default();
        let end = series
            .iter()
            .map(|s| s.timestamp)
            .max()
            .unwrap_or_default();
        let span_minutes = (end - start).num_minutes().max(1);

        let mut tmin = series.iter().map(|s| s.temp_min).fold(f64::MAX, f64::min);
        let mut tmax = series.iter().map(|s| s.temp_max).fold(f64::MIN, f64::max);
        if tmin == tmax {
            tmin -= 2.0;
            tmax += 2.0;
        }
        tmin -= 2.0;
        tmax += 2.0;

        let observed = series.iter().map(|s| s.precip_3h_mm).fold(0.0, f64::max);
        let pmax = if config.chart_auto_precip_max {
            nice_upper_precip_bound((observed * 1.15).max(1.0))
        } else {
            config.max_precip_mm.max(1.0)
        };

        Self { plot, start, span_minutes, tmin, tmax, pmax }
    }

    fn x(&self, at: NaiveDateTime) -> i32 {
        let minutes = (at - self.start).num_minutes();
        self.plot.x0 + (minutes * i64::from(self.plot.width() - 1) / self.span_minutes) as i32
    }

    fn temp_y(&self, value: f64) -> i32 {
        let frac = (value - self.tmin) / (self.tmax - self.tmin);
        self.plot.y1 - 1 - (frac * f64::from(self.plot.height() - 1)).round() as i32
    }

    fn precip_y(&self, value: f64) -> i32 {
        let frac = (value / self.pmax).clamp(0.0, 1.0);
        self.plot.y1 - 1 - (frac * f64::from(self.plot.height() - 1)).round() as i32
    }

    fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(self.span_minutes)
    }
}

pub(super) fn draw(
    canvas: &mut Canvas,
    region: Region,
    config: &RenderConfig,
    input: &RenderInput,
) {
    let series = window_series(
        input.hourly,
        input.now,
        config.chart_display_hours,
        config.chart_include_past_hours,
    );
    if series.is_empty() {
        return;
    }

    let plot = Region {
        x0: region.x0 + 26,
        y0: region.y0 + 4,
        x1: region.x1 - 26,
        y1: region.y1 - 14,
    };
    if plot.width() < 20 || plot.height() < 20 {
        return;
    }
    let scale = Scale::new(plot, &series, config);

    if config.chart_night_shading {
        draw_night_shading(canvas, &scale, input);
    }
    draw_precip_bars(canvas, &scale, &series);
    draw_temp_band(canvas, &scale, &series);
    draw_guides(canvas, &scale);
    draw_temp_line(canvas, &scale, &series);
    draw_axis_labels(canvas, &scale, region, config);
}

/// Dim [midnight, sunrise] and [sunset, midnight) for every day on the axis.
fn draw_night_shading(canvas: &mut Canvas, scale: &Scale, input: &RenderInput) {
    let (sunrise, sunset) = match (input.summary.sunrise, input.summary.sunset) {
        (Some(rise), Some(set)) => (rise, set),
        _ => return,
    };
    let mut day = scale.start.date();
    let last = scale.end().date();
    while day <= last {
        let day_start = day.and_hms_opt(0, 0, 0);
        let day_end = day.and_hms_opt(23, 59, 0);
        let rise = day.and_hms_opt(sunrise.hour(), sunrise.minute(), 0);
        let set = day.and_hms_opt(sunset.hour(), sunset.minute(), 0);
        if let (Some(day_start), Some(day_end), Some(rise), Some(set)) =
            (day_start, day_end, rise, set)
        {
            for (span_start, span_end) in [
                (day_start.max(scale.start), rise.min(scale.end())),
                (set.max(scale.start), day_end.min(scale.end())),
            ] {
                if span_start < span_end {
                    let x0 = scale.x(span_start);
                    let x1 = scale.x(span_end);
                    let _ = Rectangle::new(
                        Point::new(x0, scale.plot.y0),
                        Size::new((x1 - x0).max(1) as u32, scale.plot.height() as u32),
                    )
                    .into_styled(PrimitiveStyle::with_fill(NIGHT_SHADE))
                    .draw(canvas);
                }
            }
        }
        day += Duration::days(1);
    }
}

fn draw_precip_bars(canvas: &mut Canvas, scale: &Scale, series: &[&HourlySample]) {
    let min_step = series
        .windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp).num_minutes())
        .filter(|&m| m > 0)
        .min()
        .unwrap_or(60);
    let bar_w = ((min_step * i64::from(scale.plot.width() - 1) / scale.span_minutes) * 8 / 10)
        .max(1) as i32;
    for sample in series {
        if sample.precip_3h_mm <= 0.0 {
            continue;
        }
        let x = scale.x(sample.timestamp) - bar_w / 2;
        let top = scale.precip_y(sample.precip_3h_mm);
        let _ = Rectangle::new(
            Point::new(x, top),
            Size::new(bar_w as u32, (scale.plot.y1 - top).max(1) as u32),
        )
        .into_styled(PrimitiveStyle::with_fill(PRECIP_BAR))
        .draw(canvas);
    }
}

/// Vertical fill between the per-sample min and max temperatures.
fn draw_temp_band(canvas: &mut Canvas, scale: &Scale, series: &[&HourlySample]) {
    let style = PrimitiveStyle::with_fill(TEMP_BAND);
    for pair in series.windows(2) {
        let x0 = scale.x(pair[0].timestamp);
        let x1 = scale.x(pair[1].timestamp);
        for x in x0..=x1 {
            // Linear interpolation between the two samples at this column.
            let t = if x1 > x0 {
                f64::from(x - x0) / f64::from(x1 - x0)
            } else {
                0.0
            };
            let lo = pair[0].temp_min + (pair[1].temp_min - pair[0].temp_min) * t;
            let hi = pair[0].temp_max + (pair[1].temp_max - pair[0].temp_max) * t;
            let y_top = scale.temp_y(hi);
            let y_bottom = scale.temp_y(lo);
            if y_bottom >= y_top {
                let _ = Rectangle::new(
                    Point::new(x, y_top),
                    Size::new(1, (y_bottom - y_top + 1) as u32),
                )
                .into_styled(style)
                .draw(canvas);
            }
        }
    }
}

fn draw_guides(canvas: &mut Canvas, scale: &Scale) {
    let day_style = PrimitiveStyle::with_stroke(DAY_GUIDE, 1);
    let noon_style = PrimitiveStyle::with_stroke(NOON_GUIDE, 1);

    let mut day = scale.start.date();
    let last = scale.end().date();
    while day <= last {
        for (hour, style) in [(0, day_style), (12, noon_style)] {
            if let Some(at) = day.and_hms_opt(hour, 0, 0) {
                if at >= scale.start && at <= scale.end() {
                    let x = scale.x(at);
                    let _ = Line::new(
                        Point::new(x, scale.plot.y0),
                        Point::new(x, scale.plot.y1 - 1),
                    )
                    .into_styled(style)
                    .draw(canvas);
                }
            }
        }
        day += Duration::days(1);
    }

    // 0°C reference, only when it is on scale.
    if scale.tmin < 0.0 && scale.tmax > 0.0 {
        let y = scale.temp_y(0.0);
        let _ = Line::new(
            Point::new(scale.plot.x0, y),
            Point::new(scale.plot.x1 - 1, y),
        )
        .into_styled(PrimitiveStyle::with_stroke(ZERO_LINE, 1))
        .draw(canvas);
    }
}

fn draw_temp_line(canvas: &mut Canvas, scale: &Scale, series: &[&HourlySample]) {
    let style = PrimitiveStyle::with_stroke(TEMP_LINE, 2);
    for pair in series.windows(2) {
        let a = Point::new(scale.x(pair[0].timestamp), scale.temp_y(pair[0].temperature));
        let b = Point::new(scale.x(pair[1].timestamp), scale.temp_y(pair[1].temperature));
        let _ = Line::new(a, b).into_styled(style).draw(canvas);
    }
    // Sample markers on top of the line.
    for sample in series {
        let p = Point::new(scale.x(sample.timestamp), scale.temp_y(sample.temperature));
        let _ = Rectangle::new(Point::new(p.x - 1, p.y - 1), Size::new(3, 3))
            .into_styled(PrimitiveStyle::with_fill(TEMP_LINE))
            .draw(canvas);
    }
}

fn draw_axis_labels(canvas: &mut Canvas, scale: &Scale, region: Region, config: &RenderConfig) {
    let lang = config.lang();

    // Temperature ticks left: bottom, middle, top of the padded range.
    for frac in [0.0, 0.5, 1.0] {
        let value = scale.tmin + (scale.tmax - scale.tmin) * frac;
        let label = format!("{:.0}", value.round());
        let y = scale.temp_y(value) - NOTE_FONT.character_size.height as i32 / 2;
        let w = canvas::text_width(NOTE_FONT, &label) as i32;
        draw_text(canvas, &label, scale.plot.x0 - w - 2, y, NOTE_FONT, TEMP_AXIS);
    }

    // Precipitation ticks right; 5 mm gets the traditional 2.5 split.
    let precip_ticks: [f64; 3] = if (scale.pmax - 5.0).abs() < 0.01 {
        [0.0, 2.5, 5.0]
    } else {
        [0.0, scale.pmax / 2.0, scale.pmax]
    };
    for value in precip_ticks {
        let label = locale::format_rate(value, &lang);
        let y = scale.precip_y(value) - NOTE_FONT.character_size.height as i32 / 2;
        draw_text(canvas, &label, scale.plot.x1 + 2, y, NOTE_FONT, PRECIP_AXIS);
    }

    // Day ticks with weekday abbreviations, optional 6/12/18 hour marks.
    let label_y = region.y1 - 12;
    let mut day = scale.start.date();
    let last = scale.end().date();
    while day <= last {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            if midnight >= scale.start && midnight <= scale.end() {
                let label = locale::weekday_abbrev(day.weekday(), &lang);
                let w = canvas::text_width(NOTE_FONT, label) as i32;
                draw_text(
                    canvas,
                    label,
                    scale.x(midnight) - w / 2,
                    label_y,
                    NOTE_FONT,
                    Rgb888::BLACK,
                );
            }
        }
        if config.chart_hour_markers {
            for hour in [6u32, 12, 18] {
                if let Some(at) = day.and_hms_opt(hour, 0, 0) {
                    if at >= scale.start && at <= scale.end() {
                        let label = hour.to_string();
                        let w = canvas::text_width(NOTE_FONT, &label) as i32;
                        draw_text(
                            canvas,
                            &label,
                            scale.x(at) - w / 2,
                            label_y,
                            NOTE_FONT,
                            Rgb888::BLACK,
                        );
                    }
                }
            }
        }
        day += Duration::days(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(day: u32, hour: u32, temp: f64, precip: f64) -> HourlySample {
        HourlySample {
            timestamp: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            temperature: temp,
            temp_min: temp - 1.0,
            temp_max: temp + 1.0,
            precip_3h_mm: precip,
            wind_speed: 0.0,
            precip_probability: 0.0,
            condition_icon: "01d".to_string(),
            sunshine: None,
            solar: None,
            condition: None,
            source_id: None,
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_nice_upper_precip_bound_ladder() {
        assert_eq!(nice_upper_precip_bound(0.8), 1.0);
        assert_eq!(nice_upper_precip_bound(1.4), 2.0);
        assert_eq!(nice_upper_precip_bound(2.2), 2.5);
        // 3.3 mm/h observed * 1.15 ≈ 3.8 snaps to 5.
        assert_eq!(nice_upper_precip_bound(3.3 * 1.15), 5.0);
        assert_eq!(nice_upper_precip_bound(7.0), 10.0);
        assert_eq!(nice_upper_precip_bound(12.0), 20.0);
        assert_eq!(nice_upper_precip_bound(26.0), 50.0);
    }

    #[test]
    fn test_window_excludes_past_by_default() {
        let hourly = vec![
            sample(1, 6, 10.0, 0.0),
            sample(1, 12, 12.0, 0.0),
            sample(1, 18, 11.0, 0.0),
        ];
        let series = window_series(&hourly, at(1, 10), 72, false);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].timestamp, at(1, 12));
    }

    #[test]
    fn test_window_includes_past_from_midnight() {
        let hourly = vec![
            sample(1, 6, 10.0, 0.0),
            sample(1, 12, 12.0, 0.0),
            sample(1, 18, 11.0, 0.0),
        ];
        let series = window_series(&hourly, at(1, 10), 72, true);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_window_caps_display_hours() {
        let hourly: Vec<HourlySample> = (1u32..=4)
            .flat_map(|d| (0u32..24).step_by(6).map(move |h| sample(d, h, 10.0, 0.0)))
            .collect();
        let series = window_series(&hourly, at(1, 0), 24, false);
        let last = series.last().unwrap().timestamp;
        assert!(last <= at(2, 0));
    }

    #[test]
    fn test_window_falls_back_to_full_series() {
        // Everything is in the past relative to now.
        let hourly = vec![sample(1, 6, 10.0, 0.0), sample(1, 9, 11.0, 0.0)];
        let series = window_series(&hourly, at(3, 0), 72, false);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_scale_x_spans_plot() {
        let hourly = vec![sample(1, 0, 10.0, 0.0), sample(2, 0, 12.0, 0.0)];
        let series: Vec<&HourlySample> = hourly.iter().collect();
        let plot = Region { x0: 30, y0: 10, x1: 230, y1: 110 };
        let scale = Scale::new(plot, &series, &RenderConfig::default());
        assert_eq!(scale.x(at(1, 0)), 30);
        assert_eq!(scale.x(at(2, 0)), 229);
        assert_eq!(scale.x(at(1, 12)), (30 + 229) / 2);
    }

    #[test]
    fn test_scale_temp_y_is_monotonic() {
        let hourly = vec![sample(1, 0, 0.0, 0.0), sample(1, 6, 10.0, 0.0)];
        let series: Vec<&HourlySample> = hourly.iter().collect();
        let plot = Region { x0: 0, y0: 0, x1: 100, y1: 100 };
        let scale = Scale::new(plot, &series, &RenderConfig::default());
        assert!(scale.temp_y(10.0) < scale.temp_y(0.0));
        assert!(scale.temp_y(scale.tmax) == 0);
        assert!(scale.temp_y(scale.tmin) == 99);
    }

    #[test]
    fn test_fixed_precip_bound_from_config() {
        let hourly = vec![sample(1, 0, 10.0, 30.0)];
        let series: Vec<&HourlySample> = hourly.iter().collect();
        let plot = Region { x0: 0, y0: 0, x1: 100, y1: 100 };
        let mut config = RenderConfig::default();
        config.chart_auto_precip_max = false;
        config.max_precip_mm = 5.0;
        let scale = Scale::new(plot, &series, &config);
        assert_eq!(scale.pmax, 5.0);
        // Values above the bound clamp to the top of the plot.
        assert_eq!(scale.precip_y(30.0), 0);
    }
}
