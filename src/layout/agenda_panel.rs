//! Agenda band: the next days' events as a compact list, grouped under
//! relative or dated headers, with the same feed markers as the month grid.

use chrono::{NaiveDate, Timelike};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle};

use super::icons::{IconCache, IconKind};
use super::{draw_text, Region, RenderInput, TEXT_BOLD_FONT, TEXT_FONT};
use crate::canvas::{self, Canvas};
use crate::config::RenderConfig;
use crate::events::CalendarEvent;
use crate::locale;

/// Header text for one agenda day.
///
/// Close days get relative names, days within the running week a weekday
/// name, everything beyond that a date.
fn day_header(date: NaiveDate, now: NaiveDate, config: &RenderConfig, lang: &str) -> String {
    let delta = (date - now).num_days();
    if delta < config.agenda_relative_days.max(0) {
        if let Some(label) = locale::relative_day_header(delta, lang) {
            return label.to_string();
        }
        return locale::capitalize_first(&locale::format_date(date, "%A", lang));
    }
    if date <= now + chrono::Duration::days(6) {
        return locale::capitalize_first(&locale::format_date(
            date,
            &config.agenda_weekday_format,
            lang,
        ));
    }
    locale::format_date(date, &config.agenda_date_format, lang)
}

/// The "time" column of an entry, `None` for timed events with an empty
/// configured format.
fn entry_label(event: &CalendarEvent, config: &RenderConfig, lang: &str) -> (String, bool) {
    if event.is_all_day() {
        return (locale::all_day_label(lang).to_string(), true);
    }
    if event.is_meals {
        return (meal_time_label(event, lang), true);
    }
    (
        locale::format_datetime(event.begin, &config.time_format, lang),
        false,
    )
}

fn meal_time_label(event: &CalendarEvent, lang: &str) -> String {
    locale::meal_label(event.begin.hour(), lang).to_string()
}

pub(super) fn draw(
    canvas: &mut Canvas,
    region: Region,
    config: &RenderConfig,
    icons: &mut IconCache,
    input: &RenderInput,
) {
    let lang = config.lang();
    let line_h = TEXT_FONT.character_size.height as i32 + 6;
    let mut cursor_y = region.y0;

    if input.agenda.is_empty() {
        draw_text(
            canvas,
            locale::no_events_label(&lang),
            region.x0,
            cursor_y,
            TEXT_BOLD_FONT,
            Rgb888::BLACK,
        );
        return;
    }

    let today = input.now.date();
    for (&date, indices) in input.agenda.iter() {
        if indices.is_empty() {
            continue;
        }
        // A header only makes sense with room for at least one entry.
        if cursor_y + line_h * 2 > region.y1 {
            break;
        }
        let header = day_header(date, today, config, &lang);
        draw_text(canvas, &header, region.x0, cursor_y, TEXT_BOLD_FONT, Rgb888::BLACK);
        cursor_y += line_h;

        for &index in indices {
            if cursor_y + line_h > region.y1 {
                break;
            }
            let event = &input.events[index];
            draw_marker(canvas, icons, event, region.x0 + 2, cursor_y, line_h);

            let text_x = region.x0 + 2 + 8 + 6;
            let max_width = (region.x1 - text_x - 4).max(20) as u32;
            let (label, is_untimed) = entry_label(event, config, &lang);
            let line_text = if label.is_empty() {
                event.title.clone()
            } else if is_untimed {
                format!("{}: {}", label, event.title)
            } else {
                format!("{} - {}", label, event.title)
            };

            let mut lines = canvas::wrap_text(TEXT_FONT, &line_text, max_width);
            let dropped = lines.len() > 2;
            lines.truncate(2);
            if dropped {
                if let Some(last) = lines.last_mut() {
                    *last = canvas::truncate_text(TEXT_FONT, &format!("{}...", last), max_width);
                }
            }
            for line in &lines {
                if cursor_y + line_h > region.y1 {
                    break;
                }
                draw_text(canvas, line, text_x, cursor_y, TEXT_FONT, Rgb888::BLACK);
                cursor_y += line_h;
            }
        }
    }
}

/// Feed marker in the left gutter, same shape language as the month grid.
fn draw_marker(
    canvas: &mut Canvas,
    icons: &mut IconCache,
    event: &CalendarEvent,
    x: i32,
    row_y: i32,
    line_h: i32,
) {
    let dot_r = 4;
    let dot_y = row_y + (line_h - dot_r * 2) / 2 + 1;
    if event.is_meals {
        let size = (dot_r * 2 + 3) as u32;
        icons.draw(
            canvas,
            IconKind::Cutlery,
            Point::new(x + dot_r - size as i32 / 2, dot_y + dot_r - 1 - size as i32 / 2),
            size,
            event.feed_color,
        );
        return;
    }
    if event.is_all_day() {
        let _ = Rectangle::new(
            Point::new(x, dot_y),
            Size::new((dot_r * 2 + 1) as u32, (dot_r * 2 + 1) as u32),
        )
        .into_styled(PrimitiveStyle::with_fill(event.feed_color))
        .draw(canvas);
    } else {
        let _ = Circle::new(Point::new(x, dot_y), (dot_r * 2 + 1) as u32)
            .into_styled(PrimitiveStyle::with_fill(event.feed_color))
            .draw(canvas);
    }
    if event.is_recurring {
        let inner_r = (dot_r - 2).max(1);
        let ix = x + dot_r - inner_r;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{assemble_events, build_agenda, Occurrence};
    use crate::layout::{Bands, LayoutEngine};
    use crate::weather::WeatherSummary;
    use chrono::{Duration, NaiveDateTime};
    use std::collections::BTreeMap;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn quiet_summary() -> WeatherSummary {
        WeatherSummary {
            icon: "01d".to_string(),
            temp_now: 18.0,
            temp_min: 10.0,
            temp_max: 22.0,
            precip_probability_max: 0.0,
            precip_rate_now: 0.0,
            wind_max: 2.0,
            sunrise: None,
            sunset: None,
            condition_text: "Trocken".to_string(),
            sunshine_hours: None,
            warning_markers: Vec::new(),
        }
    }

    fn feed(name: &str, color: &str) -> crate::config::FeedConfig {
        crate::config::FeedConfig {
            name: name.to_string(),
            url: None,
            color: color.to_string(),
        }
    }

    #[test]
    fn test_day_header_progression() {
        let config = RenderConfig::default();
        let now = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        assert_eq!(day_header(now, now, &config, "de"), "Heute");
        assert_eq!(
            day_header(now + Duration::days(1), now, &config, "de"),
            "Morgen"
        );
        // Day 2 is past the default relative range, so it gets a weekday.
        assert_eq!(
            day_header(now + Duration::days(2), now, &config, "de"),
            "Freitag"
        );
        // Past the running week the header switches to a date.
        assert_eq!(
            day_header(now + Duration::days(7), now, &config, "de"),
            "15.05.2024"
        );
    }

    #[test]
    fn test_day_header_relative_range_extends() {
        let mut config = RenderConfig::default();
        config.agenda_relative_days = 3;
        let now = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        assert_eq!(
            day_header(now + Duration::days(2), now, &config, "de"),
            "Übermorgen"
        );
        assert_eq!(
            day_header(now + Duration::days(2), now, &config, "en"),
            "Day after tomorrow"
        );
    }

    #[test]
    fn test_entry_labels() {
        let config = RenderConfig::default();
        let timed = CalendarEvent {
            title: "Zahnarzt".to_string(),
            begin: at(8, 14),
            end: at(8, 15),
            feed_name: "Familie".to_string(),
            feed_color: Rgb888::new(255, 0, 0),
            is_meals: false,
            is_recurring: false,
        };
        assert_eq!(entry_label(&timed, &config, "de"), ("14:00".to_string(), false));

        let meal = CalendarEvent {
            is_meals: true,
            begin: at(8, 12),
            ..timed.clone()
        };
        assert_eq!(
            entry_label(&meal, &config, "de"),
            ("Mittagessen".to_string(), true)
        );

        let all_day = CalendarEvent {
            begin: at(8, 0),
            end: at(9, 0),
            is_meals: false,
            ..timed.clone()
        };
        assert_eq!(
            entry_label(&all_day, &config, "de"),
            ("Ganztägig".to_string(), true)
        );
    }

    #[test]
    fn test_empty_agenda_shows_notice() {
        let config = RenderConfig::default();
        let mut engine = LayoutEngine::new(config.clone());
        let summary = quiet_summary();
        let empty: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
        let input = RenderInput {
            summary: &summary,
            hourly: &[],
            events: &[],
            day_map: &empty,
            agenda: &empty,
            now: at(8, 12),
            battery_percent: None,
            fallback_used: false,
        };
        let canvas = engine.render(&input);
        let bands = Bands::split(config.width, config.height);
        // The notice text leaves black pixels at the top of the band.
        let mut black = 0;
        for x in 0..200u32 {
            for y in bands.agenda.y0 as u32..(bands.agenda.y0 as u32 + 16) {
                if canvas.pixel(x, y) == Rgb888::BLACK {
                    black += 1;
                }
            }
        }
        assert!(black > 20);
    }

    #[test]
    fn test_agenda_renders_headers_and_rows() {
        let config = RenderConfig::default();
        let now = at(8, 9);
        let events = assemble_events(&[(
            feed("Familie", "blue"),
            vec![
                Occurrence {
                    title: "Zahnarzt".to_string(),
                    begin: at(8, 14),
                    end: at(8, 15),
                },
                Occurrence {
                    title: "Schwimmen".to_string(),
                    begin: at(9, 17),
                    end: at(9, 18),
                },
            ],
        )]);
        let agenda = build_agenda(&events, now, config.agenda_days);
        let day_map: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
        let summary = quiet_summary();
        let input = RenderInput {
            summary: &summary,
            hourly: &[],
            events: &events,
            day_map: &day_map,
            agenda: &agenda,
            now,
            battery_percent: None,
            fallback_used: false,
        };
        let mut engine = LayoutEngine::new(config.clone());
        let canvas = engine.render(&input);

        let bands = Bands::split(config.width, config.height);
        // The first entry's marker dot is blue, in the left gutter below
        // the "Heute" header line.
        let line_h = TEXT_FONT.character_size.height as i32 + 6;
        let dot_y = bands.agenda.y0 + line_h + (line_h - 8) / 2 + 1;
        let mut found = false;
        for dx in 0..10 {
            for dy in 0..10 {
                if canvas.pixel((2 + dx) as u32, (dot_y + dy) as u32) == Rgb888::new(0, 0, 255) {
                    found = true;
                }
            }
        }
        assert!(found, "timed event marker missing");
    }

    #[test]
    fn test_long_titles_wrap_to_two_lines_max() {
        let config = RenderConfig::default();
        let title = "Ein sehr langer Termin mit vielen Worten der sicher \
                     nicht in eine Zeile passt und auch nicht in zwei Zeilen \
                     weil er immer weiter geht und geht und geht";
        let max_width = 300;
        let text = format!("14:00 - {}", title);
        let mut lines = canvas::wrap_text(TEXT_FONT, &text, max_width);
        assert!(lines.len() > 2);
        let dropped = lines.len() > 2;
        lines.truncate(2);
        if dropped {
            let last = lines.last_mut().unwrap();
            *last = canvas::truncate_text(TEXT_FONT, &format!("{}...", last), max_width);
        }
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("..."));
        assert!(canvas::text_width(TEXT_FONT, &lines[1]) <= max_width);
    }
}
