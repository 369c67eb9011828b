//! Calendar event expansion.
//!
//! Input is a list of occurrences per feed, already recurrence-resolved by
//! the ICS layer. This module tags feed metadata, applies the all-day and
//! recurrence heuristics, and buckets events into the month-grid day map and
//! the time-ordered agenda.
//!
//! Both detections are deliberately heuristic, not ICS semantics:
//!
//! - *All-day* is inferred from duration and midnight-ish clock times, which
//!   tolerates feeds that export all-day entries shifted by a timezone hour.
//! - *Recurring* means "another occurrence with the same feed and title is in
//!   the load window". It only drives the hollow-center marker.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use embedded_graphics::pixelcolor::Rgb888;
use std::collections::{BTreeMap, HashMap};

use crate::config::FeedConfig;

/// One recurrence-resolved occurrence, as delivered by the ICS layer.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub title: String,
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// A fully tagged event, owned by the expander for one render.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub title: String,
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
    pub feed_name: String,
    pub feed_color: Rgb888,
    pub is_meals: bool,
    /// Heuristic: another event shares (feed, title) in the load window
    pub is_recurring: bool,
}

impl CalendarEvent {
    /// All-day heuristic.
    ///
    /// Events shorter than both one day and 23 hours are never all-day.
    /// Longer ones are all-day when begin and end sit at 00:00/01:00, or
    /// when the event crosses a date boundary with both clock hours in
    /// {0, 1} (timezone-shifted all-day exports).
    pub fn is_all_day(&self) -> bool {
        let duration = self.end - self.begin;
        if duration < Duration::days(1) && duration < Duration::hours(23) {
            return false;
        }
        let midnightish =
            |dt: &NaiveDateTime| dt.minute() == 0 && (dt.hour() == 0 || dt.hour() == 1);
        if midnightish(&self.begin) && midnightish(&self.end) {
            return true;
        }
        if self.begin.date() != self.end.date()
            && (self.begin.hour() == 0 || self.begin.hour() == 1)
            && (self.end.hour() == 0 || self.end.hour() == 1)
        {
            return true;
        }
        false
    }

    /// Last calendar date this event occupies (all-day ends are exclusive).
    fn last_occupied_date(&self) -> NaiveDate {
        let end_date = self.end.date();
        if self.is_all_day() {
            end_date - Duration::days(1)
        } else {
            end_date
        }
    }
}

/// Dates mapped to the events occupying them, indices into the event slice.
pub type DayMap = BTreeMap<NaiveDate, Vec<usize>>;

/// Combine per-feed occurrences into one tagged, begin-sorted event list.
///
/// Titles are stripped of emoji (they have no glyphs in the display fonts)
/// and the recurrence flag is set by (feed, title) duplication.
pub fn assemble_events(feeds: &[(FeedConfig, Vec<Occurrence>)]) -> Vec<CalendarEvent> {
    let mut events: Vec<CalendarEvent> = Vec::new();
    for (feed, occurrences) in feeds {
        for occurrence in occurrences {
            events.push(CalendarEvent {
                title: strip_emoji(occurrence.title.trim_start()),
                begin: occurrence.begin,
                end: occurrence.end,
                feed_name: feed.name.clone(),
                feed_color: feed.rgb(),
                is_meals: feed.is_meals(),
                is_recurring: false,
            });
        }
    }
    events.sort_by_key(|e| e.begin);

    let mut counts: HashMap<(String, String), u32> = HashMap::new();
    for event in &events {
        *counts
            .entry((event.feed_name.clone(), event.title.clone()))
            .or_insert(0) += 1;
    }
    for event in &mut events {
        event.is_recurring =
            counts[&(event.feed_name.clone(), event.title.clone())] > 1;
    }
    events
}

/// Bucket events by every calendar date they occupy.
pub fn build_day_map(events: &[CalendarEvent]) -> DayMap {
    let mut map = DayMap::new();
    for (idx, event) in events.iter().enumerate() {
        let mut cursor = event.begin.date();
        let last = event.last_occupied_date();
        while cursor <= last {
            map.entry(cursor).or_default().push(idx);
            cursor += Duration::days(1);
        }
    }
    map
}

/// Agenda buckets for `[today, today + agenda_days]`.
///
/// Ended events are dropped unless all-day or meal (those stay visible for
/// their whole day). Within a day, all-day and meal entries sort before
/// timed ones, then by start time.
pub fn build_agenda(
    events: &[CalendarEvent],
    now: NaiveDateTime,
    agenda_days: i64,
) -> DayMap {
    let window_start = now.date();
    let window_end = window_start + Duration::days(agenda_days);

    let mut grouped = DayMap::new();
    for (idx, event) in events.iter().enumerate() {
        let all_day = event.is_all_day();
        if !all_day && !event.is_meals && event.end <= now {
            continue;
        }
        let last = event.last_occupied_date();
        if last < window_start || event.begin.date() > window_end {
            continue;
        }
        let mut cursor = event.begin.date().max(window_start);
        while cursor <= last && cursor <= window_end {
            grouped.entry(cursor).or_default().push(idx);
            cursor += Duration::days(1);
        }
    }

    for indices in grouped.values_mut() {
        indices.sort_by_key(|&idx| {
            let event = &events[idx];
            let timed = !(event.is_all_day() || event.is_meals);
            (timed, event.begin)
        });
    }
    grouped
}

/// Drop emoji code points from an event title.
fn strip_emoji(text: &str) -> String {
    text.chars()
        .filter(|&c| !is_emoji(c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_emoji(c: char) -> bool {
    matches!(u32::from(c),
        0x1F1E0..=0x1F1FF
        | 0x1F300..=0x1F5FF
        | 0x1F600..=0x1F64F
        | 0x1F680..=0x1F6FF
        | 0x1F700..=0x1F77F
        | 0x1F780..=0x1F8FF
        | 0x1F900..=0x1F9FF
        | 0x1FA00..=0x1FAFF
        | 0x2702..=0x27B0
        | 0x24C2
        | 0x2600..=0x26FF
        | 0xFE0F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(name: &str, color: &str) -> FeedConfig {
        FeedConfig {
            name: name.to_string(),
            url: None,
            color: color.to_string(),
        }
    }

    fn occurrence(title: &str, begin: (u32, u32, u32, u32), end: (u32, u32, u32, u32)) -> Occurrence {
        let mk = |(d, h, m, _s): (u32, u32, u32, u32)| {
            NaiveDate::from_ymd_opt(2024, 5, d)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap()
        };
        Occurrence {
            title: title.to_string(),
            begin: mk(begin),
            end: mk(end),
        }
    }

    fn event(title: &str, begin: (u32, u32, u32, u32), end: (u32, u32, u32, u32)) -> CalendarEvent {
        let feeds = vec![(feed("Test", "blue"), vec![occurrence(title, begin, end)])];
        assemble_events(&feeds).remove(0)
    }

    #[test]
    fn test_all_day_midnight_to_midnight() {
        let e = event("Holiday", (1, 0, 0, 0), (2, 0, 0, 0));
        assert!(e.is_all_day());
    }

    #[test]
    fn test_timed_event_is_not_all_day() {
        let e = event("Meeting", (1, 9, 0, 0), (1, 10, 0, 0));
        assert!(!e.is_all_day());
    }

    #[test]
    fn test_timezone_shifted_all_day() {
        // 01:00 -> 01:00 next day: a UTC+1 export of an all-day entry.
        let e = event("Shifted", (1, 1, 0, 0), (2, 1, 0, 0));
        assert!(e.is_all_day());
    }

    #[test]
    fn test_long_timed_event_is_not_all_day() {
        // 48 h but anchored at 09:00 stays a timed event.
        let e = event("Offsite", (1, 9, 0, 0), (3, 9, 0, 0));
        assert!(!e.is_all_day());
    }

    #[test]
    fn test_recurrence_by_feed_and_title() {
        let feeds = vec![(
            feed("Sport", "green"),
            vec![
                occurrence("Training", (1, 18, 0, 0), (1, 19, 0, 0)),
                occurrence("Training", (8, 18, 0, 0), (8, 19, 0, 0)),
                occurrence("Match", (4, 15, 0, 0), (4, 17, 0, 0)),
            ],
        )];
        let events = assemble_events(&feeds);
        assert!(events.iter().filter(|e| e.title == "Training").all(|e| e.is_recurring));
        assert!(!events.iter().find(|e| e.title == "Match").unwrap().is_recurring);
    }

    #[test]
    fn test_same_title_different_feed_not_recurring() {
        let feeds = vec![
            (feed("A", "red"), vec![occurrence("Sync", (1, 9, 0, 0), (1, 10, 0, 0))]),
            (feed("B", "blue"), vec![occurrence("Sync", (2, 9, 0, 0), (2, 10, 0, 0))]),
        ];
        let events = assemble_events(&feeds);
        assert!(events.iter().all(|e| !e.is_recurring));
    }

    #[test]
    fn test_day_map_all_day_exclusive_end() {
        // All-day May 1 -> May 3 (exclusive) occupies the 1st and 2nd only.
        let e = event("Trip", (1, 0, 0, 0), (3, 0, 0, 0));
        let map = build_day_map(&[e]);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
        assert!(map.contains_key(&NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()));
        assert!(!map.contains_key(&NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()));
    }

    #[test]
    fn test_day_map_timed_span_inclusive() {
        let e = event("Offsite", (1, 9, 0, 0), (3, 9, 0, 0));
        let map = build_day_map(&[e]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_agenda_drops_ended_timed_events() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let past = event("Standup", (1, 9, 0, 0), (1, 9, 30, 0));
        let later = event("Review", (1, 15, 0, 0), (1, 16, 0, 0));
        let agenda = build_agenda(&[past, later], now, 7);
        let today = agenda.get(&now.date()).unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0], 1);
    }

    #[test]
    fn test_agenda_keeps_ended_meals() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let feeds = vec![(
            feed("Essen", "meals"),
            vec![occurrence("Pasta", (1, 12, 0, 0), (1, 13, 0, 0))],
        )];
        let events = assemble_events(&feeds);
        let agenda = build_agenda(&events, now, 7);
        assert_eq!(agenda.get(&now.date()).unwrap().len(), 1);
    }

    #[test]
    fn test_agenda_sorts_all_day_first() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let timed = event("Early", (1, 9, 0, 0), (1, 10, 0, 0));
        let all_day = event("Holiday", (1, 0, 0, 0), (2, 0, 0, 0));
        let agenda = build_agenda(&[timed, all_day], now, 7);
        let today = agenda.get(&now.date()).unwrap();
        assert_eq!(today, &vec![1, 0]);
    }

    #[test]
    fn test_agenda_window_clipping() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let far = event("Far", (15, 9, 0, 0), (15, 10, 0, 0));
        let agenda = build_agenda(&[far], now, 7);
        assert!(agenda.is_empty());
    }

    #[test]
    fn test_strip_emoji() {
        assert_eq!(strip_emoji("Party 🎉"), "Party");
        assert_eq!(strip_emoji("🍕 Pizza"), "Pizza");
        assert_eq!(strip_emoji("Plain"), "Plain");
    }
}
