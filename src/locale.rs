//! Display-language strings and localized formatting.
//!
//! Only German and English ship on the device; any other language code falls
//! back to English. Formats are chrono strftime patterns; weekday and month
//! names inside a formatted string are post-replaced for German, which keeps
//! the format strings user-configurable without a locale-aware time crate.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

pub fn is_german(lang: &str) -> bool {
    lang.starts_with("de")
}

/// Two-letter weekday abbreviation for chart ticks and the grid header.
pub fn weekday_abbrev(weekday: Weekday, lang: &str) -> &'static str {
    if is_german(lang) {
        match weekday {
            Weekday::Mon => "Mo",
            Weekday::Tue => "Di",
            Weekday::Wed => "Mi",
            Weekday::Thu => "Do",
            Weekday::Fri => "Fr",
            Weekday::Sat => "Sa",
            Weekday::Sun => "So",
        }
    } else {
        match weekday {
            Weekday::Mon => "Mo",
            Weekday::Tue => "Tu",
            Weekday::Wed => "We",
            Weekday::Thu => "Th",
            Weekday::Fri => "Fr",
            Weekday::Sat => "Sa",
            Weekday::Sun => "Su",
        }
    }
}

const WEEKDAYS_EN: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const WEEKDAYS_DE: [&str; 7] = [
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag",
    "Sonntag",
];
const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const MONTHS_DE: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Abbreviated month name for the month grid's first-of-month cells.
pub fn month_abbrev(month: u32, lang: &str) -> String {
    let names = if is_german(lang) { &MONTHS_DE } else { &MONTHS_EN };
    let name = names[(month.clamp(1, 12) - 1) as usize];
    name.chars().take(3).collect::<String>().to_uppercase()
}

/// Format a timestamp with a strftime pattern, localizing `%A` and `%B`.
pub fn format_datetime(dt: NaiveDateTime, fmt: &str, lang: &str) -> String {
    let formatted = dt.format(fmt).to_string();
    if is_german(lang) {
        germanize(&formatted, dt.date())
    } else {
        formatted
    }
}

/// Format a date with a strftime pattern, localizing `%A` and `%B`.
pub fn format_date(date: NaiveDate, fmt: &str, lang: &str) -> String {
    let formatted = date.format(fmt).to_string();
    if is_german(lang) {
        germanize(&formatted, date)
    } else {
        formatted
    }
}

fn germanize(formatted: &str, date: NaiveDate) -> String {
    let wd = date.weekday().num_days_from_monday() as usize;
    let mo = (date.month() - 1) as usize;
    formatted
        .replace(WEEKDAYS_EN[wd], WEEKDAYS_DE[wd])
        .replace(MONTHS_EN[mo], MONTHS_DE[mo])
}

/// Header for an agenda day `delta_days` away (0 = today).
pub fn relative_day_header(delta_days: i64, lang: &str) -> Option<&'static str> {
    if is_german(lang) {
        match delta_days {
            0 => Some("Heute"),
            1 => Some("Morgen"),
            2 => Some("Übermorgen"),
            _ => None,
        }
    } else {
        match delta_days {
            0 => Some("Today"),
            1 => Some("Tomorrow"),
            2 => Some("Day after tomorrow"),
            _ => None,
        }
    }
}

/// Meal label by the event's start hour.
pub fn meal_label(hour: u32, lang: &str) -> &'static str {
    if is_german(lang) {
        if hour < 11 {
            "Frühstück"
        } else if hour < 16 {
            "Mittagessen"
        } else {
            "Abendessen"
        }
    } else if hour < 11 {
        "Breakfast"
    } else if hour < 16 {
        "Lunch"
    } else {
        "Dinner"
    }
}

pub fn all_day_label(lang: &str) -> &'static str {
    if is_german(lang) {
        "Ganztägig"
    } else {
        "All day"
    }
}

pub fn no_events_label(lang: &str) -> &'static str {
    if is_german(lang) {
        "Keine Termine"
    } else {
        "No events"
    }
}

/// Footer notice shown when the primary weather provider was unavailable.
pub fn fallback_notice(lang: &str) -> &'static str {
    if is_german(lang) {
        "Wetterquelle OWM (Fallback)"
    } else {
        "Weather Source OWM (fallback)"
    }
}

const MOON_NAMES_EN: [&str; 8] = [
    "New Moon",
    "Waxing Crescent",
    "First Quarter",
    "Waxing Gibbous",
    "Full Moon",
    "Waning Gibbous",
    "Last Quarter",
    "Waning Crescent",
];
const MOON_NAMES_DE: [&str; 8] = [
    "Neumond",
    "zun. Sichel",
    "erstes Viertel",
    "zun. Mond",
    "Vollmond",
    "abn. Mond",
    "letztes Viertel",
    "abn. Sichel",
];

/// Localized name of an 8-step moon phase index.
pub fn moon_phase_name(index: u8, lang: &str) -> &'static str {
    let names = if is_german(lang) {
        &MOON_NAMES_DE
    } else {
        &MOON_NAMES_EN
    };
    names[(index & 7) as usize]
}

/// Localize a provider condition text ("rain" -> "Regen"); unknown values
/// pass through with the first letter capitalized.
pub fn condition_text(raw: &str, lang: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if is_german(lang) {
        let localized = match trimmed.to_lowercase().as_str() {
            "dry" => Some("Trocken"),
            "clear" | "clear sky" => Some("Klar"),
            "partly cloudy" => Some("Teilweise bewölkt"),
            "cloudy" => Some("Bewölkt"),
            "overcast" => Some("Bedeckt"),
            "fog" => Some("Nebel"),
            "mist" => Some("Dunst"),
            "rain" => Some("Regen"),
            "drizzle" => Some("Nieselregen"),
            "sleet" => Some("Schneeregen"),
            "snow" => Some("Schnee"),
            "hail" => Some("Hagel"),
            "thunderstorm" => Some("Gewitter"),
            "wind" => Some("Windig"),
            _ => None,
        };
        if let Some(text) = localized {
            return text.to_string();
        }
    }
    capitalize_first(trimmed)
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Format a sunshine duration in hours for the summary note.
///
/// Sub-hour values render as minutes; whole-ish hours drop the fraction;
/// German output uses a decimal comma.
pub fn format_suntime(hours: f64, lang: &str) -> String {
    let h = hours.max(0.0);
    if h < 1.0 {
        let minutes = (h * 60.0).round() as i64;
        return if is_german(lang) {
            format!("{} min", minutes)
        } else {
            format!("{} m", minutes)
        };
    }
    if (h - h.round()).abs() < 0.05 {
        return format!("{} h", h.round() as i64);
    }
    let mut value = format!("{:.1}", h);
    value = value
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string();
    if is_german(lang) {
        value = value.replace('.', ",");
    }
    format!("{} h", value)
}

/// Decimal string with at most one fraction digit, comma for German.
pub fn format_rate(value: f64, lang: &str) -> String {
    let mut text = format!("{:.1}", value)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string();
    if text.is_empty() {
        text = "0".to_string();
    }
    if is_german(lang) {
        text = text.replace('.', ",");
    }
    text
}
