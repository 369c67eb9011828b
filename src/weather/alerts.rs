//! Severe-weather alerts (DWD via Bright Sky).
//!
//! Alert payloads vary wildly between endpoints and API revisions, so the
//! raw JSON is probed generically instead of deserialized into a fixed
//! shape. Each alert reduces to a severity rank, a marker color, and a focus
//! metric; the weather panel then anchors one marker per focus next to the
//! value it concerns.

use embedded_graphics::pixelcolor::Rgb888;
use serde_json::Value;

use crate::error::Error;

const ALERTS_URL: &str = "https://api.brightsky.dev/alerts";

const COLOR_SEVERE: Rgb888 = Rgb888::new(200, 0, 0);
const COLOR_MODERATE: Rgb888 = Rgb888::new(220, 120, 0);
const COLOR_MINOR: Rgb888 = Rgb888::new(210, 170, 0);

/// Which summary value a warning concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    MaxTemp,
    MinTemp,
    Precip,
    Wind,
}

/// One marker to draw in the weather summary. `focus` is `None` for a
/// generic warning that anchors next to the condition icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningMarker {
    pub rank: u8,
    pub color: Rgb888,
    pub focus: Option<Focus>,
}

fn text_field<'a>(alert: &'a Value, key: &str) -> &'a str {
    alert.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Severity rank (1..=3) and marker color for an alert.
///
/// Severity arrives as a number or a CAP-style keyword, under any of
/// several keys; unrecognized or missing values rank as moderate.
fn rank_and_color(alert: &Value) -> (u8, Rgb888) {
    let default = (2, COLOR_MODERATE);
    let raw = ["severity", "level", "warning_level", "warn_level", "warnLevel"]
        .iter()
        .find_map(|key| {
            let value = alert.get(*key)?;
            match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_lowercase()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        });
    let raw = match raw {
        Some(raw) => raw,
        None => return default,
    };
    if let Ok(n) = raw.parse::<f64>() {
        let n = n as i64;
        return if n >= 3 {
            (3, COLOR_SEVERE)
        } else if n == 2 {
            (2, COLOR_MODERATE)
        } else {
            (1, COLOR_MINOR)
        };
    }
    if ["extreme", "severe", "violett", "red", "rot"]
        .iter()
        .any(|k| raw.contains(k))
    {
        return (3, COLOR_SEVERE);
    }
    if ["moderate", "orange"].iter().any(|k| raw.contains(k)) {
        return (2, COLOR_MODERATE);
    }
    if ["minor", "yellow", "gelb"].iter().any(|k| raw.contains(k)) {
        return (1, COLOR_MINOR);
    }
    default
}

/// Classify which value a warning concerns from its event/headline texts.
///
/// Wind matches on whole words only, so "windward" or German compounds
/// containing "wind" inside another word do not trigger it; the other
/// categories match substrings. Alerts with no usable text stay generic.
fn classify_focus(alert: &Value) -> Option<Focus> {
    let text = [
        "event_de",
        "event_en",
        "headline_de",
        "headline_en",
        "description_de",
        "description_en",
        "event",
        "headline",
        "description",
    ]
    .iter()
    .map(|key| text_field(alert, key))
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    if text.trim().is_empty() {
        return None;
    }

    let wind_words = ["wind", "sturm", "boe", "böe", "böen", "gust", "gusts"];
    if text
        .split(|c: char| !c.is_alphabetic())
        .any(|token| wind_words.contains(&token))
    {
        return Some(Focus::Wind);
    }
    let precip_words = [
        "regen",
        "rain",
        "niederschlag",
        "schnee",
        "snow",
        "hail",
        "hagel",
        "precip",
    ];
    if precip_words.iter().any(|k| text.contains(k)) {
        return Some(Focus::Precip);
    }
    let cold_words = ["frost", "frier", "kalt", "cold", "glatteis", "ice", "minus"];
    if cold_words.iter().any(|k| text.contains(k)) {
        return Some(Focus::MinTemp);
    }
    let heat_words = ["hitze", "heat", "heiss", "heiß", "hot"];
    if heat_words.iter().any(|k| text.contains(k)) {
        return Some(Focus::MaxTemp);
    }
    // Generic weather warnings are usually precipitation-related.
    Some(Focus::Precip)
}

/// Pull the alert list out of whichever envelope the endpoint used.
fn flatten_alerts(data: &Value) -> Vec<Value> {
    if let Some(list) = data.as_array() {
        return list.clone();
    }
    for key in ["alerts", "warnings"] {
        if let Some(list) = data.get(key).and_then(Value::as_array) {
            return list.clone();
        }
    }
    if let Some(features) = data.get("features").and_then(Value::as_array) {
        return features
            .iter()
            .map(|f| f.get("properties").unwrap_or(f).clone())
            .collect();
    }
    Vec::new()
}

/// Reduce raw alerts to at most five markers: the highest-ranked one per
/// focus (ordered max-temp, min-temp, precip, wind) plus one generic.
pub(super) fn pick_markers(alerts: &[Value]) -> Vec<WarningMarker> {
    let mut ranked: Vec<WarningMarker> = alerts
        .iter()
        .map(|alert| {
            let (rank, color) = rank_and_color(alert);
            WarningMarker {
                rank,
                color,
                focus: classify_focus(alert),
            }
        })
        .collect();
    ranked.sort_by_key(|m| std::cmp::Reverse(m.rank));

    let mut out = Vec::new();
    for focus in [Focus::MaxTemp, Focus::MinTemp, Focus::Precip, Focus::Wind] {
        if let Some(marker) = ranked.iter().find(|m| m.focus == Some(focus)) {
            out.push(marker.clone());
        }
    }
    if let Some(generic) = ranked.iter().find(|m| m.focus.is_none()) {
        out.push(generic.clone());
    }
    out
}

/// Fetch current alerts for a location and reduce them to markers.
pub(super) fn fetch_markers(lat: f64, lon: f64) -> Result<Vec<WarningMarker>, Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let data: Value = client
        .get(ALERTS_URL)
        .query(&[
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("tz", "Europe/Berlin".to_string()),
        ])
        .header("Accept", "application/json")
        .send()?
        .error_for_status()?
        .json()?;
    Ok(pick_markers(&flatten_alerts(&data)))
}
