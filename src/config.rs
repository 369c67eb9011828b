//! Render configuration.
//!
//! All knobs for one render cycle live here as plain immutable values. The
//! serving layer owns persistence and reload; this crate only parses and
//! consumes the structures.
//!
//! # Example (YAML)
//!
//! ```yaml
//! language: de
//! weeks: 5
//! week_start_offset: -1
//! weather:
//!   provider: dwd
//!   latitude: 51.51
//!   longitude: 13.74
//! feeds:
//!   - name: Familie
//!     url: "https://example.com/family.ics"
//!     color: yellow
//!   - name: Essen
//!     url: "https://example.com/meals.ics"
//!     color: meals
//! ```

use embedded_graphics::pixelcolor::Rgb888;
use serde::Deserialize;
use std::path::Path;

use crate::error::Error;

/// Which weather backend to query first.
///
/// The DWD branch falls back to OWM when its fetch or parse fails; both
/// branches normalize into the same [`crate::weather::WeatherReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Bright Sky (DWD observations and MOSMIX forecast)
    Dwd,
    /// OpenWeatherMap current weather + 3-hourly forecast
    #[default]
    Owm,
}

/// Time window over which a summary metric is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SummaryScope {
    /// Rest of the current calendar day
    #[serde(rename = "day")]
    #[default]
    Day,
    /// Next rolling 24 hours
    #[serde(rename = "24h")]
    Next24h,
}

/// First day of the month-grid week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

/// One calendar feed, as configured by the user.
///
/// The events themselves arrive pre-expanded from the ICS layer; only the
/// feed metadata (name, marker color, meals tag) is consumed here.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Display name, also part of the recurrence-heuristic key
    #[serde(default = "default_feed_name")]
    pub name: String,
    /// Feed URL (unused by the core; kept so one struct round-trips the config)
    #[serde(default)]
    pub url: Option<String>,
    /// Named color, `#rrggbb`, or the special tag `meals`
    #[serde(default)]
    pub color: String,
}

fn default_feed_name() -> String {
    "Calendar".to_string()
}

impl FeedConfig {
    /// The `meals` color tag switches the feed to meal-label rendering.
    pub fn is_meals(&self) -> bool {
        self.color.trim().eq_ignore_ascii_case("meals")
    }

    /// Marker color for this feed's events.
    pub fn rgb(&self) -> Rgb888 {
        parse_color(&self.color)
    }
}

/// Parse a user-facing color value into RGB.
///
/// Accepts a small set of named colors (including the `meals` tag, which
/// renders brown) and `#rrggbb`. Anything unrecognized is black.
pub fn parse_color(value: &str) -> Rgb888 {
    let value = value.trim().to_lowercase();
    match value.as_str() {
        "black" | "" => return Rgb888::new(0, 0, 0),
        "white" => return Rgb888::new(255, 255, 255),
        "red" => return Rgb888::new(255, 0, 0),
        "blue" => return Rgb888::new(0, 0, 255),
        "green" => return Rgb888::new(0, 140, 0),
        "yellow" => return Rgb888::new(255, 215, 0),
        "gray" | "grey" => return Rgb888::new(120, 120, 120),
        "orange" => return Rgb888::new(255, 140, 0),
        "meals" => return Rgb888::new(140, 90, 0),
        _ => {}
    }
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Rgb888::new(r, g, b);
            }
        }
    }
    Rgb888::new(0, 0, 0)
}

/// Normalize a user-facing language value to a two-letter code.
///
/// Accepts names ("Deutsch", "german") and tagged codes ("de-DE", "en_US").
pub fn normalize_language(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    if lower.is_empty() {
        return "en".to_string();
    }
    match lower.as_str() {
        "deutsch" | "german" => return "de".to_string(),
        "english" => return "en".to_string(),
        _ => {}
    }
    if lower.len() > 2 {
        let tail = lower.as_bytes()[2];
        if tail == b'-' || tail == b'_' {
            return lower[..2].to_string();
        }
    }
    lower
}

/// Weather backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    /// Primary provider; DWD falls back to OWM on failure
    #[serde(default)]
    pub provider: Provider,
    /// OpenWeatherMap API key (required for OWM and for the fallback path)
    #[serde(default)]
    pub api_key: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            latitude: 51.51,
            longitude: 13.74,
        }
    }
}

/// Full configuration for one render cycle.
///
/// Every field has a default matching the shipped device setup, so a partial
/// YAML document (or `RenderConfig::default()`) is always usable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas width in pixels (portrait)
    pub width: u32,
    /// Canvas height in pixels (portrait)
    pub height: u32,
    /// Base font size all panel fonts scale from
    pub fontsize: u32,
    /// Display language ("de" or "en"; other values render English)
    pub language: String,
    /// IANA timezone the device lives in; provider timestamps are converted
    /// into this zone before any date math
    pub timezone: String,
    pub week_start: WeekStart,
    /// Number of week rows in the month grid
    pub weeks: u32,
    /// Shift of the grid start, in weeks (usually -1 to show last week)
    pub week_start_offset: i64,
    /// Agenda window length in days
    pub agenda_days: i64,
    /// Time format (strftime) for agenda entries
    pub time_format: String,
    /// Header title format (strftime; weekday/month names are localized)
    pub title_format: String,

    pub weather: WeatherConfig,
    pub feeds: Vec<FeedConfig>,

    pub show_current_temp: bool,
    pub show_suntime: bool,
    /// Query and draw severe-weather markers (DWD provider only)
    pub show_alerts: bool,
    /// In DWD mode, fetch sunrise/sunset from OWM instead of computing them
    pub dwd_use_owm_sun_times: bool,
    /// Tint condition icons and metric values instead of all-black
    pub color_conditions: bool,

    pub summary_scope_temp: SummaryScope,
    pub summary_scope_precip_prob: SummaryScope,
    pub summary_scope_precip_rate: SummaryScope,
    pub summary_scope_wind: SummaryScope,
    pub summary_scope_sunshine: SummaryScope,

    /// Fixed precipitation axis bound when auto mode is off (mm/h)
    pub max_precip_mm: f64,
    pub chart_auto_precip_max: bool,
    /// How many forecast hours the chart spans
    pub chart_display_hours: i64,
    /// Start the chart at midnight instead of "now"
    pub chart_include_past_hours: bool,
    pub chart_night_shading: bool,
    /// Sub-day tick labels at 6/12/18 h
    pub chart_hour_markers: bool,

    /// Battery glyph appears only at or below this percentage
    pub battery_show_below: f32,
    /// Show the month name instead of "1" on the first of a month
    pub month_label_first_day: bool,
    pub calendar_show_moon: bool,

    /// Day headers closer than this render as Today/Tomorrow/...
    pub agenda_relative_days: i64,
    /// Header format for days within the same week (strftime)
    pub agenda_weekday_format: String,
    /// Header format for far-away days (strftime)
    pub agenda_date_format: String,

    pub show_last_updated: bool,
    pub last_updated_format: String,
    pub show_weather_fallback_info: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: crate::DISPLAY_WIDTH,
            height: crate::DISPLAY_HEIGHT,
            fontsize: 20,
            language: "de".to_string(),
            timezone: "Europe/Berlin".to_string(),
            week_start: WeekStart::Monday,
            weeks: 5,
            week_start_offset: -1,
            agenda_days: 7,
            time_format: "%H:%M".to_string(),
            title_format: "%A, %-d. %B".to_string(),
            weather: WeatherConfig::default(),
            feeds: Vec::new(),
            show_current_temp: true,
            show_suntime: true,
            show_alerts: true,
            dwd_use_owm_sun_times: false,
            color_conditions: true,
            summary_scope_temp: SummaryScope::Day,
            summary_scope_precip_prob: SummaryScope::Day,
            summary_scope_precip_rate: SummaryScope::Day,
            summary_scope_wind: SummaryScope::Day,
            summary_scope_sunshine: SummaryScope::Day,
            max_precip_mm: 5.0,
            chart_auto_precip_max: true,
            chart_display_hours: 72,
            chart_include_past_hours: false,
            chart_night_shading: true,
            chart_hour_markers: true,
            battery_show_below: 20.0,
            month_label_first_day: true,
            calendar_show_moon: true,
            agenda_relative_days: 2,
            agenda_weekday_format: "%A".to_string(),
            agenda_date_format: "%d.%m.%Y".to_string(),
            show_last_updated: true,
            last_updated_format: "%H:%M".to_string(),
            show_weather_fallback_info: true,
        }
    }
}

impl RenderConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(format!("Invalid config YAML: {}", e)))
    }

    /// Normalized two-letter language code.
    pub fn lang(&self) -> String {
        normalize_language(&self.language)
    }

    /// Parsed device timezone; unknown names fall back to Europe/Berlin.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone '{}', using Europe/Berlin", self.timezone);
            chrono_tz::Europe::Berlin
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_named() {
        assert_eq!(parse_color("yellow"), Rgb888::new(255, 215, 0));
        assert_eq!(parse_color(" GREEN "), Rgb888::new(0, 140, 0));
        assert_eq!(parse_color("meals"), Rgb888::new(140, 90, 0));
        assert_eq!(parse_color(""), Rgb888::new(0, 0, 0));
    }

    #[test]
    fn test_parse_color_hex() {
        assert_eq!(parse_color("#ff8800"), Rgb888::new(255, 136, 0));
        assert_eq!(parse_color("#FF8800"), Rgb888::new(255, 136, 0));
        // Malformed hex falls back to black
        assert_eq!(parse_color("#ff88"), Rgb888::new(0, 0, 0));
        assert_eq!(parse_color("#zzzzzz"), Rgb888::new(0, 0, 0));
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("Deutsch"), "de");
        assert_eq!(normalize_language("de-DE"), "de");
        assert_eq!(normalize_language("en_US"), "en");
        assert_eq!(normalize_language(""), "en");
        assert_eq!(normalize_language("fr"), "fr");
    }

    #[test]
    fn test_feed_meals_tag() {
        let feed = FeedConfig {
            name: "Essen".to_string(),
            url: None,
            color: "meals".to_string(),
        };
        assert!(feed.is_meals());
        assert_eq!(feed.rgb(), Rgb888::new(140, 90, 0));
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
language: en
weeks: 4
weather:
  provider: dwd
  latitude: 52.5
  longitude: 13.4
feeds:
  - name: Familie
    color: yellow
"#;
        let config = RenderConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.lang(), "en");
        assert_eq!(config.weeks, 4);
        assert_eq!(config.weather.provider, Provider::Dwd);
        assert_eq!(config.feeds.len(), 1);
        // Untouched fields keep their defaults
        assert_eq!(config.width, 480);
        assert_eq!(config.agenda_days, 7);
        assert!(config.chart_auto_precip_max);
    }

    #[test]
    fn test_timezone_fallback() {
        let mut config = RenderConfig::default();
        assert_eq!(config.tz(), chrono_tz::Europe::Berlin);
        config.timezone = "UTC".to_string();
        assert_eq!(config.tz(), chrono_tz::UTC);
        config.timezone = "Mars/Olympus".to_string();
        assert_eq!(config.tz(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_default_is_usable() {
        let config = RenderConfig::default();
        assert_eq!(config.width, 480);
        assert_eq!(config.height, 800);
        assert_eq!(config.weather.provider, Provider::Owm);
        assert_eq!(config.week_start, WeekStart::Monday);
    }
}
