//! # frameboard
//!
//! Render pipeline for a battery-powered 6-color e-paper statusboard.
//!
//! The target device is a 480x800 portrait photo frame that wakes up, pulls
//! one frame from the server, and goes back to deep sleep. This crate builds
//! that frame:
//!
//! - **Weather**: DWD (via Bright Sky) with OpenWeatherMap fallback, plus
//!   severe-weather markers
//! - **Calendar**: a multi-week month grid and a day-grouped agenda from
//!   pre-expanded feed occurrences
//! - **Layout**: header, weather summary with a temperature/precipitation
//!   chart, month grid, and agenda, composed onto an RGB canvas
//! - **Encoding**: palette quantization into the device's hex-stream format
//! - **Scheduling**: interval-aligned wakeups with a configurable quiet
//!   window
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use frameboard::{encode, fetch_weather, summarize, LayoutEngine, RenderConfig, RenderInput};
//!
//! let config = RenderConfig::load("config.yaml")?;
//! let now = chrono::Utc::now().with_timezone(&config.tz()).naive_local();
//!
//! let report = fetch_weather(&config, now)?;
//! let summary = summarize(&report, &config, now);
//!
//! let mut engine = LayoutEngine::new(config);
//! let canvas = engine.render(&RenderInput {
//!     summary: &summary,
//!     hourly: &report.hourly,
//!     events: &[],
//!     day_map: &Default::default(),
//!     agenda: &Default::default(),
//!     now,
//!     battery_percent: None,
//!     fallback_used: report.fallback_used,
//! });
//! let payload = encode::encode(&canvas);
//! ```
//!
//! ## Display
//!
//! The panel is 480x800 pixels with a fixed 6-color palette (black, white,
//! yellow, red, blue, green). The firmware consumes an ASCII hex stream of
//! packed 4-bit palette indices; see [`encode`] for the exact format.
//!
//! ## Time handling
//!
//! All rendering works in naive local time. The configured IANA timezone is
//! applied once when converting provider timestamps; everything downstream
//! compares and formats `NaiveDateTime`s.

pub mod astro;
pub mod canvas;
pub mod config;
pub mod encode;
mod error;
pub mod events;
pub mod layout;
pub mod locale;
pub mod wake;
pub mod weather;

pub use canvas::Canvas;
pub use config::{Provider, RenderConfig, WeekStart};
pub use error::Error;
pub use layout::{IconCache, LayoutEngine, RenderInput};
pub use wake::{next_wakeup, WakePlan, MIN_SLEEP_MS};
pub use weather::{fetch_weather, summarize, WeatherReport, WeatherSummary};

/// Panel width in pixels (portrait)
pub const DISPLAY_WIDTH: u32 = 480;

/// Panel height in pixels (portrait)
pub const DISPLAY_HEIGHT: u32 = 800;

/// LiPo battery minimum voltage (0%)
pub const BATTERY_MIN_MV: u32 = 3000;

/// LiPo battery maximum voltage (100%)
pub const BATTERY_MAX_MV: u32 = 4200;

/// Convert battery voltage (in millivolts) to percentage.
///
/// Uses standard LiPo voltage curve: 3.0V (0%) to 4.2V (100%).
///
/// # Example
///
/// ```
/// use frameboard::battery_percentage;
///
/// assert_eq!(battery_percentage(4200), 100);
/// assert_eq!(battery_percentage(3600), 50);
/// assert_eq!(battery_percentage(3000), 0);
/// ```
pub fn battery_percentage(voltage_mv: u32) -> u8 {
    if voltage_mv <= BATTERY_MIN_MV {
        0
    } else if voltage_mv >= BATTERY_MAX_MV {
        100
    } else {
        ((voltage_mv - BATTERY_MIN_MV) * 100 / (BATTERY_MAX_MV - BATTERY_MIN_MV)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_percentage() {
        assert_eq!(battery_percentage(4200), 100);
        assert_eq!(battery_percentage(4201), 100); // Clamp high
        assert_eq!(battery_percentage(3000), 0);
        assert_eq!(battery_percentage(2999), 0); // Clamp low
        assert_eq!(battery_percentage(3600), 50);
    }

    #[test]
    fn test_constants() {
        assert_eq!(DISPLAY_WIDTH, 480);
        assert_eq!(DISPLAY_HEIGHT, 800);
    }
}
