//! Multi-provider weather aggregation.
//!
//! Two backends normalize into one report shape:
//!
//! - **DWD** (via Bright Sky): hourly local series plus severe-weather
//!   alerts. Sunrise/sunset is computed deterministically unless the config
//!   opts into fetching it from OWM.
//! - **OWM** (OpenWeatherMap): current weather plus a 3-hourly forecast.
//!
//! The DWD branch is the only one with a fallback: any fetch or parse
//! failure, or a series without a usable current-like sample, silently
//! degrades to OWM and flags `fallback_used` so the footer can say so. If
//! the fallback fails too, the whole render fails — a partial weather panel
//! is never drawn.

mod alerts;
mod dwd;
mod owm;

pub use alerts::{Focus, WarningMarker};

use chrono::{Duration, NaiveDateTime};

use crate::config::{Provider, RenderConfig, SummaryScope};
use crate::error::Error;

/// One normalized forecast hour (or 3-hour step for OWM).
#[derive(Debug, Clone)]
pub struct HourlySample {
    /// Local wall-clock time of the sample
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Precipitation normalized to a 3-hour-equivalent figure (mm)
    pub precip_3h_mm: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Probability of precipitation in percent
    pub precip_probability: f64,
    /// OWM-style icon code ("01d", "10n", ...)
    pub condition_icon: String,
    /// Raw sunshine figure in provider units (see [`normalize_sunshine_hours`])
    pub sunshine: Option<f64>,
    /// Hourly solar energy (kWh/m²), DWD only
    pub solar: Option<f64>,
    /// Raw condition text, DWD only
    pub condition: Option<String>,
    /// Observing station id, DWD only
    pub source_id: Option<i64>,
}

/// Current conditions as reported (or approximated) by the provider.
#[derive(Debug, Clone)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub wind_speed: f64,
    /// Current precipitation rate in mm/h, when the provider reports one
    pub precip_rate_mmh: Option<f64>,
    /// Raw condition description (localized later)
    pub condition: String,
    pub icon: String,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

/// Everything one fetch cycle produced.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    /// Provider that actually supplied the data (after any fallback)
    pub provider: Provider,
    pub hourly: Vec<HourlySample>,
    pub current: CurrentConditions,
    pub markers: Vec<WarningMarker>,
    pub fallback_used: bool,
}

/// Derived per-render aggregate the weather panel draws from.
#[derive(Debug, Clone)]
pub struct WeatherSummary {
    pub icon: String,
    pub temp_now: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub precip_probability_max: f64,
    pub precip_rate_now: f64,
    pub wind_max: f64,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    /// Raw condition text; localize with [`crate::locale::condition_text`]
    pub condition_text: String,
    pub sunshine_hours: Option<f64>,
    pub warning_markers: Vec<WarningMarker>,
}

/// Fetch weather from the configured provider, falling back DWD -> OWM.
pub fn fetch_weather(config: &RenderConfig, now: NaiveDateTime) -> Result<WeatherReport, Error> {
    match config.weather.provider {
        Provider::Dwd => match dwd::fetch_report(config, now) {
            Ok(report) => Ok(report),
            Err(err) => {
                tracing::warn!("DWD fetch failed, falling back to OWM: {}", err);
                let mut report = owm::fetch_report(config, now)
                    .map_err(|fallback_err| {
                        tracing::warn!("OWM fallback failed too: {}", fallback_err);
                        Error::WeatherUnavailable
                    })?;
                report.fallback_used = true;
                Ok(report)
            }
        },
        Provider::Owm => owm::fetch_report(config, now),
    }
}

/// Subset selection for one summary metric.
fn scope_subset<'a>(
    hourly: &'a [HourlySample],
    scope: SummaryScope,
    now: NaiveDateTime,
) -> Vec<&'a HourlySample> {
    let subset: Vec<&HourlySample> = match scope {
        SummaryScope::Day => hourly
            .iter()
            .filter(|s| s.timestamp.date() == now.date())
            .collect(),
        SummaryScope::Next24h => hourly
            .iter()
            .filter(|s| s.timestamp >= now && s.timestamp < now + Duration::hours(24))
            .collect(),
    };
    if subset.is_empty() {
        // Thin series (e.g. late evening with day scope): take the first
        // eight steps so the summary never goes blank.
        hourly.iter().take(8).collect()
    } else {
        subset
    }
}

/// Statistical mode of icon codes; ties break to the first occurrence.
fn icon_mode(samples: &[&HourlySample]) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for sample in samples {
        let icon = sample.condition_icon.as_str();
        if icon.is_empty() {
            continue;
        }
        let count = samples
            .iter()
            .filter(|s| s.condition_icon == icon)
            .count();
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((icon, count)),
        }
    }
    best.map(|(icon, _)| icon.to_string())
}

/// Normalize a set of raw sunshine values into total hours.
///
/// Units are classified by the maximum observed magnitude: values above 120
/// must be seconds, above 1.5 minutes, otherwise already fractional hours.
/// This sidesteps the missing unit metadata across DWD source mixes.
pub fn normalize_sunshine_hours(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().sum();
    let vmax = values.iter().cloned().fold(f64::MIN, f64::max);
    if vmax > 120.0 {
        Some(total / 3600.0)
    } else if vmax > 1.5 {
        Some(total / 60.0)
    } else {
        Some(total)
    }
}

/// Estimate sunshine hours from hourly solar energy (kWh/m²).
///
/// A fully sunny hour yields roughly 0.33 kWh/m² on the stations feeding
/// this display, so the total scales by 1/0.33.
fn estimate_suntime_from_solar(hourly: &[&HourlySample]) -> Option<f64> {
    let values: Vec<f64> = hourly.iter().filter_map(|s| s.solar).collect();
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Some(0.0);
    }
    Some((total / 0.33).max(0.0))
}

/// Compute the displayed summary from a report.
pub fn summarize(
    report: &WeatherReport,
    config: &RenderConfig,
    now: NaiveDateTime,
) -> WeatherSummary {
    let hourly = &report.hourly;
    let current = &report.current;

    let temps_set = scope_subset(hourly, config.summary_scope_temp, now);
    let wind_set = scope_subset(hourly, config.summary_scope_wind, now);
    let pop_set = scope_subset(hourly, config.summary_scope_precip_prob, now);
    let precip_set = scope_subset(hourly, config.summary_scope_precip_rate, now);
    let sun_set = scope_subset(hourly, config.summary_scope_sunshine, now);

    let temp_min = temps_set
        .iter()
        .map(|s| s.temp_min)
        .fold(f64::INFINITY, f64::min);
    let temp_max = temps_set
        .iter()
        .map(|s| s.temp_max)
        .fold(f64::NEG_INFINITY, f64::max);
    let (temp_min, temp_max) = if temps_set.is_empty() {
        (current.temperature, current.temperature)
    } else {
        (temp_min, temp_max)
    };

    let wind_max = wind_set
        .iter()
        .map(|s| s.wind_speed)
        .fold(f64::NEG_INFINITY, f64::max);
    let wind_max = if wind_set.is_empty() {
        current.wind_speed
    } else {
        wind_max
    };

    let precip_probability_max = pop_set
        .iter()
        .map(|s| s.precip_probability)
        .fold(0.0, f64::max);

    let precip_rates: Vec<f64> = precip_set.iter().map(|s| s.precip_3h_mm / 3.0).collect();
    let precip_rate_now = match report.provider {
        // DWD delivers true 1-hour rates; the summary shows the scope max.
        Provider::Dwd => precip_rates.iter().cloned().fold(0.0, f64::max),
        Provider::Owm => current
            .precip_rate_mmh
            .or_else(|| precip_rates.first().copied())
            .unwrap_or(0.0),
    }
    .max(0.0);

    let sunshine_hours = {
        let values: Vec<f64> = sun_set.iter().filter_map(|s| s.sunshine).collect();
        normalize_sunshine_hours(&values).or_else(|| estimate_suntime_from_solar(&sun_set))
    };

    WeatherSummary {
        icon: icon_mode(&temps_set).unwrap_or_else(|| current.icon.clone()),
        temp_now: current.temperature,
        temp_min,
        temp_max,
        precip_probability_max,
        precip_rate_now,
        wind_max,
        sunrise: current.sunrise,
        sunset: current.sunset,
        condition_text: current.condition.clone(),
        sunshine_hours,
        warning_markers: report.markers.clone(),
    }
}

/// Sample closest in time to `now`; `None` for an empty series.
pub(crate) fn nearest_sample<'a>(
    hourly: &'a [HourlySample],
    now: NaiveDateTime,
) -> Option<&'a HourlySample> {
    hourly.iter().min_by_key(|s| (s.timestamp - now).num_seconds().abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn sample(day: u32, hour: u32, temp: f64, icon: &str) -> HourlySample {
        HourlySample {
            timestamp: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            temperature: temp,
            temp_min: temp - 1.0,
            temp_max: temp + 1.0,
            precip_3h_mm: 0.0,
            wind_speed: 3.0,
            precip_probability: 10.0,
            condition_icon: icon.to_string(),
            sunshine: None,
            solar: None,
            condition: None,
            source_id: None,
        }
    }

    fn report(hourly: Vec<HourlySample>) -> WeatherReport {
        WeatherReport {
            provider: Provider::Owm,
            current: CurrentConditions {
                temperature: 15.0,
                wind_speed: 2.0,
                precip_rate_mmh: Some(0.4),
                condition: "clear sky".to_string(),
                icon: "01d".to_string(),
                sunrise: None,
                sunset: None,
            },
            hourly,
            markers: Vec::new(),
            fallback_used: false,
        }
    }

    fn noon(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_sunshine_normalization_seconds() {
        assert_eq!(normalize_sunshine_hours(&[3600.0, 1800.0]), Some(1.5));
    }

    #[test]
    fn test_sunshine_normalization_minutes() {
        assert_eq!(normalize_sunshine_hours(&[45.0, 15.0]), Some(1.0));
    }

    #[test]
    fn test_sunshine_normalization_hours() {
        assert_eq!(normalize_sunshine_hours(&[0.5, 0.25]), Some(0.75));
        assert_eq!(normalize_sunshine_hours(&[]), None);
    }

    #[test]
    fn test_icon_mode_majority() {
        let samples = vec![
            sample(1, 10, 10.0, "01d"),
            sample(1, 11, 11.0, "10d"),
            sample(1, 12, 12.0, "10d"),
        ];
        let refs: Vec<&HourlySample> = samples.iter().collect();
        assert_eq!(icon_mode(&refs), Some("10d".to_string()));
    }

    #[test]
    fn test_icon_mode_tie_takes_first_occurrence() {
        let samples = vec![
            sample(1, 10, 10.0, "02d"),
            sample(1, 11, 11.0, "10d"),
            sample(1, 12, 12.0, "02d"),
            sample(1, 13, 13.0, "10d"),
        ];
        let refs: Vec<&HourlySample> = samples.iter().collect();
        assert_eq!(icon_mode(&refs), Some("02d".to_string()));
    }

    #[test]
    fn test_scope_day_vs_next24h() {
        let samples = vec![
            sample(1, 14, 10.0, "01d"),
            sample(1, 22, 8.0, "01d"),
            sample(2, 6, 20.0, "01d"),
        ];
        let day = scope_subset(&samples, SummaryScope::Day, noon(1));
        assert_eq!(day.len(), 2);
        let next24 = scope_subset(&samples, SummaryScope::Next24h, noon(1));
        assert_eq!(next24.len(), 3);
    }

    #[test]
    fn test_scope_empty_falls_back_to_head() {
        let samples = vec![sample(3, 10, 10.0, "01d"), sample(3, 11, 10.0, "01d")];
        // No samples on May 1st, so the head of the series stands in.
        let day = scope_subset(&samples, SummaryScope::Day, noon(1));
        assert_eq!(day.len(), 2);
    }

    #[test]
    fn test_summary_min_max() {
        let samples = vec![
            sample(1, 13, 10.0, "01d"),
            sample(1, 15, 18.0, "01d"),
            sample(1, 17, 14.0, "01d"),
        ];
        let report = report(samples);
        let config = RenderConfig::default();
        let summary = summarize(&report, &config, noon(1));
        assert_eq!(summary.temp_min, 9.0);
        assert_eq!(summary.temp_max, 19.0);
        assert_eq!(summary.temp_now, 15.0);
        assert_eq!(summary.icon, "01d");
    }

    #[test]
    fn test_summary_owm_uses_current_rate() {
        let report = report(vec![sample(1, 13, 10.0, "01d")]);
        let config = RenderConfig::default();
        let summary = summarize(&report, &config, noon(1));
        assert!((summary.precip_rate_now - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_summary_dwd_uses_scope_max_rate() {
        let mut samples = vec![sample(1, 13, 10.0, "01d"), sample(1, 15, 10.0, "01d")];
        samples[0].precip_3h_mm = 0.9;
        samples[1].precip_3h_mm = 2.4;
        let mut report = report(samples);
        report.provider = Provider::Dwd;
        let config = RenderConfig::default();
        let summary = summarize(&report, &config, noon(1));
        assert!((summary.precip_rate_now - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_sample() {
        let samples = vec![
            sample(1, 10, 10.0, "01d"),
            sample(1, 13, 11.0, "01d"),
            sample(1, 16, 12.0, "01d"),
        ];
        let nearest = nearest_sample(&samples, noon(1)).unwrap();
        assert_eq!(nearest.timestamp.hour(), 13);
    }
}
