//! Bright Sky client for DWD observations and forecast.
//!
//! Bright Sky serves hourly rows from yesterday through ten days out. Rows
//! carry 1-hour precipitation and km/h wind, which normalize here into the
//! shared 3-hour-equivalent / m/s sample shape. DWD station data is
//! Germany-centric, so the query is pinned to Europe/Berlin regardless of the
//! configured display timezone.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::astro;
use crate::config::{Provider, RenderConfig};
use crate::error::Error;
use crate::weather::{alerts, owm, CurrentConditions, HourlySample, WeatherReport};

const BASE_URL: &str = "https://api.brightsky.dev";
const DWD_TZ: Tz = chrono_tz::Europe::Berlin;

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<WeatherRow>,
}

/// One hourly row as Bright Sky serves it. The sunshine column has gone by
/// several names across API revisions; all of them land in one field.
#[derive(Debug, Deserialize)]
struct WeatherRow {
    timestamp: String,
    temperature: Option<f64>,
    precipitation: Option<f64>,
    wind_speed: Option<f64>,
    precipitation_probability: Option<f64>,
    icon: Option<String>,
    condition: Option<String>,
    solar: Option<f64>,
    #[serde(
        alias = "sunshine_duration",
        alias = "sunshine_minutes",
        alias = "sunshine_hours"
    )]
    sunshine: Option<f64>,
    source_id: Option<i64>,
}

/// Translate a Bright Sky icon name to the OWM icon code the renderer uses.
fn map_icon(name: &str) -> &'static str {
    match name.to_lowercase().as_str() {
        "clear-day" => "01d",
        "clear-night" => "01n",
        "partly-cloudy-day" => "02d",
        "partly-cloudy-night" => "02n",
        "cloudy" => "04d",
        "fog" => "50d",
        "rain" => "10d",
        "sleet" => "09d",
        "snow" => "13d",
        "hail" => "13d",
        "thunderstorm" => "11d",
        "wind" => "03d",
        _ => "03d",
    }
}

/// Convert raw rows into normalized samples, dropping rows without a
/// temperature. Timestamps convert into the display timezone.
fn rows_to_samples(rows: Vec<WeatherRow>, tz: Tz) -> Vec<HourlySample> {
    let mut samples: Vec<HourlySample> = rows
        .into_iter()
        .filter_map(|row| {
            let utc: DateTime<Utc> = DateTime::parse_from_rfc3339(&row.timestamp)
                .ok()?
                .with_timezone(&Utc);
            let temperature = row.temperature?;
            let precip_1h = row.precipitation.unwrap_or(0.0);
            let wind_kmh = row.wind_speed.unwrap_or(0.0);
            Some(HourlySample {
                timestamp: utc.with_timezone(&tz).naive_local(),
                temperature,
                temp_min: temperature,
                temp_max: temperature,
                precip_3h_mm: precip_1h * 3.0,
                wind_speed: wind_kmh / 3.6,
                precip_probability: row.precipitation_probability.unwrap_or(0.0),
                condition_icon: map_icon(row.icon.as_deref().unwrap_or("")).to_string(),
                sunshine: row.sunshine,
                solar: row.solar,
                condition: row.condition,
                source_id: row.source_id,
            })
        })
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    samples
}

fn fetch_rows(lat: f64, lon: f64) -> Result<Vec<WeatherRow>, Error> {
    let today = Utc::now().with_timezone(&DWD_TZ).date_naive();
    let first = today - Duration::days(1);
    let last = today + Duration::days(10);
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let response: WeatherResponse = client
        .get(format!("{}/weather", BASE_URL))
        .query(&[
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("date", first.format("%Y-%m-%d").to_string()),
            ("last_date", last.format("%Y-%m-%d").to_string()),
            ("tz", DWD_TZ.name().to_string()),
        ])
        .send()?
        .error_for_status()?
        .json()?;
    Ok(response.weather)
}

/// Fetch a full report from Bright Sky.
///
/// Sunrise/sunset defaults to the deterministic solar calculation; the
/// config can opt into fetching it from OWM instead (failures there fall
/// back to the calculation silently).
pub(super) fn fetch_report(
    config: &RenderConfig,
    now: NaiveDateTime,
) -> Result<WeatherReport, Error> {
    let tz = config.tz();
    let lat = config.weather.latitude;
    let lon = config.weather.longitude;

    let rows = fetch_rows(lat, lon)?;
    let hourly = rows_to_samples(rows, tz);
    let current_like = super::nearest_sample(&hourly, now)
        .cloned()
        .ok_or(Error::Provider {
            provider: "dwd",
            reason: "Bright Sky returned no usable hourly rows".to_string(),
        })?;

    let (mut sunrise, mut sunset) = (None, None);
    if config.dwd_use_owm_sun_times {
        if let Some(api_key) = config.weather.api_key.as_deref() {
            match owm::fetch_sun_times(api_key, lat, lon, tz) {
                Ok((rise, set)) => {
                    sunrise = rise;
                    sunset = set;
                }
                Err(err) => {
                    tracing::warn!("OWM sun times unavailable, computing locally: {}", err);
                }
            }
        }
    }
    if sunrise.is_none() || sunset.is_none() {
        let (rise_utc, set_utc) = astro::sunrise_sunset_utc(lat, lon, now.date());
        sunrise = sunrise.or_else(|| rise_utc.map(|t| t.with_timezone(&tz).naive_local()));
        sunset = sunset.or_else(|| set_utc.map(|t| t.with_timezone(&tz).naive_local()));
    }

    let markers = if config.show_alerts {
        alerts::fetch_markers(lat, lon).unwrap_or_else(|err| {
            tracing::warn!("Alert fetch failed, rendering without markers: {}", err);
            Vec::new()
        })
    } else {
        Vec::new()
    };

    let current = CurrentConditions {
        temperature: current_like.temperature,
        wind_speed: current_like.wind_speed,
        precip_rate_mmh: Some(current_like.precip_3h_mm / 3.0),
        condition: current_like.condition.clone().unwrap_or_default(),
        icon: current_like.condition_icon.clone(),
        sunrise,
        sunset,
    };

    Ok(WeatherReport {
        provider: Provider::Dwd,
        hourly,
        current,
        markers,
        fallback_used: false,
    })
}
