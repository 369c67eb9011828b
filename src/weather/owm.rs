//! OpenWeatherMap client (current weather + 3-hourly forecast).

use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::config::{Provider, RenderConfig};
use crate::error::Error;
use crate::weather::{CurrentConditions, HourlySample, WeatherReport};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: CurrentMain,
    #[serde(default)]
    wind: WindBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    rain: Option<VolumeBlock>,
    #[serde(default)]
    sys: SysBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WindBlock {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

/// Rain/snow volume; OWM keys these by accumulation window.
#[derive(Debug, Default, Deserialize)]
struct VolumeBlock {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SysBlock {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: ForecastMain,
    #[serde(default)]
    wind: WindBlock,
    /// Probability of precipitation, 0.0..=1.0
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    rain: Option<VolumeBlock>,
    #[serde(default)]
    snow: Option<VolumeBlock>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

fn local_from_unix(ts: i64, tz: Tz) -> Option<NaiveDateTime> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|t| t.with_timezone(&tz).naive_local())
}

fn entries_to_samples(entries: Vec<ForecastEntry>, tz: Tz) -> Vec<HourlySample> {
    let mut samples: Vec<HourlySample> = entries
        .into_iter()
        .filter_map(|entry| {
            let timestamp = local_from_unix(entry.dt, tz)?;
            let rain = entry
                .rain
                .as_ref()
                .and_then(|v| v.three_hours)
                .unwrap_or(0.0);
            let snow = entry
                .snow
                .as_ref()
                .and_then(|v| v.three_hours)
                .unwrap_or(0.0);
            Some(HourlySample {
                timestamp,
                temperature: entry.main.temp,
                temp_min: entry.main.temp_min,
                temp_max: entry.main.temp_max,
                precip_3h_mm: rain + snow,
                wind_speed: entry.wind.speed,
                precip_probability: entry.pop * 100.0,
                condition_icon: entry
                    .weather
                    .first()
                    .map(|w| w.icon.clone())
                    .unwrap_or_default(),
                sunshine: None,
                solar: None,
                condition: None,
                source_id: None,
            })
        })
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    samples
}

fn client() -> Result<reqwest::blocking::Client, Error> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(8))
        .build()?)
}

fn fetch_current(api_key: &str, lat: f64, lon: f64, lang: &str) -> Result<CurrentResponse, Error> {
    Ok(client()?
        .get(format!("{}/weather", BASE_URL))
        .query(&[
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", api_key.to_string()),
            ("units", "Metric".to_string()),
            ("lang", lang.to_string()),
        ])
        .send()?
        .error_for_status()?
        .json()?)
}

fn fetch_forecast(
    api_key: &str,
    lat: f64,
    lon: f64,
    lang: &str,
) -> Result<ForecastResponse, Error> {
    Ok(client()?
        .get(format!("{}/forecast", BASE_URL))
        .query(&[
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", api_key.to_string()),
            ("units", "Metric".to_string()),
            ("lang", lang.to_string()),
        ])
        .send()?
        .error_for_status()?
        .json()?)
}

/// Sunrise/sunset for the DWD branch's optional OWM override.
pub(super) fn fetch_sun_times(
    api_key: &str,
    lat: f64,
    lon: f64,
    tz: Tz,
) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>), Error> {
    let current = fetch_current(api_key, lat, lon, "en")?;
    Ok((
        current.sys.sunrise.and_then(|ts| local_from_unix(ts, tz)),
        current.sys.sunset.and_then(|ts| local_from_unix(ts, tz)),
    ))
}

/// Fetch a full report from OpenWeatherMap.
pub(super) fn fetch_report(
    config: &RenderConfig,
    _now: NaiveDateTime,
) -> Result<WeatherReport, Error> {
    let api_key = config.weather.api_key.as_deref().ok_or(Error::Provider {
        provider: "owm",
        reason: "no API key configured".to_string(),
    })?;
    let tz = config.tz();
    let lat = config.weather.latitude;
    let lon = config.weather.longitude;
    let lang = config.lang();

    let current_raw = fetch_current(api_key, lat, lon, &lang)?;
    let forecast = fetch_forecast(api_key, lat, lon, &lang)?;
    let hourly = entries_to_samples(forecast.list, tz);

    let precip_rate_mmh = current_raw.rain.as_ref().and_then(|rain| {
        rain.one_hour
            .or_else(|| rain.three_hours.map(|v| v / 3.0))
    });
    let condition = current_raw.weather.first();
    let current = CurrentConditions {
        temperature: current_raw.main.temp,
        wind_speed: current_raw.wind.speed,
        precip_rate_mmh,
        condition: condition.map(|w| w.description.clone()).unwrap_or_default(),
        icon: condition.map(|w| w.icon.clone()).unwrap_or_default(),
        sunrise: current_raw.sys.sunrise.and_then(|ts| local_from_unix(ts, tz)),
        sunset: current_raw.sys.sunset.and_then(|ts| local_from_unix(ts, tz)),
    };

    Ok(WeatherReport {
        provider: Provider::Owm,
        hourly,
        current,
        markers: Vec::new(),
        fallback_used: false,
    })
}
