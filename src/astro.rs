//! Solar and lunar calculations.
//!
//! Sunrise/sunset comes from the NOAA solar position algorithm so the DWD
//! provider never needs a second network call for sun times. The moon phase
//! index is computed in scaled-integer arithmetic; the render loop runs for
//! months on end and a float accumulation of lunation fractions would slowly
//! drift across phase boundaries.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Reference new moon: 2001-01-01 00:00 UTC.
fn lunar_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Fixed-point scale for lunation arithmetic. Both lunation constants are
/// exact at this precision.
const SCALE: i128 = 1_000_000_000_000;
/// 0.20439731 lunations at the epoch.
const EPOCH_LUNATION: i128 = 204_397_310_000;
/// 0.03386319269 lunations per day (1 / 29.53059 d synodic month).
const LUNATIONS_PER_DAY: i128 = 33_863_192_690;

/// Moon phase as an 8-step cycle index.
///
/// 0 = new, 2 = first quarter, 4 = full, 6 = last quarter; odd values are the
/// crescent/gibbous steps in between.
pub fn moon_phase_index(at: NaiveDateTime) -> u8 {
    let seconds = (at - lunar_epoch()).num_seconds() as i128;
    let lunations = EPOCH_LUNATION + seconds * LUNATIONS_PER_DAY / 86_400;
    let position = lunations.rem_euclid(SCALE);
    ((position * 8 + SCALE / 2) / SCALE) as u8 & 7
}

/// Whether the index is one of the four principal phases drawn on the grid.
pub fn is_principal_phase(index: u8) -> bool {
    matches!(index, 0 | 2 | 4 | 6)
}

/// Sunrise and sunset (UTC) for a day and location, via the NOAA algorithm.
///
/// Either value is `None` when the sun does not cross the horizon that day
/// (polar day/night).
pub fn sunrise_sunset_utc(
    lat: f64,
    lon: f64,
    day: NaiveDate,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    (
        solar_crossing(lat, lon, day, true),
        solar_crossing(lat, lon, day, false),
    )
}

fn solar_crossing(lat: f64, lon: f64, day: NaiveDate, is_sunrise: bool) -> Option<DateTime<Utc>> {
    let zenith = 90.833f64.to_radians();
    let n = f64::from(day.ordinal());
    let lng_hour = lon / 15.0;
    let approx_hour = if is_sunrise { 6.0 } else { 18.0 };
    let t = n + (approx_hour - lng_hour) / 24.0;

    let m = 0.9856 * t - 3.289;
    let mut l =
        m + 1.916 * m.to_radians().sin() + 0.020 * (2.0 * m).to_radians().sin() + 282.634;
    l = l.rem_euclid(360.0);

    let mut ra = (0.91764 * l.to_radians().tan()).atan().to_degrees();
    ra = ra.rem_euclid(360.0);
    let l_quadrant = (l / 90.0).floor() * 90.0;
    let ra_quadrant = (ra / 90.0).floor() * 90.0;
    ra = (ra + (l_quadrant - ra_quadrant)) / 15.0;

    let sin_dec = 0.39782 * l.to_radians().sin();
    let cos_dec = sin_dec.asin().cos();
    let cos_h =
        (zenith.cos() - sin_dec * lat.to_radians().sin()) / (cos_dec * lat.to_radians().cos());
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }

    let mut h = if is_sunrise {
        360.0 - cos_h.acos().to_degrees()
    } else {
        cos_h.acos().to_degrees()
    };
    h /= 15.0;

    let local_t = h + ra - 0.06571 * t - 6.622;
    let ut = (local_t - lng_hour).rem_euclid(24.0);

    let hh = ut.floor();
    let mm = ((ut - hh) * 60.0).floor();
    let ss = ((((ut - hh) * 60.0) - mm) * 60.0).round();

    let midnight = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?);
    Some(
        midnight
            + Duration::hours(hh as i64)
            + Duration::minutes(mm as i64)
            + Duration::seconds(ss as i64),
    )
}
