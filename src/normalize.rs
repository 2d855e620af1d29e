//! Normalization of a raw multi-day forecast into the [`Weather`] display model.
//!
//! The hourly strip is a rolling 24-hour window anchored at the reference
//! hour, so it usually starts part way through today and continues into
//! tomorrow.

use chrono::{NaiveDateTime, Timelike};

use crate::error::{Result, WxError};
use crate::units::round_half_up;
use crate::weather::{
    Condition, Current, CurrentReadings, Daily, Hourly, RawDailyForecast, RawHourlyRecord,
    Weather,
};

pub const WINDOW_HOURS: usize = 24;

/// Builds the display model from raw forecast days and current readings.
///
/// # Errors
///
/// Returns [`WxError::InvalidInput`] if `days` is empty.
pub fn normalize(
    days: &[RawDailyForecast],
    current: &CurrentReadings,
    location: &str,
    reference: NaiveDateTime,
) -> Result<Weather> {
    if days.is_empty() {
        return Err(WxError::InvalidInput(
            "forecast contains no days".to_string(),
        ));
    }

    let hourly = rolling_window(days, reference.hour() as usize)
        .map(|record| Hourly {
            time: format!("{}:00", record.time.hour()),
            temp: round_half_up(record.temp_c),
            condition: Condition::classify(&record.condition),
        })
        .collect();

    let forecast = days
        .iter()
        .map(|day| Daily {
            day: day.date.format("%A").to_string(),
            temp: round_half_up(day.avg_temp_c),
            condition: Condition::classify(&day.condition),
        })
        .collect();

    Ok(Weather {
        location: location.to_string(),
        current: Current {
            temp: round_half_up(current.temp_c),
            condition: Condition::classify(&current.condition),
            humidity: current.humidity,
            wind: round_half_up(current.wind_kph),
        },
        hourly,
        forecast,
    })
}

/// Today's hours from `hour` onwards, topped up from the following days until
/// the window is full or the input runs out.
fn rolling_window(
    days: &[RawDailyForecast],
    hour: usize,
) -> impl Iterator<Item = &RawHourlyRecord> {
    let (today, rest) = match days.split_first() {
        Some((today, rest)) => (today.hours.get(hour..).unwrap_or_default(), rest),
        None => (&[][..], days),
    };

    today
        .iter()
        .chain(rest.iter().flat_map(|day| day.hours.iter()))
        .take(WINDOW_HOURS)
}
