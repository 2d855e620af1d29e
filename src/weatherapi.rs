use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, WxError};
use crate::weather::{CurrentReadings, RawDailyForecast, RawHourlyRecord};

pub const BASE_URL: &str = "https://api.weatherapi.com/v1";

const FORECAST_DAYS: &str = "3";
const TIMEOUT: Duration = Duration::from_secs(10);
const FALLBACK_ERROR: &str = "Failed to fetch weather data";

/// Query that asks the provider to locate the caller by IP address.
pub const AUTO_IP: &str = "auto:ip";

pub struct WeatherApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherApi {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("wx/", env!("CARGO_PKG_VERSION")))
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetches the 3-day forecast for a place name, `"lat,lon"` pair or
    /// [`AUTO_IP`].
    pub fn forecast(&self, query: &str) -> Result<forecast::Forecast> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WxError::MissingLocation);
        }

        let url = format!("{}/forecast.json", self.base_url);
        debug!(%url, query, "fetching forecast");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("days", FORECAST_DAYS),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()?;

        Ok(check_status(response)?.json()?)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| FALLBACK_ERROR.to_string());
    warn!(status = status.as_u16(), %message, "weather provider rejected request");
    Err(WxError::Api {
        status: status.as_u16(),
        message,
    })
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug)]
struct ErrorDetail {
    message: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ConditionText {
    pub text: String,
}

pub mod forecast {
    use super::*;

    const DATE_FORMAT: &str = "%Y-%m-%d";
    const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    #[derive(Deserialize, Debug, Clone)]
    pub struct Forecast {
        pub location: Location,
        pub current: Current,
        pub forecast: Days,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Location {
        pub name: String,
        pub country: String,
        pub localtime: Option<String>,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Current {
        pub temp_c: f64,
        pub humidity: u8,
        pub wind_kph: f64,
        pub condition: ConditionText,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Days {
        #[serde(rename = "forecastday")]
        pub forecast_day: Vec<Day>,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Day {
        pub date: String,
        pub day: DaySummary,
        pub hour: Vec<Hour>,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct DaySummary {
        #[serde(rename = "avgtemp_c")]
        pub avg_temp_c: f64,
        pub condition: ConditionText,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Hour {
        pub time: String,
        pub temp_c: f64,
        pub condition: ConditionText,
    }

    impl Forecast {
        /// "City, Country" label.
        pub fn location_label(&self) -> String {
            format!("{}, {}", self.location.name, self.location.country)
        }

        /// Wall-clock time at the forecast location, if the provider sent a
        /// parseable one.
        pub fn local_time(&self) -> Option<NaiveDateTime> {
            let raw = self.location.localtime.as_deref()?;
            NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
        }

        pub fn current_readings(&self) -> CurrentReadings {
            CurrentReadings {
                temp_c: self.current.temp_c,
                humidity: self.current.humidity,
                wind_kph: self.current.wind_kph,
                condition: self.current.condition.text.clone(),
            }
        }

        pub fn raw_days(&self) -> Result<Vec<RawDailyForecast>> {
            self.forecast.forecast_day.iter().map(Day::to_raw).collect()
        }
    }

    impl Day {
        fn to_raw(&self) -> Result<RawDailyForecast> {
            let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|source| {
                WxError::Timestamp {
                    value: self.date.clone(),
                    source,
                }
            })?;
            let hours = self
                .hour
                .iter()
                .map(|hour| {
                    let time = NaiveDateTime::parse_from_str(&hour.time, TIME_FORMAT).map_err(
                        |source| WxError::Timestamp {
                            value: hour.time.clone(),
                            source,
                        },
                    )?;
                    Ok(RawHourlyRecord {
                        time,
                        temp_c: hour.temp_c,
                        condition: hour.condition.text.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(RawDailyForecast {
                date,
                avg_temp_c: self.day.avg_temp_c,
                condition: self.day.condition.text.clone(),
                hours,
            })
        }
    }
}
