use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Coarse condition taxonomy used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Sunny,
    Cloudy,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Rainy,
    Windy,
}

impl Condition {
    /// Classifies free-form provider text. First matching rule wins and
    /// anything unrecognized falls back to `Cloudy`.
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        let has = |needle: &str| text.contains(needle);

        if has("sunny") || has("clear") {
            Condition::Sunny
        } else if has("rain") || has("drizzle") || has("thunder") {
            Condition::Rainy
        } else if has("cloudy") && has("partly") {
            Condition::PartlyCloudy
        } else if has("cloudy") || has("overcast") {
            Condition::Cloudy
        } else if has("wind") {
            Condition::Windy
        } else {
            Condition::Cloudy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Condition::Sunny => "Sunny",
            Condition::Cloudy => "Cloudy",
            Condition::PartlyCloudy => "Partly Cloudy",
            Condition::Rainy => "Rainy",
            Condition::Windy => "Windy",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Condition::Sunny => "☀",
            Condition::Cloudy => "☁",
            Condition::PartlyCloudy => "⛅",
            Condition::Rainy => "☂",
            Condition::Windy => "≋",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawHourlyRecord {
    pub time: NaiveDateTime,
    pub temp_c: f64,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDailyForecast {
    pub date: NaiveDate,
    pub avg_temp_c: f64,
    pub condition: String,
    pub hours: Vec<RawHourlyRecord>,
}

/// Scalar current-condition readings reported alongside the forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentReadings {
    pub temp_c: f64,
    pub humidity: u8,
    pub wind_kph: f64,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Current {
    pub temp: i32,
    pub condition: Condition,
    pub humidity: u8,
    pub wind: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hourly {
    pub time: String,
    pub temp: i32,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Daily {
    pub day: String,
    pub temp: i32,
    pub condition: Condition,
}

/// Display model handed to the renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weather {
    pub location: String,
    pub current: Current,
    pub hourly: Vec<Hourly>,
    pub forecast: Vec<Daily>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sunny_and_clear() {
        assert_eq!(Condition::classify("Sunny"), Condition::Sunny);
        assert_eq!(Condition::classify("Clear "), Condition::Sunny);
        assert_eq!(Condition::classify("mostly CLEAR skies"), Condition::Sunny);
    }

    #[test]
    fn test_rainy() {
        assert_eq!(Condition::classify("Light rain showers"), Condition::Rainy);
        assert_eq!(Condition::classify("Patchy light drizzle"), Condition::Rainy);
        assert_eq!(
            Condition::classify("Thundery outbreaks possible"),
            Condition::Rainy
        );
    }

    #[test]
    fn test_partly_cloudy_beats_cloudy() {
        assert_eq!(Condition::classify("Partly cloudy"), Condition::PartlyCloudy);
        assert_eq!(Condition::classify("cloudy, partly"), Condition::PartlyCloudy);
    }

    #[test]
    fn test_cloudy_and_overcast() {
        assert_eq!(Condition::classify("Cloudy"), Condition::Cloudy);
        assert_eq!(Condition::classify("Overcast"), Condition::Cloudy);
        assert_eq!(Condition::classify("partly overcast"), Condition::Cloudy);
    }

    #[test]
    fn test_windy() {
        assert_eq!(Condition::classify("Windy"), Condition::Windy);
        assert_eq!(Condition::classify("strong winds"), Condition::Windy);
    }

    #[test]
    fn test_precedence() {
        // sunny is checked before rain, rain before wind
        assert_eq!(Condition::classify("sunny with rain later"), Condition::Sunny);
        assert_eq!(Condition::classify("windy with rain"), Condition::Rainy);
        assert_eq!(Condition::classify("cloudy and windy"), Condition::Cloudy);
    }

    #[test]
    fn test_fallback() {
        assert_eq!(Condition::classify("foggy mist"), Condition::Cloudy);
        assert_eq!(Condition::classify(""), Condition::Cloudy);
    }

    #[test]
    fn test_serialized_label() {
        let json = serde_json::to_string(&Condition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"Partly Cloudy\"");
        assert_eq!(Condition::PartlyCloudy.to_string(), "Partly Cloudy");
    }
}
