use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Rounds to the nearest integer, halves towards positive infinity.
pub fn round_half_up(value: f64) -> i32 {
    let rounded = value.round();
    // f64::round takes negative halves away from zero
    if value - value.trunc() == -0.5 {
        (rounded + 1.0) as i32
    } else {
        rounded as i32
    }
}

/// Wind is always shown in km/h, whatever the temperature unit.
pub fn format_wind(kph: i32) -> String {
    format!("{kph} km/h")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    /// Converts a whole-degree Celsius value for display.
    pub fn temp(&self, temp_c: i32) -> i32 {
        match self {
            TemperatureUnit::Celsius => temp_c,
            TemperatureUnit::Fahrenheit => round_half_up(temperature::c2f(f64::from(temp_c))),
        }
    }

    pub fn format_temp(&self, temp_c: i32) -> String {
        format!("{}{}", self.temp(temp_c), self.symbol())
    }
}

pub mod temperature {
    pub fn c2f(temp_c: f64) -> f64 {
        temp_c * 9.0 / 5.0 + 32.0
    }

    #[test]
    fn test_temperature() {
        assert_eq!(c2f(0.0), 32.0);
        assert_eq!(c2f(-40.0), -40.0);
        assert_eq!(c2f(100.0), 212.0);
    }
}
