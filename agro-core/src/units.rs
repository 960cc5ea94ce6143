use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Display unit for temperatures. All models store Celsius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Kelvin => "kelvin",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit, TemperatureUnit::Kelvin]
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            "kelvin" | "k" => Ok(TemperatureUnit::Kelvin),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit, kelvin."
            )),
        }
    }
}

/// Converts a Celsius value into `unit`, rounded to a whole degree.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    let converted = match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        TemperatureUnit::Kelvin => celsius + 273.15,
    };
    converted.round()
}

/// Temperature presentation, passed explicitly to whatever renders values.
pub trait TemperatureFormat {
    fn format_temperature(&self, celsius: f64) -> f64;

    fn display_temperature(&self, celsius: f64) -> String;
}

impl TemperatureFormat for TemperatureUnit {
    fn format_temperature(&self, celsius: f64) -> f64 {
        format_temperature(celsius, *self)
    }

    fn display_temperature(&self, celsius: f64) -> String {
        format!("{}{}", self.format_temperature(celsius), self.symbol())
    }
}
