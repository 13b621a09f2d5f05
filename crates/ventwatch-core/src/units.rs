// ── Temperature units ──

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Display unit for temperatures. The API always reports Celsius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "c", alias = "celsius")]
    Celsius,
    #[serde(rename = "f", alias = "fahrenheit")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Convert a Celsius reading into this unit.
    pub fn from_celsius(self, c: f64) -> f64 {
        match self {
            Self::Celsius => c,
            Self::Fahrenheit => celsius_to_fahrenheit(c),
        }
    }

    /// Convert a temperature *difference* in Celsius into this unit.
    pub fn delta_from_celsius(self, delta_c: f64) -> f64 {
        match self {
            Self::Celsius => delta_c,
            Self::Fahrenheit => delta_c * 9.0 / 5.0,
        }
    }

    /// One decimal plus the unit suffix, or `--` when missing.
    pub fn format(self, celsius: Option<f64>) -> String {
        match celsius {
            Some(c) if c.is_finite() => format!("{:.1}{}", self.from_celsius(c), self.symbol()),
            _ => "--".into(),
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" | "°c" => Ok(Self::Celsius),
            "f" | "fahrenheit" | "°f" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit '{other}' (expected c or f)")),
        }
    }
}
