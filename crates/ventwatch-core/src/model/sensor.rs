// ── Sensor readings ──

use serde::{Deserialize, Serialize};

/// Where a sensor is mounted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Indoor,
    Outdoor,
    Garage,
}

/// Which quantity to pull out of a [`SensorReading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum Metric {
    Temperature,
    Humidity,
    Pressure,
}

/// One zone's values. Each sensor can drop out independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub pressure_hpa: Option<f64>,
}

impl SensorReading {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temperature_c,
            Metric::Humidity => self.humidity_pct,
            Metric::Pressure => self.pressure_hpa,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.temperature_c.is_none() && self.humidity_pct.is_none() && self.pressure_hpa.is_none()
    }
}
