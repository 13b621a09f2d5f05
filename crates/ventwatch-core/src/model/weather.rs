// ── Weather and forecast ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-computed storm alert level. Display only.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StormRisk {
    #[default]
    Unknown,
    None,
    Low,
    Moderate,
    High,
    Severe,
}

impl StormRisk {
    /// Unrecognised values map to `Unknown` rather than failing the
    /// whole dashboard.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" | "no" | "clear" => Self::None,
            "low" => Self::Low,
            "moderate" | "medium" => Self::Moderate,
            "high" => Self::High,
            "severe" | "extreme" => Self::Severe,
            _ => Self::Unknown,
        }
    }

    pub fn is_alert(self) -> bool {
        self >= Self::High
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub precipitation_probability_pct: Option<f64>,
    pub storm_risk: StormRisk,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub precipitation_probability_pct: Option<f64>,
}
