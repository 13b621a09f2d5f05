// ── Sensor history ──

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sensor::{SensorReading, Zone};

/// Chart window offered by the history view.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum HistoryRange {
    #[serde(rename = "1h")]
    #[strum(serialize = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    #[strum(serialize = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    #[strum(serialize = "24h")]
    Day,
    #[serde(rename = "7d")]
    #[strum(serialize = "7d")]
    Week,
}

impl HistoryRange {
    /// Value for the `hours` query parameter.
    pub fn hours(self) -> u32 {
        match self {
            Self::OneHour => 1,
            Self::SixHours => 6,
            Self::Day => 24,
            Self::Week => 168,
        }
    }

    pub fn cache_key(self) -> String {
        format!("history:{self}")
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OneHour => "Last hour",
            Self::SixHours => "Last 6 hours",
            Self::Day => "Last 24 hours",
            Self::Week => "Last 7 days",
        }
    }
}

impl FromStr for HistoryRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" | "1" => Ok(Self::OneHour),
            "6h" | "6" => Ok(Self::SixHours),
            "24h" | "24" | "1d" => Ok(Self::Day),
            "7d" | "168h" | "168" | "1w" => Ok(Self::Week),
            other => Err(format!("unknown range '{other}' (expected 1h, 6h, 24h or 7d)")),
        }
    }
}

/// One historical sample. Only samples with a plausible timestamp are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub indoor: SensorReading,
    pub outdoor: SensorReading,
    pub garage: SensorReading,
    pub fan_on: Option<bool>,
}

impl HistoryPoint {
    pub fn reading(&self, zone: Zone) -> &SensorReading {
        match zone {
            Zone::Indoor => &self.indoor,
            Zone::Outdoor => &self.outdoor,
            Zone::Garage => &self.garage,
        }
    }
}

/// History for one range, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySeries {
    pub range: HistoryRange,
    pub points: Vec<HistoryPoint>,
    /// Samples dropped for missing or out-of-range timestamps.
    pub rejected: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn range_maps_to_hours_and_key() {
        assert_eq!(HistoryRange::Week.hours(), 168);
        assert_eq!(HistoryRange::Day.cache_key(), "history:24h");
        assert_eq!(HistoryRange::OneHour.to_string(), "1h");
        assert_eq!("7D".parse::<HistoryRange>().unwrap(), HistoryRange::Week);
        assert!("2h".parse::<HistoryRange>().is_err());
    }
}
