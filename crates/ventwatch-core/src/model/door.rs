// ── Door activity ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the backend decided a door moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// Inferred from a sudden indoor pressure change.
    PressureDelta,
    ReedSwitch,
    Manual,
    Other(String),
}

impl DetectionMethod {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pressure_delta" | "pressure" => Self::PressureDelta,
            "reed_switch" | "reed" | "contact" => Self::ReedSwitch,
            "manual" => Self::Manual,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PressureDelta => f.write_str("pressure"),
            Self::ReedSwitch => f.write_str("reed switch"),
            Self::Manual => f.write_str("manual"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorEvent {
    pub door_id: String,
    /// Falls back to the door id when the API sends no name.
    pub door_name: String,
    pub opened: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub detection_method: Option<DetectionMethod>,
    /// 0.0 to 1.0, clamped.
    pub confidence: Option<f64>,
}

/// Door events for a trailing window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoorActivity {
    pub days: u32,
    pub events: Vec<DoorEvent>,
}

/// Per-door roll-up of a [`DoorActivity`] window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorSummary {
    pub door_id: String,
    pub door_name: String,
    pub opens: u32,
    pub closes: u32,
    pub last_event_at: Option<DateTime<Utc>>,
    /// State after the most recent timestamped event.
    pub last_opened: Option<bool>,
    pub mean_confidence: Option<f64>,
}
