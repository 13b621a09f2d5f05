// ── Incidents ──

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Incident severity, 0 through 3 on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Major,
    Critical,
}

impl Severity {
    /// Map the wire level; anything above 3 is treated as critical and
    /// anything below 0 as informational.
    pub fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Self::Info,
            1 => Self::Warning,
            2 => Self::Major,
            _ => Self::Critical,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Warning => 1,
            Self::Major => 2,
            Self::Critical => 3,
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "info" | "low" => Ok(Self::Info),
            "1" | "warning" | "warn" | "medium" => Ok(Self::Warning),
            "2" | "major" | "high" => Ok(Self::Major),
            "3" | "critical" | "crit" => Ok(Self::Critical),
            other => Err(format!(
                "unknown severity '{other}' (expected 0-3 or info|warning|major|critical)"
            )),
        }
    }
}

/// How an incident's end was reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "at", rename_all = "snake_case")]
pub enum IncidentEnd {
    /// No end time yet.
    #[default]
    Ongoing,
    At(DateTime<Utc>),
    /// An end time was sent but could not be read. The incident is closed.
    Unreadable,
}

impl IncidentEnd {
    pub fn at(self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(at) => Some(at),
            Self::Ongoing | Self::Unreadable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Machine name such as `sensor_failure` or `high_humidity`.
    pub kind: String,
    pub severity: Severity,
    pub started_at: Option<DateTime<Utc>>,
    pub end: IncidentEnd,
    pub description: Option<String>,
}

impl Incident {
    pub fn is_active(&self) -> bool {
        self.end == IncidentEnd::Ongoing
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end.at()
    }

    /// How long the incident lasted, or has lasted so far. Unknown when
    /// the end time was unreadable.
    pub fn duration(&self, now: DateTime<Utc>) -> Option<Duration> {
        let start = self.started_at?;
        let end = match self.end {
            IncidentEnd::Ongoing => now,
            IncidentEnd::At(at) => at,
            IncidentEnd::Unreadable => return None,
        };
        (end >= start).then(|| end - start)
    }

    /// `sensor_failure` -> `Sensor failure`.
    pub fn title(&self) -> String {
        let mut words = self.kind.replace(['_', '-'], " ");
        if let Some(first) = words.get(..1) {
            let upper = first.to_uppercase();
            words.replace_range(..1, &upper);
        }
        words
    }
}

/// Incident log for a trailing window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentLog {
    pub hours: u32,
    pub incidents: Vec<Incident>,
}
