// ── Domain model ──
//
// Canonical, display-ready versions of the API payloads. Conversion
// from wire types (null checks, timestamp sanity, enum parsing) lives
// in `crate::convert`.

pub mod door;
pub mod history;
pub mod incident;
pub mod sensor;
pub mod system;
pub mod weather;

use serde::{Deserialize, Serialize};

pub use door::{DetectionMethod, DoorActivity, DoorEvent, DoorSummary};
pub use history::{HistoryPoint, HistoryRange, HistorySeries};
pub use incident::{Incident, IncidentEnd, IncidentLog, Severity};
pub use sensor::{Metric, SensorReading, Zone};
pub use system::{BootReason, DeviceStatus, SystemHealth, WifiSignal};
pub use weather::{ForecastPoint, StormRisk, WeatherSnapshot};

/// Everything `enhanced-dashboard` returns in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub status: Option<DeviceStatus>,
    pub incidents: Vec<Incident>,
    pub weather: Option<WeatherSnapshot>,
    pub forecast: Vec<ForecastPoint>,
}
