//! Reactive data layer between `ventwatch-api` and UI consumers (CLI / TUI).
//!
//! - **[`Monitor`]**: Central facade. [`start()`](Monitor::start) performs an
//!   initial refresh then polls every `refresh_interval_secs` (30 s by
//!   default). [`Monitor::oneshot()`](Monitor::oneshot) runs a single
//!   closure for CLI invocations without spawning the poll task.
//!
//! - **[`TtlCache`]**: Per-resource stale-while-revalidate cache. Fresh
//!   hits skip the network; failed fetches fall back to the last good
//!   value when one exists. Requests are not de-duplicated.
//!
//! - **[`DataStore`]** / **[`SnapshotStream`]**: `watch`-backed latest
//!   snapshots per resource, consumed by the TUI for reactive rendering.
//!
//! - **[`Session`]**: Counts consecutive 401s and revokes API-key
//!   sessions so front ends can forget the stored key.
//!
//! - **Domain model** ([`model`]) plus display helpers: timestamp
//!   parsing ([`convert::parse_timestamp`]), unit conversion ([`units`]),
//!   and the ventilation/door heuristics in [`analysis`].

pub mod analysis;
pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod monitor;
pub mod session;
pub mod store;
pub mod stream;
pub mod units;

// ── Primary re-exports ──────────────────────────────────────────────
pub use analysis::{
    Rating, VentilationAssessment, Verdict, active_incidents, assess_ventilation,
    chart_series, filter_by_min_severity, summarize_doors,
};
pub use cache::{CacheRead, CacheUpdate, Freshness, TtlCache};
pub use config::{AuthCredentials, MonitorConfig, TlsVerification};
pub use convert::parse_timestamp;
pub use error::CoreError;
pub use monitor::{ConnectionState, Monitor, Notice, NoticeLevel, RefreshReport};
pub use session::{AuthVerdict, Session};
pub use store::{DataStore, Snapshot};
pub use stream::SnapshotStream;
pub use units::{TemperatureUnit, celsius_to_fahrenheit, fahrenheit_to_celsius};

pub use model::{
    BootReason, Dashboard, DetectionMethod, DeviceStatus, DoorActivity, DoorEvent, DoorSummary,
    ForecastPoint, HistoryPoint, HistoryRange, HistorySeries, Incident, IncidentEnd, IncidentLog,
    Metric, SensorReading, Severity, StormRisk, SystemHealth, WeatherSnapshot, WifiSignal, Zone,
};
