//! Response types for the ventwatch telemetry endpoints.
//!
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.
//! The device firmware and the function app both omit fields freely, so
//! nearly everything is optional. Timestamps stay as raw JSON values
//! because they arrive as ISO strings or Unix seconds depending on the
//! endpoint; `ventwatch-core` does the parsing and range checks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Status ───────────────────────────────────────────────────────────

/// One zone's sensor values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorValues {
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

/// Readings keyed by zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneReadings {
    pub indoor: Option<SensorValues>,
    pub outdoor: Option<SensorValues>,
    pub garage: Option<SensorValues>,
}

/// Controller health block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub fan_on: Option<bool>,
    /// Seconds since boot.
    pub uptime: Option<u64>,
    /// Free heap in bytes.
    pub free_heap: Option<u64>,
    pub boot_reason: Option<String>,
    /// Wi-Fi RSSI in dBm.
    pub wifi_rssi: Option<i32>,
}

/// Current device status -- from `GET status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub device_id: Option<String>,
    /// ISO 8601 string or Unix seconds.
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub sensors: ZoneReadings,
    #[serde(default)]
    pub system: SystemInfo,
}

// ── Incidents ────────────────────────────────────────────────────────

/// A recorded fault -- embedded in the dashboard and from `GET incidents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentResponse {
    #[serde(rename = "type")]
    pub kind: String,
    /// 0 (info) through 3 (critical), as a number or a numeric string.
    pub severity: Option<Value>,
    /// Unix seconds.
    pub start_time: Option<Value>,
    /// Unix seconds, or null while the incident is ongoing.
    pub end_time: Option<Value>,
    pub description: Option<String>,
}

/// Wrapper for `GET incidents`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentsResponse {
    #[serde(default)]
    pub incidents: Vec<IncidentResponse>,
}

// ── Weather ──────────────────────────────────────────────────────────

/// Current conditions at the site, computed server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResponse {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation_probability: Option<f64>,
    /// One of: `none`, `low`, `moderate`, `high`, `severe`.
    pub storm_risk: Option<String>,
    pub description: Option<String>,
}

/// One hourly forecast slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    pub time: Option<Value>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation_probability: Option<f64>,
}

// ── Dashboard ────────────────────────────────────────────────────────

/// Aggregate view -- from `GET enhanced-dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub status: Option<StatusResponse>,
    #[serde(default)]
    pub incidents: Vec<IncidentResponse>,
    pub weather: Option<WeatherResponse>,
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
}

// ── History ──────────────────────────────────────────────────────────

/// One historical sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReading {
    pub timestamp: Option<Value>,
    pub indoor: Option<SensorValues>,
    pub outdoor: Option<SensorValues>,
    pub garage: Option<SensorValues>,
    pub fan_on: Option<bool>,
}

/// Wrapper for `GET history?hours=N`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub readings: Vec<HistoryReading>,
}

// ── Doors ────────────────────────────────────────────────────────────

/// A detected door open/close -- from `GET door-analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorEventResponse {
    pub door_id: String,
    pub door_name: Option<String>,
    pub opened: bool,
    pub timestamp: Option<Value>,
    /// e.g. `pressure_delta`, `reed_switch`, `manual`.
    pub detection_method: Option<String>,
    /// 0.0 to 1.0.
    pub confidence: Option<f64>,
}

/// Wrapper for `GET door-analytics?days=N`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoorAnalyticsResponse {
    #[serde(default)]
    pub events: Vec<DoorEventResponse>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_tolerates_missing_blocks() {
        let status: StatusResponse =
            serde_json::from_value(json!({ "deviceId": "esp32-vent-01" })).unwrap();
        assert_eq!(status.device_id.as_deref(), Some("esp32-vent-01"));
        assert!(status.sensors.indoor.is_none());
        assert!(status.system.fan_on.is_none());
    }

    #[test]
    fn incident_type_field_maps_to_kind() {
        let incident: IncidentResponse = serde_json::from_value(json!({
            "type": "sensor_failure",
            "severity": 2,
            "startTime": 1_760_000_000,
            "endTime": null
        }))
        .unwrap();
        assert_eq!(incident.kind, "sensor_failure");
        assert_eq!(incident.severity, Some(json!(2)));
        assert!(incident.end_time.is_none());
    }

    #[test]
    fn incident_accepts_float_and_string_severity() {
        for severity in [json!(2.0), json!("2")] {
            let incident: IncidentResponse = serde_json::from_value(json!({
                "type": "fan_stall",
                "severity": severity.clone(),
            }))
            .unwrap();
            assert_eq!(incident.severity, Some(severity));
        }
    }
}
