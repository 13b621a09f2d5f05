// ── API-to-domain type conversions ──
//
// Bridges raw `ventwatch_api::types` payloads into `ventwatch_core::model`
// types. Each conversion applies the light defensive checks the display
// needs: null handling, timestamp sanity, enum parsing, clamping.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde_json::Value;

use ventwatch_api::types::{
    DashboardResponse, DoorAnalyticsResponse, DoorEventResponse, ForecastEntry, HistoryReading,
    HistoryResponse, IncidentResponse, IncidentsResponse, SensorValues, StatusResponse,
    SystemInfo, WeatherResponse,
};

use crate::model::{
    BootReason, Dashboard, DetectionMethod, DeviceStatus, DoorActivity, DoorEvent, ForecastPoint,
    HistoryPoint, HistoryRange, HistorySeries, Incident, IncidentEnd, IncidentLog, SensorReading,
    Severity, StormRisk, SystemHealth, WeatherSnapshot, Zone,
};

// ── Timestamps ─────────────────────────────────────────────────────

/// Earliest year a device timestamp can plausibly carry.
pub const MIN_PLAUSIBLE_YEAR: i32 = 2020;
/// Latest year a device timestamp can plausibly carry.
pub const MAX_PLAUSIBLE_YEAR: i32 = 2030;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp from the API.
///
/// Accepts ISO-8601 strings (RFC 3339, or naive date-times taken as UTC),
/// Unix seconds as an integer or float, and Unix seconds inside a string.
/// Anything whose year falls outside 2020..=2030 is rejected; an ESP32
/// without NTP sync reports 1970, and millisecond values land in the far
/// future.
pub fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let parsed = match raw {
        Value::Number(n) => match n.as_i64() {
            Some(secs) => DateTime::from_timestamp(secs, 0),
            None => n.as_f64().and_then(from_float_secs),
        },
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }?;
    is_plausible(&parsed).then_some(parsed)
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    if let Ok(secs) = s.parse::<f64>() {
        return from_float_secs(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn from_float_secs(secs: f64) -> Option<DateTime<Utc>> {
    // Anything beyond ±1e11 is out of range for the plausibility window anyway.
    if !secs.is_finite() || secs.abs() > 1e11 {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn is_plausible(dt: &DateTime<Utc>) -> bool {
    (MIN_PLAUSIBLE_YEAR..=MAX_PLAUSIBLE_YEAR).contains(&dt.year())
}

fn parse_opt_timestamp(raw: Option<&Value>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_timestamp)
}

// ── Helpers ────────────────────────────────────────────────────────

/// Drop NaN/inf readings a flaky sensor can produce.
fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

// ── Status ─────────────────────────────────────────────────────────

impl From<SensorValues> for SensorReading {
    fn from(v: SensorValues) -> Self {
        Self {
            temperature_c: finite(v.temp),
            humidity_pct: finite(v.humidity).map(|h| h.clamp(0.0, 100.0)),
            pressure_hpa: finite(v.pressure),
        }
    }
}

fn reading(values: Option<SensorValues>) -> SensorReading {
    values.map(SensorReading::from).unwrap_or_default()
}

impl From<SystemInfo> for SystemHealth {
    fn from(s: SystemInfo) -> Self {
        Self {
            fan_on: s.fan_on,
            uptime: s.uptime.map(Duration::from_secs),
            free_heap_bytes: s.free_heap,
            boot_reason: non_empty(s.boot_reason).map(|r| BootReason::parse(&r)),
            wifi_rssi_dbm: s.wifi_rssi,
        }
    }
}

impl From<StatusResponse> for DeviceStatus {
    fn from(s: StatusResponse) -> Self {
        let mut readings = BTreeMap::new();
        for (zone, values) in [
            (Zone::Indoor, s.sensors.indoor),
            (Zone::Outdoor, s.sensors.outdoor),
            (Zone::Garage, s.sensors.garage),
        ] {
            if let Some(values) = values {
                let r = SensorReading::from(values);
                if !r.is_empty() {
                    readings.insert(zone, r);
                }
            }
        }

        Self {
            device_id: non_empty(s.device_id),
            reported_at: parse_opt_timestamp(s.timestamp.as_ref()),
            readings,
            system: s.system.into(),
        }
    }
}

// ── Incidents ──────────────────────────────────────────────────────

impl From<IncidentResponse> for Incident {
    fn from(i: IncidentResponse) -> Self {
        Self {
            kind: i.kind,
            severity: i
                .severity
                .as_ref()
                .and_then(severity_level)
                .map(Severity::from_level)
                .unwrap_or_default(),
            started_at: parse_opt_timestamp(i.start_time.as_ref()),
            end: incident_end(i.end_time.as_ref()),
            description: non_empty(i.description),
        }
    }
}

/// Firmware sends the level as an integer, a float or a numeric string.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn severity_level(raw: &Value) -> Option<i64> {
    let level = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    // Saturating cast; from_level clamps the rest.
    level.is_finite().then(|| level.round() as i64)
}

/// Only a missing or null end time means the incident is still open.
fn incident_end(raw: Option<&Value>) -> IncidentEnd {
    match raw {
        None | Some(Value::Null) => IncidentEnd::Ongoing,
        Some(v) => parse_timestamp(v).map_or(IncidentEnd::Unreadable, IncidentEnd::At),
    }
}

pub fn incident_log(hours: u32, resp: IncidentsResponse) -> IncidentLog {
    IncidentLog {
        hours,
        incidents: resp.incidents.into_iter().map(Incident::from).collect(),
    }
}

// ── Weather / dashboard ────────────────────────────────────────────

impl From<WeatherResponse> for WeatherSnapshot {
    fn from(w: WeatherResponse) -> Self {
        Self {
            temperature_c: finite(w.temperature),
            humidity_pct: finite(w.humidity),
            precipitation_probability_pct: finite(w.precipitation_probability)
                .map(|p| p.clamp(0.0, 100.0)),
            storm_risk: w
                .storm_risk
                .as_deref()
                .map(StormRisk::parse)
                .unwrap_or_default(),
            description: non_empty(w.description),
        }
    }
}

fn forecast_point(f: ForecastEntry) -> Option<ForecastPoint> {
    Some(ForecastPoint {
        time: parse_opt_timestamp(f.time.as_ref())?,
        temperature_c: finite(f.temperature),
        humidity_pct: finite(f.humidity),
        precipitation_probability_pct: finite(f.precipitation_probability),
    })
}

impl From<DashboardResponse> for Dashboard {
    fn from(d: DashboardResponse) -> Self {
        let mut forecast: Vec<ForecastPoint> =
            d.forecast.into_iter().filter_map(forecast_point).collect();
        forecast.sort_by_key(|p| p.time);

        Self {
            status: d.status.map(DeviceStatus::from),
            incidents: d.incidents.into_iter().map(Incident::from).collect(),
            weather: d.weather.map(WeatherSnapshot::from),
            forecast,
        }
    }
}

// ── History ────────────────────────────────────────────────────────

fn history_point(r: HistoryReading) -> Option<HistoryPoint> {
    Some(HistoryPoint {
        timestamp: parse_opt_timestamp(r.timestamp.as_ref())?,
        indoor: reading(r.indoor),
        outdoor: reading(r.outdoor),
        garage: reading(r.garage),
        fan_on: r.fan_on,
    })
}

pub fn history_series(range: HistoryRange, resp: HistoryResponse) -> HistorySeries {
    let total = resp.readings.len();
    let mut points: Vec<HistoryPoint> =
        resp.readings.into_iter().filter_map(history_point).collect();
    points.sort_by_key(|p| p.timestamp);

    HistorySeries {
        range,
        rejected: total - points.len(),
        points,
    }
}

// ── Doors ──────────────────────────────────────────────────────────

impl From<DoorEventResponse> for DoorEvent {
    fn from(e: DoorEventResponse) -> Self {
        let door_name = non_empty(e.door_name).unwrap_or_else(|| e.door_id.clone());
        Self {
            door_id: e.door_id,
            door_name,
            opened: e.opened,
            timestamp: parse_opt_timestamp(e.timestamp.as_ref()),
            detection_method: non_empty(e.detection_method).map(|m| DetectionMethod::parse(&m)),
            confidence: finite(e.confidence).map(|c| c.clamp(0.0, 1.0)),
        }
    }
}

/// Events newest first; undated events sink to the end.
pub fn door_activity(days: u32, resp: DoorAnalyticsResponse) -> DoorActivity {
    let mut events: Vec<DoorEvent> = resp.events.into_iter().map(DoorEvent::from).collect();
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    DoorActivity { days, events }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    // ── parse_timestamp ─────────────────────────────────────────────

    #[test]
    fn parses_rfc3339() {
        let dt = parse_timestamp(&json!("2026-10-16T08:30:00Z")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap());

        let offset = parse_timestamp(&json!("2026-10-16T10:30:00+02:00")).unwrap();
        assert_eq!(offset, dt);
    }

    #[test]
    fn parses_naive_iso_as_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 5).unwrap();
        assert_eq!(parse_timestamp(&json!("2025-03-01 12:00:05")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2025-03-01T12:00:05")), Some(expected));
    }

    #[test]
    fn parses_unix_seconds() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
        let secs = expected.timestamp();
        assert_eq!(parse_timestamp(&json!(secs)), Some(expected));
        assert_eq!(parse_timestamp(&json!(secs.to_string())), Some(expected));

        let frac = parse_timestamp(&json!(1_792_137_600.5)).unwrap();
        assert_eq!(frac.timestamp(), 1_792_137_600);
        assert_eq!(frac.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn rejects_dates_outside_window() {
        // Unsynced device clock.
        assert_eq!(parse_timestamp(&json!(0)), None);
        assert_eq!(parse_timestamp(&json!("2019-12-31T23:59:59Z")), None);
        assert_eq!(parse_timestamp(&json!("2031-01-01T00:00:00Z")), None);
        // Milliseconds instead of seconds.
        assert_eq!(parse_timestamp(&json!(1_792_137_600_000_i64)), None);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert!(parse_timestamp(&json!("2020-01-01T00:00:00Z")).is_some());
        assert!(parse_timestamp(&json!("2030-12-31T23:59:59Z")).is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(&json!(null)), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
        assert_eq!(parse_timestamp(&json!("")), None);
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!({ "t": 1 })), None);
    }

    // ── conversions ─────────────────────────────────────────────────

    #[test]
    fn status_skips_empty_zones_and_bad_values() {
        let resp: StatusResponse = serde_json::from_value(json!({
            "deviceId": "esp32-vent-01",
            "timestamp": 0,
            "sensors": {
                "indoor": { "temp": 21.4, "humidity": 104.0 },
                "garage": { "temp": null, "humidity": null, "pressure": null }
            },
            "system": { "fanOn": true, "uptime": 3600, "bootReason": "  " }
        }))
        .unwrap();

        let status = DeviceStatus::from(resp);
        assert_eq!(status.reported_at, None);
        assert_eq!(status.reading(Zone::Indoor).humidity_pct, Some(100.0));
        assert!(!status.readings.contains_key(&Zone::Garage));
        assert_eq!(status.system.uptime, Some(Duration::from_secs(3600)));
        assert_eq!(status.system.boot_reason, None);
    }

    #[test]
    fn history_drops_implausible_samples_and_sorts() {
        let resp: HistoryResponse = serde_json::from_value(json!({
            "readings": [
                { "timestamp": 1_792_141_200, "indoor": { "temp": 22.0 } },
                { "timestamp": 1000, "indoor": { "temp": 99.0 } },
                { "timestamp": 1_792_137_600, "indoor": { "temp": 21.0 } },
                { "indoor": { "temp": 20.0 } }
            ]
        }))
        .unwrap();

        let series = history_series(HistoryRange::Day, resp);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.rejected, 2);
        assert_eq!(series.points[0].indoor.temperature_c, Some(21.0));
        assert_eq!(series.points[1].indoor.temperature_c, Some(22.0));
    }

    #[test]
    fn door_event_defaults_name_and_clamps_confidence() {
        let resp: DoorAnalyticsResponse = serde_json::from_value(json!({
            "events": [
                { "doorId": "patio", "opened": false, "timestamp": 1_792_137_600,
                  "detectionMethod": "reed_switch", "confidence": 1.4 },
                { "doorId": "front", "doorName": "Front door", "opened": true,
                  "timestamp": 1_792_141_200 }
            ]
        }))
        .unwrap();

        let activity = door_activity(7, resp);
        assert_eq!(activity.events[0].door_id, "front");
        let patio = &activity.events[1];
        assert_eq!(patio.door_name, "patio");
        assert_eq!(patio.confidence, Some(1.0));
        assert_eq!(patio.detection_method, Some(DetectionMethod::ReedSwitch));
    }

    #[test]
    fn dashboard_parses_weather_and_forecast() {
        let resp: DashboardResponse = serde_json::from_value(json!({
            "incidents": [{ "type": "fan_stall", "severity": 7, "startTime": 1_792_137_600 }],
            "weather": { "temperature": 15.2, "stormRisk": "HIGH", "precipitationProbability": 140 },
            "forecast": [
                { "time": 1_792_141_200, "temperature": 13.0 },
                { "time": 1_792_137_600, "temperature": 14.0 },
                { "time": "not a time", "temperature": 99.0 }
            ]
        }))
        .unwrap();

        let dash = Dashboard::from(resp);
        assert_eq!(dash.incidents[0].severity, Severity::Critical);
        assert!(dash.incidents[0].is_active());
        let weather = dash.weather.unwrap();
        assert_eq!(weather.storm_risk, StormRisk::High);
        assert_eq!(weather.precipitation_probability_pct, Some(100.0));
        assert_eq!(dash.forecast.len(), 2);
        assert_eq!(dash.forecast[0].temperature_c, Some(14.0));
    }

    #[test]
    fn incident_with_unreadable_end_is_closed() {
        let resp: IncidentsResponse = serde_json::from_value(json!({ "incidents": [
            { "type": "fan_stall", "startTime": 1_792_137_600, "endTime": 0 },
            { "type": "fan_stall", "startTime": 1_792_137_600, "endTime": 1_792_137_600_000_i64 },
            { "type": "fan_stall", "startTime": 1_792_137_600, "endTime": "soon" },
            { "type": "fan_stall", "startTime": 1_792_137_600, "endTime": null },
            { "type": "fan_stall", "startTime": 1_792_137_600 },
            { "type": "fan_stall", "startTime": 1_792_137_600, "endTime": 1_792_141_200 }
        ]}))
        .unwrap();

        let log = incident_log(24, resp);
        let ends: Vec<_> = log.incidents.iter().map(|i| i.end).collect();
        assert_eq!(
            ends,
            vec![
                IncidentEnd::Unreadable,
                IncidentEnd::Unreadable,
                IncidentEnd::Unreadable,
                IncidentEnd::Ongoing,
                IncidentEnd::Ongoing,
                IncidentEnd::At(Utc.timestamp_opt(1_792_141_200, 0).unwrap()),
            ]
        );
        assert!(!log.incidents[0].is_active());
        assert!(log.incidents[3].is_active());
    }

    #[test]
    fn severity_accepts_floats_and_numeric_strings() {
        let resp: IncidentsResponse = serde_json::from_value(json!({ "incidents": [
            { "type": "a", "severity": 2.0 },
            { "type": "b", "severity": " 2 " },
            { "type": "c", "severity": "3.0" },
            { "type": "d", "severity": -4 },
            { "type": "e", "severity": 12.5 },
            { "type": "f", "severity": "high" }
        ]}))
        .unwrap();

        let levels: Vec<_> = incident_log(24, resp)
            .incidents
            .iter()
            .map(|i| i.severity)
            .collect();
        assert_eq!(
            levels,
            vec![
                Severity::Major,
                Severity::Major,
                Severity::Critical,
                Severity::Info,
                Severity::Critical,
                Severity::Info,
            ]
        );
    }
}
