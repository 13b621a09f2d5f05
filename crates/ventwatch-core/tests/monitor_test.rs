// Integration tests for `Monitor` against a wiremock telemetry API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ventwatch_core::{
    AuthCredentials, ConnectionState, CoreError, HistoryRange, Monitor, MonitorConfig, Severity,
    StormRisk, Zone,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer, auth: AuthCredentials) -> MonitorConfig {
    let url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
    let mut config = MonitorConfig::new(url, auth);
    config.refresh_interval_secs = 0;
    config.timeout = Duration::from_secs(5);
    config
}

fn api_key() -> AuthCredentials {
    AuthCredentials::ApiKey(SecretString::from("k-123".to_owned()))
}

fn status_body() -> serde_json::Value {
    json!({
        "deviceId": "esp32-vent-01",
        "timestamp": "2026-10-16T08:30:00Z",
        "sensors": {
            "indoor":  { "temp": 24.0, "humidity": 50.0 },
            "outdoor": { "temp": 18.0, "humidity": 60.0 }
        },
        "system": { "fanOn": true, "uptime": 3600, "wifiRssi": -58 }
    })
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_all(server: &MockServer) {
    mount_json(server, "/api/status", status_body()).await;
    mount_json(
        server,
        "/api/enhanced-dashboard",
        json!({
            "status": status_body(),
            "incidents": [
                { "type": "sensor_failure", "severity": 2, "startTime": 1_790_000_000, "endTime": null }
            ],
            "weather": { "temperature": 17.5, "stormRisk": "high" },
            "forecast": []
        }),
    )
    .await;
    mount_json(
        server,
        "/api/history",
        json!({ "readings": [
            { "timestamp": 1_790_000_000, "indoor": { "temp": 23.0 }, "fanOn": true },
            { "timestamp": 1_790_000_600, "indoor": { "temp": 22.5 }, "fanOn": true }
        ]}),
    )
    .await;
    mount_json(
        server,
        "/api/door-analytics",
        json!({ "events": [
            { "doorId": "front", "doorName": "Front door", "opened": true, "timestamp": 1_790_000_100 }
        ]}),
    )
    .await;
    mount_json(
        server,
        "/api/incidents",
        json!({ "incidents": [
            { "type": "high_temp", "severity": 1, "startTime": 1_790_000_000, "endTime": 1_790_000_900 }
        ]}),
    )
    .await;
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_publishes_every_resource() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    let monitor = Monitor::new(config(&server, api_key())).unwrap();
    let report = monitor.refresh().await.unwrap();
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failed);

    let store = monitor.store();
    let status = store.status().unwrap();
    assert!(!status.stale);
    assert_eq!(status.data.reading(Zone::Indoor).temperature_c, Some(24.0));

    let dashboard = store.dashboard().unwrap();
    let weather = dashboard.data.weather.as_ref().unwrap();
    assert_eq!(weather.storm_risk, StormRisk::High);
    assert_eq!(dashboard.data.incidents[0].severity, Severity::Major);

    assert_eq!(store.history().unwrap().data.points.len(), 2);
    assert_eq!(store.doors().unwrap().data.events[0].door_name, "Front door");
    assert_eq!(store.incidents().unwrap().data.incidents.len(), 1);
    assert!(store.last_refresh().is_some());
    assert_eq!(*monitor.connection_state().borrow(), ConnectionState::Connected);
}

#[tokio::test]
async fn fresh_cache_skips_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = Monitor::new(config(&server, api_key())).unwrap();
    monitor.status().await.unwrap();
    monitor.status().await.unwrap();
}

#[tokio::test]
async fn missing_endpoints_degrade_without_failing() {
    let server = MockServer::start().await;
    mount_json(&server, "/api/status", status_body()).await;

    let monitor = Monitor::new(config(&server, api_key())).unwrap();
    let mut notices = monitor.notices();
    let report = monitor.refresh().await.unwrap();

    assert_eq!(report.fresh, vec!["status"]);
    assert_eq!(report.failed.len(), 4);
    assert_eq!(
        *monitor.connection_state().borrow(),
        ConnectionState::Degraded { failing: 4 }
    );
    assert!(monitor.store().status().is_some());
    assert!(monitor.store().dashboard().is_none());

    let notice = notices.try_recv().unwrap();
    assert!(notice.message.contains("Could not load"));

    // Same failures on the next cycle do not repeat the banners.
    let mut notices = monitor.notices();
    monitor.refresh().await.unwrap();
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn failed_fetch_serves_stale_value() {
    let server = MockServer::start().await;
    mount_json(&server, "/api/status", status_body()).await;

    let mut cfg = config(&server, api_key());
    cfg.cache_ttl = Duration::ZERO;
    let monitor = Monitor::new(cfg).unwrap();

    let first = monitor.status().await.unwrap();
    assert!(!first.stale);

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let second = monitor.status().await.unwrap();
    assert!(second.stale);
    assert_eq!(second.data.device_id.as_deref(), Some("esp32-vent-01"));
    assert!(monitor.store().status().unwrap().stale);
}

#[tokio::test]
async fn select_history_range_fetches_that_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .and(query_param("hours", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "readings": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = Monitor::new(config(&server, api_key())).unwrap();
    let snap = monitor
        .select_history_range(HistoryRange::OneHour)
        .await
        .unwrap();

    assert_eq!(snap.data.range, HistoryRange::OneHour);
    assert_eq!(monitor.history_range(), HistoryRange::OneHour);
    assert_eq!(
        monitor.store().history().unwrap().data.range,
        HistoryRange::OneHour
    );
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_unauthorized_revokes_api_key_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let mut cfg = config(&server, api_key());
    cfg.cache_ttl = Duration::ZERO;
    let monitor = Monitor::new(cfg).unwrap();
    let mut notices = monitor.notices();

    let first = monitor.status().await.unwrap_err();
    assert!(matches!(first, CoreError::AuthenticationFailed { .. }));
    assert!(!monitor.session().is_revoked());

    let second = monitor.status().await.unwrap_err();
    assert!(matches!(second, CoreError::SessionRevoked { attempts: 2 }));
    assert_eq!(
        *monitor.connection_state().borrow(),
        ConnectionState::AuthRevoked
    );
    assert!(notices.try_recv().unwrap().message.contains("rejected"));

    // Revoked sessions stop talking to the API (mock expects exactly 2).
    let third = monitor.status().await.unwrap_err();
    assert!(third.is_auth());
    assert!(monitor.refresh().await.is_err());
}

async fn mount_unauthorized(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(times)
        .with_priority(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn one_rejected_refresh_cycle_does_not_revoke() {
    let server = MockServer::start().await;
    mount_unauthorized(&server, 5).await;
    mount_all(&server).await;

    let mut cfg = config(&server, api_key());
    cfg.cache_ttl = Duration::ZERO;
    let monitor = Monitor::new(cfg).unwrap();

    let report = monitor.refresh().await.unwrap();
    assert_eq!(report.failed.len(), 5);
    assert!(!monitor.session().is_revoked());
    assert_eq!(monitor.session().consecutive_rejections(), 1);

    let report = monitor.refresh().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(monitor.session().consecutive_rejections(), 0);
}

#[tokio::test]
async fn second_rejected_refresh_cycle_revokes() {
    let server = MockServer::start().await;
    mount_unauthorized(&server, 10).await;
    mount_all(&server).await;

    let mut cfg = config(&server, api_key());
    cfg.cache_ttl = Duration::ZERO;
    let monitor = Monitor::new(cfg).unwrap();

    monitor.refresh().await.unwrap();
    assert!(!monitor.session().is_revoked());

    let err = monitor.refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::SessionRevoked { attempts: 2 }));
    assert!(monitor.session().is_revoked());
    assert_eq!(
        *monitor.connection_state().borrow(),
        ConnectionState::AuthRevoked
    );
}

#[tokio::test]
async fn start_reports_revocation_and_never_polls() {
    let server = MockServer::start().await;
    mount_unauthorized(&server, u64::MAX).await;

    let mut cfg = config(&server, api_key());
    cfg.refresh_interval_secs = 1;
    cfg.unauthorized_threshold = 1;
    let monitor = Monitor::new(cfg).unwrap();

    let err = monitor.start().await.unwrap_err();
    assert!(matches!(err, CoreError::SessionRevoked { attempts: 1 }));
    assert_eq!(
        *monitor.connection_state().borrow(),
        ConnectionState::AuthRevoked
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
    monitor.stop().await;
}

#[tokio::test]
async fn poll_task_stops_once_session_is_revoked() {
    let server = MockServer::start().await;
    mount_unauthorized(&server, u64::MAX).await;

    let mut cfg = config(&server, api_key());
    cfg.refresh_interval_secs = 1;
    cfg.cache_ttl = Duration::ZERO;
    let monitor = Monitor::new(cfg).unwrap();

    // First cycle is rejected but tolerated; the poll task runs the second.
    let report = monitor.start().await.unwrap();
    assert_eq!(report.failed.len(), 5);
    assert!(!monitor.session().is_revoked());

    let mut state = monitor.connection_state();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == ConnectionState::AuthRevoked),
    )
    .await
    .unwrap()
    .unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 10);
    monitor.stop().await;
    assert_eq!(
        *monitor.connection_state().borrow(),
        ConnectionState::AuthRevoked
    );
}

#[tokio::test]
async fn bearer_session_survives_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cfg = config(
        &server,
        AuthCredentials::Bearer(SecretString::from("tok".to_owned())),
    );
    cfg.cache_ttl = Duration::ZERO;
    let monitor = Monitor::new(cfg).unwrap();

    for _ in 0..3 {
        let err = monitor.status().await.unwrap_err();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
    assert!(!monitor.session().is_revoked());
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn oneshot_runs_closure_and_stops() {
    let server = MockServer::start().await;
    mount_json(&server, "/api/status", status_body()).await;

    let device = Monitor::oneshot(config(&server, api_key()), |monitor| async move {
        let snap = monitor.status().await?;
        Ok::<_, CoreError>(snap.data.device_id.clone())
    })
    .await
    .unwrap();

    assert_eq!(device.as_deref(), Some("esp32-vent-01"));
}

#[tokio::test]
async fn start_then_stop_disconnects() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    let mut cfg = config(&server, api_key());
    cfg.refresh_interval_secs = 60;
    let monitor = Monitor::new(cfg).unwrap();

    let report = monitor.start().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(*monitor.connection_state().borrow(), ConnectionState::Connected);

    monitor.stop().await;
    assert_eq!(
        *monitor.connection_state().borrow(),
        ConnectionState::Disconnected
    );
}
