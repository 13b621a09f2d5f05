// Integration tests for `ApiClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ventwatch_api::{ApiClient, Credentials, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(credentials: &Credentials) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base = format!("{}/api", server.uri());
    let client = ApiClient::new(&base, credentials, &TransportConfig::default()).unwrap();
    (server, client)
}

fn status_body() -> serde_json::Value {
    json!({
        "deviceId": "esp32-vent-01",
        "timestamp": "2026-10-16T08:30:00Z",
        "sensors": {
            "indoor":  { "temp": 21.4, "humidity": 48.0, "pressure": 1012.8 },
            "outdoor": { "temp": 14.9, "humidity": 71.0, "pressure": 1013.1 },
            "garage":  { "temp": 17.2, "humidity": 55.0, "pressure": null }
        },
        "system": {
            "fanOn": true, "uptime": 93784, "freeHeap": 182_344,
            "bootReason": "power_on", "wifiRssi": -61
        }
    })
}

// ── Auth headers ────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_key_sent_as_secret_header() {
    let (server, client) = setup(&Credentials::api_key("k-123")).await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(header("X-API-Secret", "k-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .expect(1)
        .mount(&server)
        .await;

    let status = client.status().await.unwrap();
    assert_eq!(status.device_id.as_deref(), Some("esp32-vent-01"));
    assert_eq!(status.sensors.indoor.unwrap().temp, Some(21.4));
    assert_eq!(status.system.wifi_rssi, Some(-61));
    assert!(status.sensors.garage.unwrap().pressure.is_none());
}

#[tokio::test]
async fn test_bearer_token_sent_as_authorization() {
    let (server, client) = setup(&Credentials::bearer("tok-9")).await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(header("Authorization", "Bearer tok-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .expect(1)
        .mount(&server)
        .await;

    client.status().await.unwrap();
}

#[tokio::test]
async fn test_bearer_does_not_leak_secret_header() {
    let (server, client) = setup(&Credentials::bearer("tok-9")).await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(header_exists("X-API-Secret"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .mount(&server)
        .await;

    assert!(client.status().await.is_ok());
}

// ── Query parameters ────────────────────────────────────────────────

#[tokio::test]
async fn test_history_passes_hours() {
    let (server, client) = setup(&Credentials::api_key("k")).await;

    let body = json!({
        "readings": [
            { "timestamp": 1_792_137_600, "indoor": { "temp": 21.0 }, "fanOn": false },
            { "timestamp": "2026-10-16T09:00:00Z", "outdoor": { "temp": 12.5, "humidity": 90.0 } }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/history"))
        .and(query_param("hours", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let history = client.history(24).await.unwrap();
    assert_eq!(history.readings.len(), 2);
    assert_eq!(history.readings[0].fan_on, Some(false));
    assert!(history.readings[1].indoor.is_none());
}

#[tokio::test]
async fn test_door_analytics_passes_days() {
    let (server, client) = setup(&Credentials::api_key("k")).await;

    let body = json!({
        "events": [{
            "doorId": "front", "doorName": "Front door", "opened": true,
            "timestamp": 1_792_137_600, "detectionMethod": "pressure_delta",
            "confidence": 0.87
        }]
    });

    Mock::given(method("GET"))
        .and(path("/api/door-analytics"))
        .and(query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let doors = client.door_analytics(7).await.unwrap();
    assert_eq!(doors.events.len(), 1);
    assert_eq!(doors.events[0].door_id, "front");
    assert_eq!(doors.events[0].confidence, Some(0.87));
}

#[tokio::test]
async fn test_enhanced_dashboard() {
    let (server, client) = setup(&Credentials::api_key("k")).await;

    let body = json!({
        "status": status_body(),
        "incidents": [
            { "type": "high_humidity", "severity": 1, "startTime": 1_792_130_000, "endTime": null }
        ],
        "weather": {
            "temperature": 15.2, "humidity": 70, "precipitationProbability": 40,
            "stormRisk": "moderate"
        },
        "forecast": [
            { "time": 1_792_137_600, "temperature": 13.0, "humidity": 80, "precipitationProbability": 60 }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/enhanced-dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let dash = client.enhanced_dashboard().await.unwrap();
    assert!(dash.status.is_some());
    assert_eq!(dash.incidents[0].kind, "high_humidity");
    assert_eq!(
        dash.weather.unwrap().storm_risk.as_deref(),
        Some("moderate")
    );
    assert_eq!(dash.forecast.len(), 1);
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_401_maps_to_unauthorized() {
    let (server, client) = setup(&Credentials::api_key("wrong")).await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = client.status().await.unwrap_err();
    assert!(err.is_unauthorized(), "got {err:?}");
}

#[tokio::test]
async fn test_404_maps_to_not_found() {
    let (server, client) = setup(&Credentials::api_key("k")).await;

    let err = client.incidents(24).await.unwrap_err();
    match err {
        Error::NotFound { path } => assert_eq!(path, "incidents"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    drop(server);
}

#[tokio::test]
async fn test_500_uses_json_error_message() {
    let (server, client) = setup(&Credentials::api_key("k")).await;

    Mock::given(method("GET"))
        .and(path("/api/enhanced-dashboard"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "cosmos unavailable" })),
        )
        .mount(&server)
        .await;

    let err = client.enhanced_dashboard().await.unwrap_err();
    match &err {
        Error::Http { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "cosmos unavailable");
        }
        other => panic!("expected Http, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup(&Credentials::api_key("k")).await;

    Mock::given(method("GET"))
        .and(path("/api/history"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client.history(1).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("login")),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}
