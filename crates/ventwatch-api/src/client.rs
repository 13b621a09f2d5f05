// Hand-crafted async HTTP client for the ventwatch telemetry API.
//
// Base path: whatever the function app is mounted at, e.g. `/api/`
// Auth: X-API-Secret header or Authorization: Bearer

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{AuthStrategy, Credentials};
use crate::transport::TransportConfig;
use crate::types::{
    DashboardResponse, DoorAnalyticsResponse, HistoryResponse, IncidentsResponse, StatusResponse,
};
use crate::Error;

// ── Error response shape from the function app ───────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the telemetry REST endpoints.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    strategy: AuthStrategy,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client that attaches `credentials` to every request.
    pub fn new(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(credentials.headers()?)?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            strategy: credentials.strategy(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        strategy: AuthStrategy,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            strategy,
        })
    }

    /// Parse the base URL and make sure it ends with `/` so relative
    /// endpoint paths join underneath it instead of replacing the last
    /// segment.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw.trim())?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        url.set_query(None);
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth_strategy(&self) -> AuthStrategy {
        self.strategy
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Current sensor readings and controller health.
    pub async fn status(&self) -> Result<StatusResponse, Error> {
        self.get("status", &[]).await
    }

    /// Status, incidents, weather and forecast in one round trip.
    pub async fn enhanced_dashboard(&self) -> Result<DashboardResponse, Error> {
        self.get("enhanced-dashboard", &[]).await
    }

    /// Sensor history for the trailing `hours`.
    pub async fn history(&self, hours: u32) -> Result<HistoryResponse, Error> {
        self.get("history", &[("hours", hours.to_string())]).await
    }

    /// Door open/close events for the trailing `days`.
    pub async fn door_analytics(&self, days: u32) -> Result<DoorAnalyticsResponse, Error> {
        self.get("door-analytics", &[("days", days.to_string())])
            .await
    }

    /// Incident log for the trailing `hours`.
    pub async fn incidents(&self, hours: u32) -> Result<IncidentsResponse, Error> {
        self.get("incidents", &[("hours", hours.to_string())]).await
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.base_url.join(path)?;
        debug!("GET {url} params={params:?}");

        let mut req = self.http.get(url);
        if !params.is_empty() {
            req = req.query(params);
        }
        let resp = req.send().await?;
        self.handle_response(path, resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(path, status, resp).await)
        }
    }

    async fn parse_error(&self, path: &str, status: StatusCode, resp: reqwest::Response) -> Error {
        match status {
            StatusCode::UNAUTHORIZED => return Error::Unauthorized,
            StatusCode::NOT_FOUND => {
                return Error::NotFound {
                    path: path.to_owned(),
                };
            }
            StatusCode::TOO_MANY_REQUESTS => return Error::RateLimited,
            _ => {}
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.error.or(e.message))
            .unwrap_or_else(|| {
                if raw.trim().is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        if status == StatusCode::FORBIDDEN {
            Error::Forbidden { message }
        } else {
            Error::Http {
                status: status.as_u16(),
                message,
            }
        }
    }
}
