// ── Runtime monitor configuration ──
//
// These types describe *how* to reach the telemetry API. They carry
// credential data and polling tuning, but never touch disk. The CLI/TUI
// resolve a profile into a `MonitorConfig` and hand it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use ventwatch_api::{Credentials, TlsMode, TransportConfig};

use crate::model::HistoryRange;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_DOOR_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_INCIDENT_WINDOW_HOURS: u32 = 24;
pub const DEFAULT_UNAUTHORIZED_THRESHOLD: u32 = 2;

/// How to authenticate with the API.
///
/// Carries the secret itself, unlike `ventwatch_api::AuthStrategy`.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Shared secret sent as `X-API-Secret`.
    ApiKey(SecretString),
    /// Bearer token sent as `Authorization`.
    Bearer(SecretString),
}

impl From<&AuthCredentials> for Credentials {
    fn from(auth: &AuthCredentials) -> Self {
        match auth {
            AuthCredentials::ApiKey(key) => Credentials::ApiKey { key: key.clone() },
            AuthCredentials::Bearer(token) => Credentials::Bearer {
                token: token.clone(),
            },
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled root store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

/// Configuration for a single monitored device's API.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// API base URL (e.g., `https://ventwatch.azurewebsites.net/api/`).
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Poll interval in seconds. 0 = never poll.
    pub refresh_interval_secs: u64,
    /// TTL for status and dashboard. History, door and incident caches
    /// live twice as long.
    pub cache_ttl: Duration,
    pub history_range: HistoryRange,
    pub door_window_days: u32,
    pub incident_window_hours: u32,
    /// Consecutive 401s before an API-key session is revoked.
    pub unauthorized_threshold: u32,
}

impl MonitorConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            cache_ttl: DEFAULT_CACHE_TTL,
            history_range: HistoryRange::default(),
            door_window_days: DEFAULT_DOOR_WINDOW_DAYS,
            incident_window_hours: DEFAULT_INCIDENT_WINDOW_HOURS,
            unauthorized_threshold: DEFAULT_UNAUTHORIZED_THRESHOLD,
        }
    }

    /// TTL for the slower-moving resources.
    pub fn long_ttl(&self) -> Duration {
        self.cache_ttl.saturating_mul(2)
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
