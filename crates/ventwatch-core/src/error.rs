// ── Core error types ──
//
// User-facing errors from ventwatch-core. Consumers never see reqwest
// errors or JSON parse failures directly. The `From<ventwatch_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the telemetry API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session revoked after {attempts} rejected requests -- sign in again")]
    SessionRevoked { attempts: u32 },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid data from API: {message}")]
    InvalidData { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for any credential problem, revoked or not.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::SessionRevoked { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ventwatch_api::Error> for CoreError {
    fn from(err: ventwatch_api::Error) -> Self {
        use ventwatch_api::Error as Api;

        match err {
            Api::Unauthorized => CoreError::AuthenticationFailed {
                message: "API key or token rejected".into(),
            },
            Api::Forbidden { message } => CoreError::AuthenticationFailed { message },
            Api::InvalidCredential { message } => CoreError::Config { message },
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::NotFound { path } => CoreError::NotFound { resource: path },
            Api::RateLimited => CoreError::Api {
                message: "Rate limited by the API".into(),
                status: Some(429),
            },
            Api::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::Deserialization { message, body: _ } => CoreError::InvalidData { message },
        }
    }
}
