use thiserror::Error;

/// Top-level error type for the `ventwatch-api` crate.
///
/// Covers every failure mode of the telemetry endpoints: authentication,
/// transport, HTTP status, and decoding. `ventwatch-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API rejected the key or token (HTTP 401).
    #[error("Unauthorized -- API key or token rejected")]
    Unauthorized,

    /// The credential was accepted but lacks access (HTTP 403).
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The credential cannot be encoded as an HTTP header value.
    #[error("Invalid credential: {message}")]
    InvalidCredential { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP status ─────────────────────────────────────────────────
    /// Endpoint does not exist on this deployment (HTTP 404).
    #[error("Endpoint not found: {path}")]
    NotFound { path: String },

    /// The function app is throttling requests (HTTP 429).
    #[error("Rate limited by the API")]
    RateLimited,

    /// Any other non-2xx response.
    #[error("API error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the API refused the credential outright.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns `true` if the next poll has a fair chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the underlying request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited => Some(429),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Http {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert!(err.is_transient());
        assert_eq!(err.status(), Some(503));

        let err = Error::Http {
            status: 400,
            message: "bad hours".into(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn unauthorized_is_not_transient() {
        assert!(Error::Unauthorized.is_unauthorized());
        assert!(!Error::Unauthorized.is_transient());
        assert_eq!(Error::Unauthorized.status(), Some(401));
    }
}
