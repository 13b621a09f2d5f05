use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::Error;

/// Header carrying the shared API secret on every request.
pub const API_SECRET_HEADER: &str = "X-API-Secret";

/// Which authentication strategy a client uses.
///
/// Marker enum (no data) -- the actual secret lives in [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Shared API secret sent as `X-API-Secret`.
    ApiKey,
    /// Bearer token sent as `Authorization: Bearer ...`.
    Bearer,
}

/// Credentials for authenticating with the telemetry API.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Shared API secret, usually lifted from a dashboard link's `?apikey=`.
    ApiKey { key: SecretString },

    /// Bearer token issued to a signed-in user.
    Bearer { token: SecretString },
}

impl Credentials {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey {
            key: SecretString::from(key.into()),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: SecretString::from(token.into()),
        }
    }

    pub fn strategy(&self) -> AuthStrategy {
        match self {
            Self::ApiKey { .. } => AuthStrategy::ApiKey,
            Self::Bearer { .. } => AuthStrategy::Bearer,
        }
    }

    /// Default headers for a client using these credentials.
    ///
    /// Values are marked sensitive so they never show up in debug output.
    pub fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        match self {
            Self::ApiKey { key } => {
                let value = sensitive_value(key.expose_secret())?;
                headers.insert(HeaderName::from_static("x-api-secret"), value);
            }
            Self::Bearer { token } => {
                let value = sensitive_value(&format!("Bearer {}", token.expose_secret()))?;
                headers.insert(AUTHORIZATION, value);
            }
        }
        Ok(headers)
    }
}

fn sensitive_value(raw: &str) -> Result<HeaderValue, Error> {
    if raw.trim().is_empty() {
        return Err(Error::InvalidCredential {
            message: "credential is empty".into(),
        });
    }
    let mut value = HeaderValue::from_str(raw).map_err(|e| Error::InvalidCredential {
        message: format!("invalid header value: {e}"),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_key_uses_secret_header() {
        let headers = Credentials::api_key("s3cret").headers().unwrap();
        let value = headers.get(API_SECRET_HEADER).unwrap();
        assert_eq!(value.to_str().unwrap(), "s3cret");
        assert!(value.is_sensitive());
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_uses_authorization_header() {
        let headers = Credentials::bearer("tok").headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
        assert!(headers.get(API_SECRET_HEADER).is_none());
    }

    #[test]
    fn empty_credential_is_rejected() {
        let err = Credentials::api_key("  ").headers().unwrap_err();
        assert!(matches!(err, Error::InvalidCredential { .. }));
    }

    #[test]
    fn newline_in_key_is_rejected() {
        let err = Credentials::api_key("abc\ndef").headers().unwrap_err();
        assert!(matches!(err, Error::InvalidCredential { .. }));
    }
}
