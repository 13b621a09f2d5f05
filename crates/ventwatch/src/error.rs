//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use ventwatch_config::ConfigError;
use ventwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the telemetry API at {url}")]
    #[diagnostic(
        code(ventwatch::connection_failed),
        help(
            "Check the API URL and your network connection.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(ventwatch::auth_failed),
        help(
            "The API rejected the key or token for profile '{profile}'.\n\
             Run: ventwatch login --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("Session revoked for profile '{profile}'")]
    #[diagnostic(
        code(ventwatch::session_revoked),
        help(
            "The API key was rejected repeatedly. A key saved by `ventwatch login` has been\n\
             removed; keys from --api-key or the environment are left as they are.\n\
             Run: ventwatch login --link <dashboard link>"
        )
    )]
    SessionRevoked { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(ventwatch::no_credentials),
        help(
            "Store a key with: ventwatch login --link <dashboard link>\n\
             Or set the VENTWATCH_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource} not found")]
    #[diagnostic(
        code(ventwatch::not_found),
        help("This API deployment may not expose that endpoint.")
    )]
    NotFound { resource: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(ventwatch::api_error))]
    ApiError { status: String, message: String },

    #[error("Unexpected response from the API: {message}")]
    #[diagnostic(code(ventwatch::invalid_data))]
    InvalidData { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ventwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ventwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: ventwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API configured")]
    #[diagnostic(
        code(ventwatch::no_config),
        help(
            "Create a profile with: ventwatch config init\n\
             Or pass --api-url and --api-key.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(ventwatch::config))]
    Config { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(ventwatch::timeout),
        help("Increase the timeout with --timeout, or check that the device API is up.")
    )]
    Timeout,

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(ventwatch::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(ventwatch::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::SessionRevoked { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to auth errors.
    pub fn with_profile(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { .. } => Self::AuthFailed {
                profile: name.into(),
            },
            Self::SessionRevoked { .. } => Self::SessionRevoked {
                profile: name.into(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "default".into(),
            },

            CoreError::SessionRevoked { attempts: _ } => CliError::SessionRevoked {
                profile: "default".into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::NotFound { resource } => CliError::NotFound { resource },

            CoreError::InvalidData { message } => CliError::InvalidData { message },

            CoreError::Api { message, status } => CliError::ApiError {
                status: status.map_or_else(|| "-".into(), |s| s.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::ApiError {
                status: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => {
                let cfg = ventwatch_config::load_config_or_default();
                let available: Vec<_> = cfg.profiles.keys().cloned().collect();
                CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                }
            }
            ConfigError::LinkWithoutKey => CliError::Validation {
                field: "link".into(),
                reason: "no apikey or key parameter in the link".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::Timeout.exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            CliError::from(CoreError::SessionRevoked { attempts: 2 }).exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from(CoreError::NotFound {
                resource: "incidents".into()
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(CoreError::ConnectionFailed {
                url: "http://x".into(),
                reason: "refused".into()
            })
            .exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(
            CliError::Validation {
                field: "x".into(),
                reason: "y".into()
            }
            .exit_code(),
            exit_code::USAGE
        );
        assert_eq!(
            CliError::Config {
                message: String::new()
            }
            .exit_code(),
            exit_code::GENERAL
        );
    }

    #[test]
    fn profile_name_attached_to_auth_errors() {
        let err = CliError::from(CoreError::AuthenticationFailed {
            message: "no".into(),
        })
        .with_profile("home");
        assert!(matches!(err, CliError::AuthFailed { profile } if profile == "home"));
    }
}
