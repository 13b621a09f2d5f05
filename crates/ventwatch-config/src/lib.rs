//! Shared configuration for the ventwatch CLI and TUI.
//!
//! TOML profiles, credential resolution (flag, env, keyring, plaintext),
//! dashboard-link parsing, and translation to
//! `ventwatch_core::MonitorConfig`. Core never reads files; both binaries
//! resolve a profile here and hand the result in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use ventwatch_core::{
    AuthCredentials, HistoryRange, MonitorConfig, TemperatureUnit, TlsVerification,
};

pub const KEYRING_SERVICE: &str = "ventwatch";
pub const API_KEY_ENV: &str = "VENTWATCH_API_KEY";
pub const TOKEN_ENV: &str = "VENTWATCH_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("dashboard link has no apikey or key parameter")]
    LinkWithoutKey,

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
            .to_owned();
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None => Err(ConfigError::UnknownProfile { name }),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub units: TemperatureUnit,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Poll interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            units: TemperatureUnit::default(),
            timeout: default_timeout(),
            refresh_interval: default_refresh_interval(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh_interval() -> u64 {
    30
}
fn default_cache_ttl() -> u64 {
    30
}

/// How a profile authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// Shared secret, sent as `X-API-Secret`.
    #[default]
    ApiKey,
    /// Bearer token.
    Token,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "api-key",
            Self::Token => "token",
        }
    }

    /// Keyring account name for this mode under `profile`.
    pub fn keyring_user(self, profile: &str) -> String {
        match self {
            Self::ApiKey => format!("{profile}/api-key"),
            Self::Token => format!("{profile}/token"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api-key" | "apikey" | "key" => Ok(Self::ApiKey),
            "token" | "bearer" => Ok(Self::Token),
            other => Err(ConfigError::Validation {
                field: "auth_mode".into(),
                reason: format!("expected 'api-key' or 'token', got '{other}'"),
            }),
        }
    }
}

/// A named API profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://ventwatch.azurewebsites.net/api/").
    pub api_url: String,

    #[serde(default)]
    pub auth_mode: AuthMode,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Bearer token (plaintext, prefer keyring).
    pub token: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    pub timeout: Option<u64>,
    pub refresh_interval: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
    pub units: Option<TemperatureUnit>,
    pub history_range: Option<HistoryRange>,
    pub door_window_days: Option<u32>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "ventwatch", "ventwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ventwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path. A missing file yields the defaults.
///
/// Environment overrides use double underscores for nesting, e.g.
/// `VENTWATCH_DEFAULTS__UNITS=f`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VENTWATCH_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Dashboard links ─────────────────────────────────────────────────

/// An API location and key taken from a shared dashboard URL.
#[derive(Debug, Clone)]
pub struct DashboardLink {
    /// `<origin>/api/` of the page the link points at.
    pub api_url: Url,
    pub api_key: SecretString,
}

/// Extract the key from `https://host/dashboard?apikey=...`.
///
/// `apikey` wins over `key` when both are present.
pub fn parse_dashboard_link(link: &str) -> Result<DashboardLink, ConfigError> {
    let url = Url::parse(link.trim()).map_err(|e| ConfigError::Validation {
        field: "link".into(),
        reason: e.to_string(),
    })?;

    let mut apikey = None;
    let mut key = None;
    for (name, value) in url.query_pairs() {
        if value.is_empty() {
            continue;
        }
        match name.as_ref() {
            "apikey" => apikey = Some(value.into_owned()),
            "key" => key = Some(value.into_owned()),
            _ => {}
        }
    }
    let secret = apikey.or(key).ok_or(ConfigError::LinkWithoutKey)?;

    let api_url = url
        .join("/api/")
        .map_err(|e| ConfigError::Validation {
            field: "link".into(),
            reason: e.to_string(),
        })?;

    Ok(DashboardLink {
        api_url,
        api_key: SecretString::from(secret),
    })
}

// ── Credential resolution ───────────────────────────────────────────

/// Secrets given on the command line. Either one also picks the mode.
#[derive(Debug, Default, Clone)]
pub struct CredentialOverrides {
    pub api_key: Option<SecretString>,
    pub token: Option<SecretString>,
}

/// Where a resolved credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Flag,
    Env,
    Keyring(AuthMode),
    Plaintext(AuthMode),
}

impl CredentialSource {
    /// Whether ventwatch stored this credential and may forget it.
    pub fn is_stored(self) -> bool {
        matches!(self, Self::Keyring(_) | Self::Plaintext(_))
    }
}

/// Credentials plus the place they were read from.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub auth: AuthCredentials,
    pub source: CredentialSource,
}

/// Resolve credentials for a profile.
///
/// Order: flag, env var, system keyring, plaintext in config.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
    overrides: &CredentialOverrides,
) -> Result<ResolvedCredentials, ConfigError> {
    resolve_credentials_with(
        profile,
        profile_name,
        overrides,
        |var| std::env::var(var).ok(),
        |user| {
            keyring::Entry::new(KEYRING_SERVICE, user)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// Resolution with injectable env and keyring lookups.
pub fn resolve_credentials_with(
    profile: &Profile,
    profile_name: &str,
    overrides: &CredentialOverrides,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedCredentials, ConfigError> {
    if let Some(ref token) = overrides.token {
        return Ok(ResolvedCredentials {
            auth: AuthCredentials::Bearer(token.clone()),
            source: CredentialSource::Flag,
        });
    }
    if let Some(ref key) = overrides.api_key {
        return Ok(ResolvedCredentials {
            auth: AuthCredentials::ApiKey(key.clone()),
            source: CredentialSource::Flag,
        });
    }

    let mode = profile.auth_mode;
    let from_env = match mode {
        AuthMode::ApiKey => profile
            .api_key_env
            .as_deref()
            .and_then(&env)
            .or_else(|| env(API_KEY_ENV)),
        AuthMode::Token => env(TOKEN_ENV),
    };
    let plaintext = match mode {
        AuthMode::ApiKey => profile.api_key.clone(),
        AuthMode::Token => profile.token.clone(),
    };

    let found = |secret: Option<String>, source| {
        secret
            .filter(|s| !s.is_empty())
            .map(|s| (s, source))
    };
    let (secret, source) = found(from_env, CredentialSource::Env)
        .or_else(|| {
            found(
                keyring(&mode.keyring_user(profile_name)),
                CredentialSource::Keyring(mode),
            )
        })
        .or_else(|| found(plaintext, CredentialSource::Plaintext(mode)))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    let secret = SecretString::from(secret);
    let auth = match mode {
        AuthMode::ApiKey => AuthCredentials::ApiKey(secret),
        AuthMode::Token => AuthCredentials::Bearer(secret),
    };
    Ok(ResolvedCredentials { auth, source })
}

/// Save a secret in the system keyring for `profile_name`.
pub fn store_credential(
    profile_name: &str,
    mode: AuthMode,
    secret: &SecretString,
) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &mode.keyring_user(profile_name))?;
    entry.set_password(secret.expose_secret())?;
    Ok(())
}

/// Remove any stored secret for `profile_name`. Missing entries are fine.
pub fn forget_credential(profile_name: &str, mode: AuthMode) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &mode.keyring_user(profile_name))?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Forget a credential the API has revoked.
///
/// Flag and env credentials are left alone. A stored credential loses only
/// the entry it was read from. Returns whether anything was removed.
pub fn forget_revoked(profile_name: &str, source: CredentialSource) -> Result<bool, ConfigError> {
    forget_revoked_with(profile_name, source, &config_path(), forget_credential)
}

/// [`forget_revoked`] with an explicit config path and keyring removal.
pub fn forget_revoked_with(
    profile_name: &str,
    source: CredentialSource,
    path: &Path,
    forget_keyring: impl FnOnce(&str, AuthMode) -> Result<(), ConfigError>,
) -> Result<bool, ConfigError> {
    match source {
        CredentialSource::Flag | CredentialSource::Env => Ok(false),
        CredentialSource::Keyring(mode) => {
            forget_keyring(profile_name, mode)?;
            debug!(profile = profile_name, mode = mode.as_str(), "keyring entry forgotten");
            Ok(true)
        }
        CredentialSource::Plaintext(mode) => {
            let mut cfg = load_config_from(path)?;
            let Some(profile) = cfg.profiles.get_mut(profile_name) else {
                return Ok(false);
            };
            let field = match mode {
                AuthMode::ApiKey => &mut profile.api_key,
                AuthMode::Token => &mut profile.token,
            };
            if field.take().is_none() {
                return Ok(false);
            }
            save_config_to(&cfg, path)?;
            debug!(profile = profile_name, mode = mode.as_str(), "plaintext secret cleared");
            Ok(true)
        }
    }
}

// ── MonitorConfig translation ───────────────────────────────────────

/// Parse and sanity-check an API base URL.
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Build a `MonitorConfig` from a profile, global defaults and
/// already-resolved credentials.
pub fn monitor_config(
    profile: &Profile,
    defaults: &Defaults,
    auth: AuthCredentials,
) -> Result<MonitorConfig, ConfigError> {
    let url = parse_api_url(&profile.api_url)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = MonitorConfig::new(url, auth);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.refresh_interval_secs = profile.refresh_interval.unwrap_or(defaults.refresh_interval);
    config.cache_ttl = Duration::from_secs(profile.cache_ttl_secs.unwrap_or(defaults.cache_ttl_secs));
    if let Some(range) = profile.history_range {
        config.history_range = range;
    }
    if let Some(days) = profile.door_window_days {
        config.door_window_days = days;
    }
    Ok(config)
}

/// Resolve the named (or default) profile straight into a `MonitorConfig`.
/// Suitable for the TUI and other consumers without CLI flags. Also
/// returns where the credential came from.
pub fn profile_to_monitor_config(
    cfg: &Config,
    profile_name: Option<&str>,
) -> Result<(String, MonitorConfig, CredentialSource), ConfigError> {
    let (name, profile) = cfg.profile(profile_name)?;
    let resolved = resolve_credentials(profile, &name, &CredentialOverrides::default())?;
    let monitor = monitor_config(profile, &cfg.defaults, resolved.auth)?;
    Ok((name, monitor, resolved.source))
}
