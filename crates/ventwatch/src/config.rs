//! CLI-side profile resolution: applies global flags on top of
//! `ventwatch-config` and produces a `MonitorConfig`.

use std::time::Duration;

use secrecy::SecretString;

use ventwatch_config::{Config, CredentialOverrides, CredentialSource, Profile};
use ventwatch_core::{MonitorConfig, TemperatureUnit, TlsVerification};

use crate::cli::{GlobalOpts, Units};
use crate::error::CliError;

/// Profile name from `--profile`, then the config default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Display units: flag, then profile, then global default.
pub fn display_units(global: &GlobalOpts, cfg: &Config, profile_name: &str) -> TemperatureUnit {
    if let Some(units) = global.units {
        return match units {
            Units::C => TemperatureUnit::Celsius,
            Units::F => TemperatureUnit::Fahrenheit,
        };
    }
    cfg.profiles
        .get(profile_name)
        .and_then(|p| p.units)
        .unwrap_or(cfg.defaults.units)
}

fn overrides(global: &GlobalOpts) -> CredentialOverrides {
    CredentialOverrides {
        api_key: global.api_key.clone().map(SecretString::from),
        token: global.token.clone().map(SecretString::from),
    }
}

/// Build a `MonitorConfig` from the config file, profile, and CLI flags.
/// Also returns where the credential came from.
///
/// Without a matching profile, `--api-url` plus a key or token is enough.
pub fn build_monitor_config(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(String, MonitorConfig, CredentialSource), CliError> {
    let profile_name = active_profile_name(global, cfg);

    let ad_hoc;
    let profile = if let Some(profile) = cfg.profiles.get(&profile_name) {
        profile
    } else {
        let api_url = global.api_url.clone().ok_or_else(|| CliError::NoConfig {
            path: ventwatch_config::config_path().display().to_string(),
        })?;
        ad_hoc = Profile {
            api_url,
            ..Profile::default()
        };
        &ad_hoc
    };

    let resolved =
        ventwatch_config::resolve_credentials(profile, &profile_name, &overrides(global))?;
    let mut monitor = ventwatch_config::monitor_config(profile, &cfg.defaults, resolved.auth)?;

    if let Some(ref url) = global.api_url {
        monitor.url = ventwatch_config::parse_api_url(url)?;
    }
    if global.insecure {
        monitor.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        monitor.timeout = Duration::from_secs(secs);
    }

    Ok((profile_name, monitor, resolved.source))
}
