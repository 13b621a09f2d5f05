//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use secrecy::ExposeSecret;

use ventwatch_config::{AuthMode, Config, Profile};
use ventwatch_core::{HistoryRange, TemperatureUnit};

use super::login;
use super::util::prompt_err;
use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

fn units_key(units: TemperatureUnit) -> &'static str {
    match units {
        TemperatureUnit::Celsius => "c",
        TemperatureUnit::Fahrenheit => "f",
    }
}

/// Copy of `cfg` with every stored secret masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
        if profile.token.is_some() {
            profile.token = Some(MASK.into());
        }
    }
    cfg
}

/// TOML-looking view of an already redacted config.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "units = \"{}\"", units_key(d.units));
    let _ = writeln!(out, "timeout = {}", d.timeout);
    let _ = writeln!(out, "refresh_interval = {}", d.refresh_interval);
    let _ = writeln!(out, "cache_ttl_secs = {}", d.cache_ttl_secs);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode.as_str());
        if let Some(ref key) = p.api_key {
            let _ = writeln!(out, "api_key = \"{key}\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref token) = p.token {
            let _ = writeln!(out, "token = \"{token}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(secs) = p.refresh_interval {
            let _ = writeln!(out, "refresh_interval = {secs}");
        }
        if let Some(secs) = p.cache_ttl_secs {
            let _ = writeln!(out, "cache_ttl_secs = {secs}");
        }
        if let Some(units) = p.units {
            let _ = writeln!(out, "units = \"{}\"", units_key(units));
        }
        if let Some(range) = p.history_range {
            let _ = writeln!(out, "history_range = \"{range}\"");
        }
        if let Some(days) = p.door_window_days {
            let _ = writeln!(out, "door_window_days = {days}");
        }
    }

    out
}

fn invalid(field: &str, reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CliError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(field, "must be a whole number"))
}

/// Apply one `config set` assignment to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => {
            ventwatch_config::parse_api_url(&value)?;
            profile.api_url = value;
        }
        "auth_mode" | "auth-mode" => profile.auth_mode = value.parse::<AuthMode>()?,
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "token" => profile.token = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(
                value
                    .parse()
                    .map_err(|_| invalid("insecure", "must be 'true' or 'false'"))?,
            );
        }
        "timeout" => profile.timeout = Some(parse_number("timeout", &value)?),
        "refresh_interval" | "refresh-interval" => {
            profile.refresh_interval = Some(parse_number("refresh_interval", &value)?);
        }
        "cache_ttl_secs" | "cache-ttl" => {
            profile.cache_ttl_secs = Some(parse_number("cache_ttl_secs", &value)?);
        }
        "units" => {
            profile.units = Some(
                value
                    .parse::<TemperatureUnit>()
                    .map_err(|e| invalid("units", e))?,
            );
        }
        "history_range" | "history-range" => {
            profile.history_range = Some(
                value
                    .parse::<HistoryRange>()
                    .map_err(|e| invalid("history_range", e))?,
            );
        }
        "door_window_days" | "door-window-days" => {
            let days: u32 = parse_number("door_window_days", &value)?;
            if days == 0 {
                return Err(invalid("door_window_days", "must be at least 1"));
            }
            profile.door_window_days = Some(days);
        }
        other => {
            return Err(invalid(
                other,
                format!(
                    "unknown config key '{other}'. Valid keys: api_url, auth_mode, api_key, \
                     api_key_env, token, ca_cert, insecure, timeout, refresh_interval, \
                     cache_ttl_secs, units, history_range, door_window_days"
                ),
            ));
        }
    }
    Ok(())
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
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

// ── Init wizard ─────────────────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = ventwatch_config::config_path();
    let mut cfg = ventwatch_config::load_config_or_default();
    eprintln!("ventwatch configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let new_login = login::prompt_login()?;
    let api_url = match new_login.api_url {
        Some(ref url) => url.clone(),
        None => {
            let existing = cfg
                .profiles
                .get(&profile_name)
                .map(|p| p.api_url.clone())
                .filter(|u| !u.is_empty());
            let mut input = Input::<String>::new().with_prompt("API URL");
            if let Some(url) = existing {
                input = input.default(url);
            }
            let raw = input.interact_text().map_err(prompt_err)?;
            ventwatch_config::parse_api_url(&raw)?
        }
    };

    let units = Select::new()
        .with_prompt("Temperature units")
        .items(&["Celsius", "Fahrenheit"])
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let units = if units == 0 {
        TemperatureUnit::Celsius
    } else {
        TemperatureUnit::Fahrenheit
    };

    let storage = Select::new()
        .with_prompt("Where to store the secret?")
        .items(&[
            "System keyring (recommended)",
            "Config file (plaintext)",
        ])
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let plaintext = if storage == 0 {
        ventwatch_config::store_credential(&profile_name, new_login.mode, &new_login.secret)?;
        eprintln!("   ✓ Secret stored in system keyring");
        None
    } else {
        Some(new_login.secret.expose_secret().to_owned())
    };

    let profile = cfg.profiles.entry(profile_name.clone()).or_default();
    login::apply_login(profile, &api_url, new_login.mode, plaintext);
    profile.units = Some(units);
    cfg.default_profile = Some(profile_name.clone());

    ventwatch_config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: ventwatch status");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&ventwatch_config::load_config()?);
            let out = output::render_single(&global.output, &cfg, format_config, |c| {
                c.profiles.keys().cloned().collect::<Vec<_>>().join("\n")
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = ventwatch_config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            ventwatch_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = ventwatch_config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: ventwatch login");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.api_url);
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = ventwatch_config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }

            cfg.default_profile = Some(name.clone());
            ventwatch_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                api_url: "https://vent.example/api/".into(),
                api_key: Some("hunter2".into()),
                token: Some("bearer-secret".into()),
                ..Profile::default()
            },
        );

        let text = format_config(&redacted(&cfg));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("bearer-secret"));
        assert!(text.contains("api_key = \"****\""));
        assert!(text.contains("[profiles.home]"));
    }

    #[test]
    fn set_parses_typed_keys() {
        let mut p = Profile::default();
        set_profile_key(&mut p, "units", "F".into()).unwrap();
        set_profile_key(&mut p, "history-range", "7d".into()).unwrap();
        set_profile_key(&mut p, "timeout", "12".into()).unwrap();
        set_profile_key(&mut p, "auth_mode", "token".into()).unwrap();

        assert_eq!(p.units, Some(TemperatureUnit::Fahrenheit));
        assert_eq!(p.history_range, Some(HistoryRange::Week));
        assert_eq!(p.timeout, Some(12));
        assert_eq!(p.auth_mode, AuthMode::Token);
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut p = Profile::default();
        assert!(set_profile_key(&mut p, "api_url", "ftp://x".into()).is_err());
        assert!(set_profile_key(&mut p, "door_window_days", "0".into()).is_err());
        assert!(set_profile_key(&mut p, "colour", "red".into()).is_err());
        assert!(p.api_url.is_empty());
    }
}
