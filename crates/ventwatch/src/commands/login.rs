//! `ventwatch login` / `ventwatch logout`, plus the cleanup run after the
//! API revokes a key mid-command.

use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::{Input, Select};
use secrecy::SecretString;
use url::Url;

use ventwatch_config::{AuthMode, Config, CredentialSource, Profile};
use ventwatch_core::{AuthCredentials, Monitor, MonitorConfig, TemperatureUnit, TlsVerification};

use super::{Ctx, util};
use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;

/// Where the new credential and API URL came from.
pub(super) struct NewLogin {
    pub api_url: Option<Url>,
    pub mode: AuthMode,
    pub secret: SecretString,
}

fn empty_secret(field: &str) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: "value cannot be empty".into(),
    }
}

fn from_flags(args: &LoginArgs, global: &GlobalOpts) -> Result<Option<NewLogin>, CliError> {
    if let Some(ref link) = args.link {
        let link = ventwatch_config::parse_dashboard_link(link)?;
        return Ok(Some(NewLogin {
            api_url: Some(link.api_url),
            mode: AuthMode::ApiKey,
            secret: link.api_key,
        }));
    }
    if let Some(ref token) = global.token {
        return Ok(Some(NewLogin {
            api_url: None,
            mode: AuthMode::Token,
            secret: SecretString::from(token.clone()),
        }));
    }
    if let Some(ref key) = global.api_key {
        return Ok(Some(NewLogin {
            api_url: None,
            mode: AuthMode::ApiKey,
            secret: SecretString::from(key.clone()),
        }));
    }
    Ok(None)
}

pub(super) fn prompt_login() -> Result<NewLogin, CliError> {
    let choices = &["Paste a dashboard link", "Enter an API key", "Enter a bearer token"];
    let selection = Select::new()
        .with_prompt("How do you want to sign in?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(util::prompt_err)?;

    match selection {
        0 => {
            let link: String = Input::new()
                .with_prompt("Dashboard link")
                .interact_text()
                .map_err(util::prompt_err)?;
            let link = ventwatch_config::parse_dashboard_link(&link)?;
            Ok(NewLogin {
                api_url: Some(link.api_url),
                mode: AuthMode::ApiKey,
                secret: link.api_key,
            })
        }
        1 => {
            let key = rpassword::prompt_password("API key: ").map_err(util::prompt_err)?;
            if key.is_empty() {
                return Err(empty_secret("api_key"));
            }
            Ok(NewLogin {
                api_url: None,
                mode: AuthMode::ApiKey,
                secret: SecretString::from(key),
            })
        }
        _ => {
            let token = rpassword::prompt_password("Token: ").map_err(util::prompt_err)?;
            if token.is_empty() {
                return Err(empty_secret("token"));
            }
            Ok(NewLogin {
                api_url: None,
                mode: AuthMode::Token,
                secret: SecretString::from(token),
            })
        }
    }
}

/// API URL precedence: link, `--api-url`, existing profile, then a prompt.
fn resolve_api_url(
    login: &NewLogin,
    global: &GlobalOpts,
    existing: Option<&Profile>,
) -> Result<Url, CliError> {
    if let Some(ref url) = login.api_url {
        return Ok(url.clone());
    }
    if let Some(ref raw) = global.api_url {
        return Ok(ventwatch_config::parse_api_url(raw)?);
    }
    if let Some(p) = existing.filter(|p| !p.api_url.is_empty()) {
        return Ok(ventwatch_config::parse_api_url(&p.api_url)?);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "api_url".into(),
            reason: "no API URL known for this profile; pass --api-url or --link".into(),
        });
    }
    let raw: String = Input::new()
        .with_prompt("API URL")
        .interact_text()
        .map_err(util::prompt_err)?;
    Ok(ventwatch_config::parse_api_url(&raw)?)
}

async fn verify(url: Url, login: &NewLogin, global: &GlobalOpts) -> Result<(), CliError> {
    let auth = match login.mode {
        AuthMode::ApiKey => AuthCredentials::ApiKey(login.secret.clone()),
        AuthMode::Token => AuthCredentials::Bearer(login.secret.clone()),
    };
    let mut monitor_config = MonitorConfig::new(url, auth);
    if global.insecure {
        monitor_config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        monitor_config.timeout = Duration::from_secs(secs);
    }

    let ctx = Ctx {
        global,
        units: TemperatureUnit::default(),
        color: false,
        refresh_secs: 0,
    };
    let ctx = &ctx;
    Monitor::oneshot(monitor_config, move |monitor| async move {
        util::fetch(ctx, "Checking credentials", monitor.status())
            .await
            .map(|_| ())
    })
    .await
}

/// Record the credential in `profile`: plaintext in the file, or cleared
/// there because the keyring holds it.
pub(super) fn apply_login(
    profile: &mut Profile,
    api_url: &Url,
    mode: AuthMode,
    plaintext: Option<String>,
) {
    profile.api_url = api_url.to_string();
    profile.auth_mode = mode;
    match mode {
        AuthMode::ApiKey => profile.api_key = plaintext,
        AuthMode::Token => profile.token = plaintext,
    }
}

pub(super) fn make_default_if_unset(cfg: &mut Config, name: &str) {
    let has_default = cfg
        .default_profile
        .as_ref()
        .is_some_and(|d| cfg.profiles.contains_key(d));
    if !has_default {
        cfg.default_profile = Some(name.to_owned());
    }
}

pub async fn handle(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = ventwatch_config::load_config_or_default();
    let name = config::active_profile_name(global, &cfg);

    let login = match from_flags(&args, global)? {
        Some(login) => login,
        None if std::io::stdin().is_terminal() => prompt_login()?,
        None => {
            return Err(CliError::Validation {
                field: "credentials".into(),
                reason: "pass --link, --api-key or --token when not running interactively".into(),
            });
        }
    };
    let api_url = resolve_api_url(&login, global, cfg.profiles.get(&name))?;

    if args.no_verify {
        tracing::debug!("skipping credential check");
    } else {
        verify(api_url.clone(), &login, global)
            .await
            .map_err(|e| e.with_profile(&name))?;
    }

    let plaintext = if args.plaintext {
        use secrecy::ExposeSecret;
        Some(login.secret.expose_secret().to_owned())
    } else {
        ventwatch_config::store_credential(&name, login.mode, &login.secret)?;
        None
    };

    let profile = cfg.profiles.entry(name.clone()).or_default();
    apply_login(profile, &api_url, login.mode, plaintext);
    make_default_if_unset(&mut cfg, &name);
    ventwatch_config::save_config(&cfg)?;

    if !global.quiet {
        let stored = if args.plaintext {
            "config file"
        } else {
            "system keyring"
        };
        eprintln!("✓ Signed in as profile '{name}' ({api_url}), secret in {stored}");
    }
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = ventwatch_config::load_config_or_default();
    let name = config::active_profile_name(global, &cfg);

    ventwatch_config::forget_credential(&name, AuthMode::ApiKey)?;
    ventwatch_config::forget_credential(&name, AuthMode::Token)?;

    if let Some(profile) = cfg.profiles.get_mut(&name) {
        if profile.api_key.is_some() || profile.token.is_some() {
            profile.api_key = None;
            profile.token = None;
            ventwatch_config::save_config(&cfg)?;
        }
    }

    if !global.quiet {
        eprintln!("✓ Signed out of profile '{name}'");
    }
    Ok(())
}

/// Drop the stored credential after the monitor revoked the session.
/// Keys given by flag or env var are left alone.
///
/// Failures are logged, never returned: the revocation error is what the
/// user needs to see.
pub fn forget_after_revocation(profile_name: &str, source: CredentialSource) {
    match ventwatch_config::forget_revoked(profile_name, source) {
        Ok(true) => {
            tracing::info!(profile = profile_name, ?source, "revoked credential forgotten");
        }
        Ok(false) => {
            tracing::debug!(profile = profile_name, ?source, "nothing stored to forget");
        }
        Err(e) => {
            tracing::warn!(error = %e, profile = profile_name, "could not forget revoked credential");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_login_fills_matching_field() {
        let mut profile = Profile {
            token: Some("old".into()),
            ..Profile::default()
        };
        let url = Url::parse("https://vent.example/api/").unwrap();

        apply_login(&mut profile, &url, AuthMode::Token, Some("t0k".into()));
        assert_eq!(profile.api_url, "https://vent.example/api/");
        assert_eq!(profile.auth_mode, AuthMode::Token);
        assert_eq!(profile.token.as_deref(), Some("t0k"));

        apply_login(&mut profile, &url, AuthMode::ApiKey, None);
        assert_eq!(profile.api_key, None);
        assert_eq!(profile.auth_mode, AuthMode::ApiKey);
    }

    #[test]
    fn default_profile_only_replaced_when_dangling() {
        let mut cfg = Config::default();
        make_default_if_unset(&mut cfg, "home");
        assert_eq!(cfg.default_profile.as_deref(), Some("home"));

        cfg.profiles.insert("home".into(), Profile::default());
        make_default_if_unset(&mut cfg, "cabin");
        assert_eq!(cfg.default_profile.as_deref(), Some("home"));
    }
}
