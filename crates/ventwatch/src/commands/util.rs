//! Shared helpers for command handlers.

use std::future::Future;
use std::io::IsTerminal;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use ventwatch_core::{CoreError, SensorReading, TemperatureUnit};

use super::Ctx;
use crate::cli::OutputFormat;
use crate::error::CliError;

/// Run `fut` behind a stderr spinner when a human is watching.
pub async fn with_spinner<T>(ctx: &Ctx<'_>, message: &str, fut: impl Future<Output = T>) -> T {
    let interactive = !ctx.global.quiet
        && matches!(ctx.global.output, OutputFormat::Table)
        && std::io::stderr().is_terminal();

    let spinner = interactive.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_owned());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    });

    let out = fut.await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    out
}

/// Fetch through the spinner and convert the error.
pub async fn fetch<T>(
    ctx: &Ctx<'_>,
    message: &str,
    fut: impl Future<Output = Result<T, CoreError>>,
) -> Result<T, CliError> {
    with_spinner(ctx, message, fut).await.map_err(CliError::from)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Formatting ──────────────────────────────────────────────────────

pub fn fmt_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "--".into(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// "3m ago" style age, or "--".
pub fn fmt_ago(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(t) = ts else {
        return "--".into();
    };
    match (now - t).to_std() {
        Ok(age) => format!("{} ago", fmt_duration(age)),
        Err(_) => "just now".into(),
    }
}

/// Coarse human duration: seconds are dropped once past a minute.
pub fn fmt_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let rounded = if secs >= 60 { secs - secs % 60 } else { secs };
    humantime::format_duration(Duration::from_secs(rounded)).to_string()
}

pub fn fmt_pct(v: Option<f64>) -> String {
    v.map_or_else(|| "--".into(), |v| format!("{v:.0}%"))
}

pub fn fmt_hpa(v: Option<f64>) -> String {
    v.map_or_else(|| "--".into(), |v| format!("{v:.1} hPa"))
}

/// `21.4°C  48%  1012.8 hPa`
pub fn fmt_reading(r: &SensorReading, units: TemperatureUnit) -> String {
    format!(
        "{}  {}  {}",
        units.format(r.temperature_c),
        fmt_pct(r.humidity_pct),
        fmt_hpa(r.pressure_hpa)
    )
}

pub fn fmt_bool(v: Option<bool>, yes: &str, no: &str) -> String {
    match v {
        Some(true) => yes.into(),
        Some(false) => no.into(),
        None => "--".into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn durations_drop_seconds_past_a_minute() {
        assert_eq!(fmt_duration(Duration::from_secs(42)), "42s");
        assert_eq!(fmt_duration(Duration::from_secs(3725)), "1h 2m");
    }

    #[test]
    fn ago_handles_missing_and_future() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(fmt_ago(None, now), "--");
        assert_eq!(
            fmt_ago(Some(now - chrono::Duration::minutes(5)), now),
            "5m ago"
        );
        assert_eq!(
            fmt_ago(Some(now + chrono::Duration::minutes(1)), now),
            "just now"
        );
    }

    #[test]
    fn reading_line_uses_units() {
        let r = SensorReading {
            temperature_c: Some(20.0),
            humidity_pct: Some(48.4),
            pressure_hpa: None,
        };
        assert_eq!(
            fmt_reading(&r, TemperatureUnit::Fahrenheit),
            "68.0°F  48%  --"
        );
    }
}
