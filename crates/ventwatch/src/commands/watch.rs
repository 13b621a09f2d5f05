//! `ventwatch watch`: poll until Ctrl-C, one line per refresh.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::time::MissedTickBehavior;

use ventwatch_core::{
    DeviceStatus, Monitor, RefreshReport, TemperatureUnit, VentilationAssessment, Verdict, Zone,
    assess_ventilation,
};

use super::{Ctx, util};
use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;

const DEFAULT_INTERVAL_SECS: u64 = 30;

#[derive(Serialize)]
struct WatchLine<'a> {
    at: DateTime<Utc>,
    status: Option<&'a DeviceStatus>,
    ventilation: VentilationAssessment,
    stale: Vec<&'static str>,
    failed: Vec<&'static str>,
}

fn interval_secs(requested: Option<u64>, profile: u64) -> u64 {
    match requested.unwrap_or(profile) {
        0 => DEFAULT_INTERVAL_SECS,
        secs => secs,
    }
}

fn assess(status: Option<&DeviceStatus>) -> VentilationAssessment {
    let Some(s) = status else {
        return assess_ventilation(&Default::default(), &Default::default(), None);
    };
    assess_ventilation(
        &s.reading(Zone::Indoor),
        &s.reading(Zone::Outdoor),
        s.system.fan_on,
    )
}

fn text_line(
    at: DateTime<Utc>,
    status: Option<&DeviceStatus>,
    report: &RefreshReport,
    units: TemperatureUnit,
    color: bool,
) -> String {
    let time = at.with_timezone(&Local).format("%H:%M:%S");
    let mut line = match status {
        Some(s) => format!(
            "{time}  in {}  out {}  fan {}",
            units.format(s.reading(Zone::Indoor).temperature_c),
            units.format(s.reading(Zone::Outdoor).temperature_c),
            util::fmt_bool(s.system.fan_on, "on", "off")
        ),
        None => format!("{time}  no status"),
    };

    let assessment = assess(status);
    if assessment.verdict != Verdict::Unknown {
        line.push_str("  | ");
        line.push_str(&assessment.headline(units));
    }

    let problems = report.stale.len() + report.failed.len();
    if problems > 0 {
        let note = format!("  ({problems} resource(s) unavailable)");
        if color {
            line.push_str(&note.yellow().to_string());
        } else {
            line.push_str(&note);
        }
    }
    line
}

pub async fn handle(monitor: &Monitor, args: WatchArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let secs = interval_secs(args.interval, ctx.refresh_secs);
    let json = matches!(
        ctx.global.output,
        OutputFormat::Json | OutputFormat::JsonCompact
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tracing::info!(interval_secs = secs, "watching");
    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let report = monitor.refresh().await?;
                for (resource, err) in &report.failed {
                    tracing::warn!(resource, error = %err, "refresh failed");
                }

                let snapshot = monitor.store().status();
                let status = snapshot.as_ref().map(|s| s.data.as_ref());
                let now = Utc::now();

                let line = if json {
                    serde_json::to_string(&WatchLine {
                        at: now,
                        status,
                        ventilation: assess(status),
                        stale: report.stale.clone(),
                        failed: report.failed.iter().map(|(r, _)| *r).collect(),
                    })?
                } else {
                    text_line(now, status, &report, ctx.units, ctx.color)
                };
                if !ctx.global.quiet {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ventwatch_core::SensorReading;

    use super::*;

    #[test]
    fn zero_interval_falls_back_to_default() {
        assert_eq!(interval_secs(None, 0), DEFAULT_INTERVAL_SECS);
        assert_eq!(interval_secs(Some(5), 60), 5);
        assert_eq!(interval_secs(None, 60), 60);
    }

    #[test]
    fn line_reports_missing_resources() {
        let mut status = DeviceStatus::default();
        status.readings.insert(
            Zone::Indoor,
            SensorReading {
                temperature_c: Some(22.0),
                ..SensorReading::default()
            },
        );
        let report = RefreshReport {
            stale: vec!["history"],
            ..RefreshReport::default()
        };

        let line = text_line(
            Utc::now(),
            Some(&status),
            &report,
            TemperatureUnit::Celsius,
            false,
        );
        assert!(line.contains("in 22.0°C"), "{line}");
        assert!(line.contains("out --"), "{line}");
        assert!(line.ends_with("(1 resource(s) unavailable)"), "{line}");
    }
}
