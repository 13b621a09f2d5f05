//! `ventwatch incidents`

use chrono::{DateTime, Utc};
use tabled::Tabled;

use ventwatch_core::{Incident, IncidentEnd, Monitor, Severity, filter_by_min_severity};

use super::{Ctx, util};
use crate::cli::{IncidentsArgs, SeverityArg};
use crate::error::CliError;
use crate::output;

pub fn severity_from_arg(arg: SeverityArg) -> Severity {
    match arg {
        SeverityArg::Info => Severity::Info,
        SeverityArg::Warning => Severity::Warning,
        SeverityArg::Major => Severity::Major,
        SeverityArg::Critical => Severity::Critical,
    }
}

#[derive(Tabled)]
struct IncidentRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Incident")]
    title: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Ended")]
    ended: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Details")]
    description: String,
}

fn row(i: &Incident, now: DateTime<Utc>, color: bool) -> IncidentRow {
    IncidentRow {
        severity: output::paint_severity(i.severity, color),
        title: i.title(),
        started: util::fmt_time(i.started_at),
        ended: match i.end {
            IncidentEnd::At(at) => util::fmt_time(Some(at)),
            IncidentEnd::Ongoing => "ongoing".into(),
            IncidentEnd::Unreadable => "unknown".into(),
        },
        duration: i
            .duration(now)
            .and_then(|d| d.to_std().ok())
            .map_or_else(|| "--".into(), util::fmt_duration),
        description: i.description.clone().unwrap_or_default(),
    }
}

/// Severity filter first, then optionally drop incidents that have ended.
fn select(incidents: &[Incident], min: Severity, active_only: bool) -> Vec<Incident> {
    let mut out = filter_by_min_severity(incidents, min);
    if active_only {
        out.retain(Incident::is_active);
    }
    out
}

pub async fn handle(
    monitor: &Monitor,
    args: IncidentsArgs,
    ctx: &Ctx<'_>,
) -> Result<(), CliError> {
    if args.hours == 0 {
        return Err(CliError::Validation {
            field: "hours".into(),
            reason: "must be at least 1".into(),
        });
    }

    let snap = util::fetch(ctx, "Fetching incidents", monitor.incidents(args.hours)).await?;
    let shown = select(
        &snap.data.incidents,
        severity_from_arg(args.min_severity),
        args.active,
    );

    let now = Utc::now();
    let out = output::render_list(
        &ctx.global.output,
        &shown,
        |i| row(i, now, ctx.color),
        |i| format!("{}\t{}\t{}", i.severity.level(), i.kind, i.is_active()),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn incident(kind: &str, severity: Severity, ended: bool) -> Incident {
        let start = Utc.with_ymd_and_hms(2026, 7, 1, 10, 0, 0).unwrap();
        Incident {
            kind: kind.into(),
            severity,
            started_at: Some(start),
            end: if ended {
                IncidentEnd::At(start + chrono::Duration::minutes(90))
            } else {
                IncidentEnd::Ongoing
            },
            description: None,
        }
    }

    #[test]
    fn select_applies_severity_then_active() {
        let all = vec![
            incident("high_humidity", Severity::Warning, true),
            incident("sensor_failure", Severity::Critical, false),
            incident("wifi_drop", Severity::Info, false),
        ];

        let kinds = |v: Vec<Incident>| v.into_iter().map(|i| i.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds(select(&all, Severity::Warning, false)),
            ["high_humidity", "sensor_failure"]
        );
        assert_eq!(
            kinds(select(&all, Severity::Info, true)),
            ["sensor_failure", "wifi_drop"]
        );
    }

    #[test]
    fn row_marks_ongoing_and_formats_duration() {
        let now = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        let ongoing = row(&incident("fan_stuck", Severity::Major, false), now, false);
        assert_eq!(ongoing.ended, "ongoing");
        assert_eq!(ongoing.duration, "2h");
        assert_eq!(ongoing.title, "Fan stuck");

        let done = row(&incident("fan_stuck", Severity::Major, true), now, false);
        assert_eq!(done.duration, "1h 30m");
        assert_eq!(done.severity, "major");
    }
}
