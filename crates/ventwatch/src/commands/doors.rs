//! `ventwatch doors events|summary`

use tabled::Tabled;

use ventwatch_core::{DoorEvent, DoorSummary, Monitor, summarize_doors};

use super::{Ctx, util};
use crate::cli::{DoorsArgs, DoorsCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Door")]
    door: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Detected by")]
    method: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl From<&DoorEvent> for EventRow {
    fn from(e: &DoorEvent) -> Self {
        Self {
            time: util::fmt_time(e.timestamp),
            door: e.door_name.clone(),
            action: if e.opened { "opened" } else { "closed" }.into(),
            method: e
                .detection_method
                .as_ref()
                .map_or_else(|| "--".into(), ToString::to_string),
            confidence: util::fmt_pct(e.confidence.map(|c| c * 100.0)),
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Door")]
    door: String,
    #[tabled(rename = "Opens")]
    opens: u32,
    #[tabled(rename = "Closes")]
    closes: u32,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Last event")]
    last: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl From<&DoorSummary> for SummaryRow {
    fn from(s: &DoorSummary) -> Self {
        Self {
            door: s.door_name.clone(),
            opens: s.opens,
            closes: s.closes,
            state: util::fmt_bool(s.last_opened, "open", "closed"),
            last: util::fmt_time(s.last_event_at),
            confidence: util::fmt_pct(s.mean_confidence.map(|c| c * 100.0)),
        }
    }
}

fn check_days(days: u32) -> Result<u32, CliError> {
    if days == 0 {
        return Err(CliError::Validation {
            field: "days".into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(days)
}

pub async fn handle(monitor: &Monitor, args: DoorsArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let out = match args.command {
        DoorsCommand::Events { days } => {
            let snap = util::fetch(
                ctx,
                "Fetching door events",
                monitor.door_events(check_days(days)?),
            )
            .await?;
            let mut events = snap.data.events.clone();
            events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            output::render_list(
                &ctx.global.output,
                &events,
                |e| EventRow::from(e),
                |e| {
                    format!(
                        "{}\t{}\t{}",
                        e.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default(),
                        e.door_id,
                        if e.opened { "open" } else { "close" }
                    )
                },
            )?
        }
        DoorsCommand::Summary { days } => {
            let snap = util::fetch(
                ctx,
                "Fetching door events",
                monitor.door_events(check_days(days)?),
            )
            .await?;
            let summary = summarize_doors(&snap.data.events);
            output::render_list(&ctx.global.output, &summary, |s| SummaryRow::from(s), |s| {
                format!("{}\t{}\t{}", s.door_id, s.opens, s.closes)
            })?
        }
    };
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
