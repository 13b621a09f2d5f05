//! `ventwatch status`

use bytesize::ByteSize;
use chrono::Utc;
use owo_colors::OwoColorize;
use strum::IntoEnumIterator;

use ventwatch_core::{DeviceStatus, Monitor, Zone};

use super::{Ctx, util};
use crate::error::CliError;
use crate::output;

pub async fn handle(monitor: &Monitor, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let snap = util::fetch(ctx, "Fetching status", monitor.status()).await?;

    let out = output::render_single(
        &ctx.global.output,
        snap.data.as_ref(),
        |s| {
            let mut text = detail(s, ctx);
            text.push_str(&output::stale_marker(snap.stale, ctx.color));
            text
        },
        |s| plain(s, ctx),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

fn detail(s: &DeviceStatus, ctx: &Ctx<'_>) -> String {
    let now = Utc::now();
    let mut rows: Vec<(&str, String)> = vec![
        ("Device", s.device_id.clone().unwrap_or_else(|| "--".into())),
        (
            "Reported",
            format!(
                "{} ({})",
                util::fmt_time(s.reported_at),
                util::fmt_ago(s.reported_at, now)
            ),
        ),
    ];

    for zone in Zone::iter() {
        if let Some(reading) = s.readings.get(&zone) {
            rows.push((zone_label(zone), util::fmt_reading(reading, ctx.units)));
        }
    }

    let sys = &s.system;
    rows.push(("Fan", util::fmt_bool(sys.fan_on, "on", "off")));
    rows.push((
        "Uptime",
        sys.uptime.map_or_else(|| "--".into(), util::fmt_duration),
    ));
    rows.push((
        "Free heap",
        sys.free_heap_bytes
            .map_or_else(|| "--".into(), |b| ByteSize::b(b).to_string()),
    ));

    let boot = match sys.boot_reason {
        Some(ref reason) if reason.is_abnormal() && ctx.color => reason.to_string().yellow().to_string(),
        Some(ref reason) => reason.to_string(),
        None => "--".into(),
    };
    rows.push(("Boot reason", boot));

    let wifi = match (sys.wifi_rssi_dbm, sys.wifi_signal()) {
        (Some(dbm), Some(signal)) => format!("{dbm} dBm ({signal})"),
        _ => "--".into(),
    };
    rows.push(("Wi-Fi", wifi));

    output::detail_block(&rows)
}

/// `zone temp humidity pressure`, one zone per line, `-` for gaps.
fn plain(s: &DeviceStatus, ctx: &Ctx<'_>) -> String {
    let dash = |v: Option<f64>| v.map_or_else(|| "-".into(), |v| format!("{v:.1}"));
    s.readings
        .iter()
        .map(|(zone, r)| {
            format!(
                "{zone} {} {} {}",
                dash(r.temperature_c.map(|c| ctx.units.from_celsius(c))),
                dash(r.humidity_pct),
                dash(r.pressure_hpa)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn zone_label(zone: Zone) -> &'static str {
    match zone {
        Zone::Indoor => "Indoor",
        Zone::Outdoor => "Outdoor",
        Zone::Garage => "Garage",
    }
}
