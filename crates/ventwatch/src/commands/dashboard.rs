//! `ventwatch dashboard`

use serde::Serialize;
use strum::IntoEnumIterator;

use ventwatch_core::{
    Dashboard, Monitor, VentilationAssessment, Zone, active_incidents, assess_ventilation,
};

use super::status::zone_label;
use super::{Ctx, util};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct DashboardView<'a> {
    #[serde(flatten)]
    dashboard: &'a Dashboard,
    ventilation: VentilationAssessment,
}

pub async fn handle(monitor: &Monitor, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let snap = util::fetch(ctx, "Fetching dashboard", monitor.dashboard()).await?;
    let dashboard = snap.data.as_ref();

    let view = DashboardView {
        dashboard,
        ventilation: ventilation(dashboard),
    };

    let out = output::render_single(
        &ctx.global.output,
        &view,
        |v| {
            let mut text = detail(v, ctx);
            text.push_str(&output::stale_marker(snap.stale, ctx.color));
            text
        },
        |v| v.ventilation.verdict.to_string(),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

pub fn ventilation(dashboard: &Dashboard) -> VentilationAssessment {
    let status = dashboard.status.clone().unwrap_or_default();
    assess_ventilation(
        &status.reading(Zone::Indoor),
        &status.reading(Zone::Outdoor),
        status.system.fan_on,
    )
}

fn detail(view: &DashboardView<'_>, ctx: &Ctx<'_>) -> String {
    let d = view.dashboard;
    let mut rows: Vec<(&str, String)> = Vec::new();

    if let Some(ref status) = d.status {
        for zone in Zone::iter() {
            if let Some(reading) = status.readings.get(&zone) {
                rows.push((zone_label(zone), util::fmt_reading(reading, ctx.units)));
            }
        }
        rows.push(("Fan", util::fmt_bool(status.system.fan_on, "on", "off")));
    } else {
        rows.push(("Sensors", "No data".into()));
    }

    let v = &view.ventilation;
    let score = match (v.score, v.rating) {
        (Some(score), Some(rating)) => format!(" [{score:.0}/100 {rating}]"),
        _ => String::new(),
    };
    rows.push(("Ventilation", format!("{}{score}", v.headline(ctx.units))));

    if let Some(ref w) = d.weather {
        rows.push((
            "Weather",
            format!(
                "{}  {}  rain {}",
                ctx.units.format(w.temperature_c),
                util::fmt_pct(w.humidity_pct),
                util::fmt_pct(w.precipitation_probability_pct)
            ),
        ));
        rows.push(("Storm risk", output::paint_storm(w.storm_risk, ctx.color)));
    }

    let active = active_incidents(&d.incidents);
    let incidents = match active.iter().max_by_key(|i| i.severity) {
        None => "none active".into(),
        Some(worst) => format!(
            "{} active, worst: {} ({})",
            active.len(),
            worst.title(),
            output::paint_severity(worst.severity, ctx.color)
        ),
    };
    rows.push(("Incidents", incidents));

    output::detail_block(&rows)
}

#[cfg(test)]
mod tests {
    use ventwatch_core::{DeviceStatus, SensorReading, Verdict};

    use super::*;

    #[test]
    fn ventilation_without_status_is_unknown() {
        assert_eq!(ventilation(&Dashboard::default()).verdict, Verdict::Unknown);
    }

    #[test]
    fn ventilation_uses_indoor_and_outdoor() {
        let mut status = DeviceStatus::default();
        let reading = |t| SensorReading {
            temperature_c: Some(t),
            ..SensorReading::default()
        };
        status.readings.insert(Zone::Indoor, reading(26.0));
        status.readings.insert(Zone::Outdoor, reading(20.0));
        status.system.fan_on = Some(true);

        let dashboard = Dashboard {
            status: Some(status),
            ..Dashboard::default()
        };
        assert_eq!(ventilation(&dashboard).verdict, Verdict::Effective);
    }
}
