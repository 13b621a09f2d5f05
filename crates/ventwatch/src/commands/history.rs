//! `ventwatch history`

use tabled::Tabled;

use ventwatch_core::{HistoryPoint, HistoryRange, Monitor, TemperatureUnit, Zone};

use super::{Ctx, util};
use crate::cli::{HistoryArgs, RangeArg, ZoneArg};
use crate::error::CliError;
use crate::output;

pub fn range_from_arg(arg: RangeArg) -> HistoryRange {
    match arg {
        RangeArg::OneHour => HistoryRange::OneHour,
        RangeArg::SixHours => HistoryRange::SixHours,
        RangeArg::Day => HistoryRange::Day,
        RangeArg::Week => HistoryRange::Week,
    }
}

pub fn zone_from_arg(arg: ZoneArg) -> Zone {
    match arg {
        ZoneArg::Indoor => Zone::Indoor,
        ZoneArg::Outdoor => Zone::Outdoor,
        ZoneArg::Garage => Zone::Garage,
    }
}

#[derive(Tabled)]
struct OverviewRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Indoor")]
    indoor: String,
    #[tabled(rename = "Outdoor")]
    outdoor: String,
    #[tabled(rename = "Garage")]
    garage: String,
    #[tabled(rename = "Fan")]
    fan: String,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Pressure")]
    pressure: String,
}

fn overview_row(p: &HistoryPoint, units: TemperatureUnit) -> OverviewRow {
    OverviewRow {
        time: util::fmt_time(Some(p.timestamp)),
        indoor: units.format(p.indoor.temperature_c),
        outdoor: units.format(p.outdoor.temperature_c),
        garage: units.format(p.garage.temperature_c),
        fan: util::fmt_bool(p.fan_on, "on", "off"),
    }
}

fn zone_row(p: &HistoryPoint, zone: Zone, units: TemperatureUnit) -> ZoneRow {
    let r = p.reading(zone);
    ZoneRow {
        time: util::fmt_time(Some(p.timestamp)),
        temperature: units.format(r.temperature_c),
        humidity: util::fmt_pct(r.humidity_pct),
        pressure: util::fmt_hpa(r.pressure_hpa),
    }
}

/// `rfc3339 value value value`, temperatures in display units.
fn plain(p: &HistoryPoint, zone: Option<Zone>, units: TemperatureUnit) -> String {
    let dash = |v: Option<f64>| v.map_or_else(|| "-".into(), |v| format!("{v:.1}"));
    let temp = |z: Zone| dash(p.reading(z).temperature_c.map(|c| units.from_celsius(c)));
    let ts = p.timestamp.to_rfc3339();
    match zone {
        Some(z) => {
            let r = p.reading(z);
            format!(
                "{ts} {} {} {}",
                temp(z),
                dash(r.humidity_pct),
                dash(r.pressure_hpa)
            )
        }
        None => format!(
            "{ts} {} {} {}",
            temp(Zone::Indoor),
            temp(Zone::Outdoor),
            temp(Zone::Garage)
        ),
    }
}

pub async fn handle(monitor: &Monitor, args: HistoryArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let range = range_from_arg(args.range);
    let zone = args.zone.map(zone_from_arg);

    let snap = util::fetch(ctx, "Fetching history", monitor.history(range)).await?;
    let series = snap.data.as_ref();

    if series.rejected > 0 && !ctx.global.quiet {
        eprintln!(
            "note: skipped {} sample(s) with implausible timestamps",
            series.rejected
        );
    }

    let units = ctx.units;
    let out = match zone {
        Some(z) => output::render_list(
            &ctx.global.output,
            &series.points,
            |p| zone_row(p, z, units),
            |p| plain(p, Some(z), units),
        )?,
        None => output::render_list(
            &ctx.global.output,
            &series.points,
            |p| overview_row(p, units),
            |p| plain(p, None, units),
        )?,
    };
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use ventwatch_core::SensorReading;

    use super::*;

    fn point() -> HistoryPoint {
        let reading = |t, h| SensorReading {
            temperature_c: Some(t),
            humidity_pct: Some(h),
            pressure_hpa: None,
        };
        HistoryPoint {
            timestamp: Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap(),
            indoor: reading(24.0, 50.0),
            outdoor: reading(18.0, 70.0),
            garage: SensorReading::default(),
            fan_on: Some(true),
        }
    }

    #[test]
    fn plain_overview_lists_zone_temperatures() {
        assert_eq!(
            plain(&point(), None, TemperatureUnit::Celsius),
            "2026-07-01T12:00:00+00:00 24.0 18.0 -"
        );
    }

    #[test]
    fn plain_zone_converts_units() {
        assert_eq!(
            plain(&point(), Some(Zone::Outdoor), TemperatureUnit::Fahrenheit),
            "2026-07-01T12:00:00+00:00 64.4 70.0 -"
        );
    }

    #[test]
    fn range_args_map_to_windows() {
        assert_eq!(range_from_arg(RangeArg::Week).hours(), 168);
        assert_eq!(range_from_arg(RangeArg::OneHour).hours(), 1);
    }
}
