//! `ventwatch weather`

use serde::Serialize;
use tabled::Tabled;

use ventwatch_core::{ForecastPoint, Monitor, TemperatureUnit, WeatherSnapshot};

use super::{Ctx, util};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct WeatherView<'a> {
    current: Option<&'a WeatherSnapshot>,
    forecast: &'a [ForecastPoint],
}

#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Rain")]
    rain: String,
}

fn forecast_row(p: &ForecastPoint, units: TemperatureUnit) -> ForecastRow {
    ForecastRow {
        time: util::fmt_time(Some(p.time)),
        temperature: units.format(p.temperature_c),
        humidity: util::fmt_pct(p.humidity_pct),
        rain: util::fmt_pct(p.precipitation_probability_pct),
    }
}

fn detail(view: &WeatherView<'_>, ctx: &Ctx<'_>) -> String {
    let mut text = match view.current {
        Some(w) => output::detail_block(&[
            (
                "Conditions",
                w.description.clone().unwrap_or_else(|| "--".into()),
            ),
            ("Temperature", ctx.units.format(w.temperature_c)),
            ("Humidity", util::fmt_pct(w.humidity_pct)),
            ("Rain chance", util::fmt_pct(w.precipitation_probability_pct)),
            ("Storm risk", output::paint_storm(w.storm_risk, ctx.color)),
        ]),
        None => "No current weather reported".into(),
    };

    if !view.forecast.is_empty() {
        let rows: Vec<ForecastRow> = view
            .forecast
            .iter()
            .map(|p| forecast_row(p, ctx.units))
            .collect();
        text.push_str("\n\n");
        text.push_str(&output::render_table(&rows));
    }
    text
}

pub async fn handle(monitor: &Monitor, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let snap = util::fetch(ctx, "Fetching weather", monitor.dashboard()).await?;
    let view = WeatherView {
        current: snap.data.weather.as_ref(),
        forecast: &snap.data.forecast,
    };

    let out = output::render_single(
        &ctx.global.output,
        &view,
        |v| {
            let mut text = detail(v, ctx);
            text.push_str(&output::stale_marker(snap.stale, ctx.color));
            text
        },
        |v| {
            v.current
                .map(|w| w.storm_risk.to_string())
                .unwrap_or_default()
        },
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
