//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use ventwatch_core::{Severity, StormRisk};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn paint_severity(severity: Severity, color: bool) -> String {
    let label = severity.to_string();
    if !color {
        return label;
    }
    match severity {
        Severity::Info => label.cyan().to_string(),
        Severity::Warning => label.yellow().to_string(),
        Severity::Major => label.bright_red().to_string(),
        Severity::Critical => label.red().bold().to_string(),
    }
}

pub fn paint_storm(risk: StormRisk, color: bool) -> String {
    let label = risk.to_string();
    if !color {
        return label;
    }
    match risk {
        StormRisk::High | StormRisk::Severe => label.red().bold().to_string(),
        StormRisk::Moderate => label.yellow().to_string(),
        StormRisk::None | StormRisk::Low => label.green().to_string(),
        StormRisk::Unknown => label.dimmed().to_string(),
    }
}

/// Dimmed marker appended to stale values.
pub fn stale_marker(stale: bool, color: bool) -> String {
    match (stale, color) {
        (false, _) => String::new(),
        (true, true) => format!(" {}", "(stale)".dimmed()),
        (true, false) => " (stale)".into(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                return Ok("(none)".into());
            }
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&plain_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since detail views are key/value
/// blocks rather than rows.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Two-column `label  value` block for detail views.
pub fn detail_block(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(k, v)| format!("{k:<width$}  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: &'static str,
    }

    #[test]
    fn list_formats() {
        let items = [Item { name: "front" }, Item { name: "garage" }];
        let row = |i: &Item| ItemRow { name: i.name };
        let plain = |i: &Item| i.name.to_owned();

        let table = render_list(&OutputFormat::Table, &items, row, plain).unwrap();
        assert!(table.contains("Name") && table.contains("garage"));

        let json = render_list(&OutputFormat::JsonCompact, &items, row, plain).unwrap();
        assert_eq!(json, r#"[{"name":"front"},{"name":"garage"}]"#);

        let lines = render_list(&OutputFormat::Plain, &items, row, plain).unwrap();
        assert_eq!(lines, "front\ngarage");
    }

    #[test]
    fn empty_table_says_none() {
        let items: [Item; 0] = [];
        let out = render_list(
            &OutputFormat::Table,
            &items,
            |i| ItemRow { name: i.name },
            |i| i.name.to_owned(),
        )
        .unwrap();
        assert_eq!(out, "(none)");
    }

    #[test]
    fn detail_block_aligns_labels() {
        let out = detail_block(&[("Fan", "on".into()), ("Uptime", "2h".into())]);
        assert_eq!(out, "Fan     on\nUptime  2h");
    }

    #[test]
    fn uncolored_labels_are_plain() {
        assert_eq!(paint_severity(Severity::Critical, false), "critical");
        assert_eq!(stale_marker(true, false), " (stale)");
        assert_eq!(stale_marker(false, true), "");
    }
}
