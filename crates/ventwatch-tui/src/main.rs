//! `ventwatch-tui`: real-time terminal dashboard for the ESP32 ventilation
//! monitor.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `ventwatch-core`'s [`SnapshotStream`](ventwatch_core::SnapshotStream).
//! Screens are navigable via number keys (1-4): Dashboard, History,
//! Incidents and Doors.
//!
//! Logs are written to a file (default `/tmp/ventwatch-tui.log`) to avoid
//! corrupting the terminal UI. A background data bridge task forwards
//! snapshot updates from the monitor into the TUI action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ventwatch_core::Monitor;

use crate::app::App;

/// Terminal dashboard for the ventwatch ventilation monitor.
#[derive(Parser, Debug)]
#[command(name = "ventwatch-tui", version, about)]
struct Cli {
    /// Profile to use (defaults to the config's default profile)
    #[arg(short = 'p', long, env = "VENTWATCH_PROFILE")]
    profile: Option<String>,

    /// Log file path
    #[arg(long, default_value = "/tmp/ventwatch-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may go to stdout/stderr while the TUI owns
/// the terminal. Hold the guard for the lifetime of the app so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ventwatch_tui={log_level},ventwatch_core={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("ventwatch-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched.
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let cfg = ventwatch_config::load_config().wrap_err("could not read ventwatch config")?;
    let (profile_name, config, source) =
        ventwatch_config::profile_to_monitor_config(&cfg, cli.profile.as_deref()).map_err(
            |e| eyre!("{e}\nRun `ventwatch login` to set up a profile first."),
        )?;

    let units = cfg
        .profiles
        .get(&profile_name)
        .and_then(|p| p.units)
        .unwrap_or(cfg.defaults.units);

    info!(profile = %profile_name, url = %config.url, "starting ventwatch-tui");

    let monitor = Monitor::new(config)?;
    let mut app = App::new(monitor, profile_name, source, units);
    app.run().await?;

    Ok(())
}
