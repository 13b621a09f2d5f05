mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ventwatch_core::Monitor;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    match cli.command {
        // Local-only commands
        Command::Config(args) => commands::config_cmd::handle(args, global),
        Command::Login(args) => commands::login::handle(args, global).await,
        Command::Logout => commands::login::logout(global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "ventwatch", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the API
        cmd => {
            let cfg = ventwatch_config::load_config_or_default();
            let (profile_name, monitor_config, source) =
                config::build_monitor_config(global, &cfg)?;

            let ctx = commands::Ctx {
                global,
                units: config::display_units(global, &cfg, &profile_name),
                color: output::should_color(&global.color),
                refresh_secs: monitor_config.refresh_interval_secs,
            };
            let ctx = &ctx;

            tracing::debug!(command = ?cmd, profile = %profile_name, "dispatching command");
            let result = Monitor::oneshot(monitor_config, move |monitor| async move {
                commands::dispatch(cmd, &monitor, ctx).await
            })
            .await;

            result.map_err(|err| {
                if matches!(err, CliError::SessionRevoked { .. }) {
                    commands::login::forget_after_revocation(&profile_name, source);
                }
                err.with_profile(&profile_name)
            })
        }
    }
}
