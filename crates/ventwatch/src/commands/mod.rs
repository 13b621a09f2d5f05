//! Command dispatch: bridges CLI args -> monitor reads -> output formatting.

pub mod config_cmd;
pub mod dashboard;
pub mod doors;
pub mod history;
pub mod incidents;
pub mod login;
pub mod status;
pub mod util;
pub mod watch;
pub mod weather;

use ventwatch_core::{Monitor, TemperatureUnit};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Per-invocation settings shared by the API-bound handlers.
pub struct Ctx<'a> {
    pub global: &'a GlobalOpts,
    pub units: TemperatureUnit,
    pub color: bool,
    /// Poll interval from the profile, for `watch`.
    pub refresh_secs: u64,
}

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, monitor: &Monitor, ctx: &Ctx<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(monitor, ctx).await,
        Command::Dashboard => dashboard::handle(monitor, ctx).await,
        Command::History(args) => history::handle(monitor, args, ctx).await,
        Command::Incidents(args) => incidents::handle(monitor, args, ctx).await,
        Command::Doors(args) => doors::handle(monitor, args, ctx).await,
        Command::Weather => weather::handle(monitor, ctx).await,
        Command::Watch(args) => watch::handle(monitor, args, ctx).await,
        // Local commands are handled before dispatch
        Command::Config(_) | Command::Login(_) | Command::Logout | Command::Completions(_) => {
            Ok(())
        }
    }
}
