//! Command dispatch: bridges CLI args -> core/API calls -> output formatting.

pub mod alerts;
pub mod api_keys;
pub mod apps;
pub mod call;
pub mod config_cmd;
pub mod dashboard;
pub mod jobs;
pub mod login;
pub mod ping;
pub mod pools;
pub mod reporting;
pub mod system;
pub mod util;
pub mod watch;

use truemanager_core::Manager;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
///
/// `login` verifies credentials itself; every other command sends the
/// configured credentials as-is and lets the server reject them.
pub async fn dispatch(cmd: Command, manager: &Manager, global: &GlobalOpts) -> Result<(), CliError> {
    if !matches!(cmd, Command::Login(_)) {
        manager.set_authorization(manager.config().auth.to_authorization());
    }

    match cmd {
        Command::Login(args) => login::handle(manager, args, global).await,
        Command::Dashboard => dashboard::handle(manager, global).await,
        Command::System(args) => system::handle(manager, args, global).await,
        Command::Pools(args) => pools::handle(manager, args, global).await,
        Command::Alerts(args) => alerts::handle(manager, args, global).await,
        Command::Reporting(args) => reporting::handle(manager, args, global).await,
        Command::Apps(args) => apps::handle(manager, args, global).await,
        Command::ApiKeys(args) => api_keys::handle(manager, args, global).await,
        Command::Jobs(args) => jobs::handle(manager, args, global).await,
        Command::Ping(args) => ping::handle(manager, args, global).await,
        Command::Call(args) => call::handle(manager, args, global).await,
        Command::Watch(args) => watch::handle(manager, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled before connecting".into(),
        }),
    }
}
