//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};

use serde_json::Value;

use truemanager_api::types::Pool;
use truemanager_core::Manager;

use crate::error::{CliError, prompt_err};

/// Look a pool up by numeric ID or by name.
pub async fn resolve_pool(manager: &Manager, identifier: &str) -> Result<Pool, CliError> {
    if let Ok(id) = identifier.parse::<u64>() {
        return Ok(manager.rest().get_pool(id).await?);
    }

    let pools = manager.rest().list_pools().await?;
    pools
        .into_iter()
        .find(|pool| pool.name == identifier)
        .ok_or_else(|| CliError::NotFound {
            resource: format!("pool '{identifier}'"),
        })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "--yes".into(),
            reason: format!("'{message}' needs confirmation; pass --yes in non-interactive use"),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Parse a command-line parameter as JSON, falling back to a bare string.
pub fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
