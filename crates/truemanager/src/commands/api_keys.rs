//! API key command handlers.

use tabled::Tabled;

use truemanager_api::types::{ApiKey, ApiKeyCreate, ApiKeyUpdate};
use truemanager_core::Manager;

use crate::cli::{ApiKeysArgs, ApiKeysCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ApiKeyRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Allowed")]
    allowlist: String,
}

impl From<&ApiKey> for ApiKeyRow {
    fn from(k: &ApiKey) -> Self {
        Self {
            id: k.id,
            name: k.name.clone(),
            created: output::timestamp(k.created_at.as_ref()),
            allowlist: k
                .allowlist
                .iter()
                .map(|e| format!("{} {}", e.method, e.resource))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Print a freshly issued key. The server shows it only once.
fn print_key(key: &ApiKey, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        global.output,
        key,
        |k| {
            format!(
                "{}\n\nStore this key now; it cannot be retrieved again.",
                k.key.as_deref().unwrap_or("-")
            )
        },
        |k| k.key.clone().unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    manager: &Manager,
    args: ApiKeysArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let rest = manager.rest();
    match args.command {
        ApiKeysCommand::List => {
            let keys = rest.list_api_keys().await?;
            let out = output::render_list(global.output, &keys, |k| ApiKeyRow::from(k), |k| {
                k.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ApiKeysCommand::Create { name } => {
            let key = rest.create_api_key(&ApiKeyCreate::full_access(name)).await?;
            print_key(&key, global)
        }

        ApiKeysCommand::Rename { id, name } => {
            let update = ApiKeyUpdate {
                name: Some(name),
                ..ApiKeyUpdate::default()
            };
            let key = rest.update_api_key(id, &update).await?;
            output::notice(&format!("API key {id} renamed to '{}'", key.name), global.quiet);
            Ok(())
        }

        ApiKeysCommand::Reset { id } => {
            if !util::confirm(
                &format!("Regenerate API key {id}? Clients using it will stop working."),
                global.yes,
            )? {
                return Ok(());
            }
            let update = ApiKeyUpdate {
                reset: true,
                ..ApiKeyUpdate::default()
            };
            let key = rest.update_api_key(id, &update).await?;
            print_key(&key, global)
        }

        ApiKeysCommand::Delete { id } => {
            if !util::confirm(&format!("Delete API key {id}?"), global.yes)? {
                return Ok(());
            }
            rest.delete_api_key(id).await?;
            output::notice(&format!("API key {id} deleted"), global.quiet);
            Ok(())
        }
    }
}
