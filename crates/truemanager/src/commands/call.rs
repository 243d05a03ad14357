//! Raw middleware call over the websocket.

use serde_json::Value;

use truemanager_core::Manager;

use crate::cli::{CallArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(manager: &Manager, args: CallArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let params: Vec<Value> = args.params.iter().map(|p| util::parse_param(p)).collect();

    manager.connect_realtime().await?;
    tracing::debug!(method = %args.method, params = params.len(), "calling");
    let result = manager.ddp().call_value(&args.method, params).await?;

    // No table view for arbitrary results; strings print bare in plain mode.
    let format = match global.output {
        OutputFormat::Table => OutputFormat::Json,
        other => other,
    };
    let out = output::render_single(format, &result, |_| String::new(), |v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
