//! System command handlers.

use truemanager_api::types::SystemInfo;
use truemanager_core::Manager;

use crate::cli::{GlobalOpts, SystemArgs, SystemCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(manager: &Manager, args: SystemArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let rest = manager.rest();
    match args.command {
        SystemCommand::Info => {
            let info = rest.system_info().await?;
            let out = output::render_single(global.output, &info, detail, |i| i.hostname.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SystemCommand::Version => {
            let version = rest.system_version().await?;
            let out = output::render_single(global.output, &version, Clone::clone, Clone::clone)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SystemCommand::State => {
            let state = rest.system_state().await?;
            let out = output::render_single(
                global.output,
                &state,
                ToString::to_string,
                ToString::to_string,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SystemCommand::Reboot { delay } => {
            if !util::confirm("Reboot the server?", global.yes)? {
                return Ok(());
            }
            let job = rest.reboot(delay).await?;
            output::notice(&format!("Reboot initiated (job {job})"), global.quiet);
            Ok(())
        }

        SystemCommand::Shutdown { delay } => {
            if !util::confirm(
                "Power off the server? It cannot be started again remotely.",
                global.yes,
            )? {
                return Ok(());
            }
            let job = rest.shutdown(delay).await?;
            output::notice(&format!("Shutdown initiated (job {job})"), global.quiet);
            Ok(())
        }
    }
}

fn detail(i: &SystemInfo) -> String {
    let product = [
        i.system_manufacturer.as_deref(),
        i.system_product.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    output::render_pairs(&[
        ("Hostname", i.hostname.clone()),
        ("Version", i.version.clone()),
        ("Product", if product.is_empty() { "-".into() } else { product }),
        ("Serial", i.system_serial.clone().unwrap_or_else(|| "-".into())),
        ("CPU", format!("{} ({} cores)", i.model, i.cores)),
        ("Memory", output::bytes(Some(i.physmem))),
        ("ECC", output::yes_no(i.ecc_memory)),
        ("Uptime", output::uptime(i.uptime_seconds)),
        ("Booted", output::timestamp(i.boottime.as_ref())),
        ("Timezone", i.timezone.clone()),
    ])
}
