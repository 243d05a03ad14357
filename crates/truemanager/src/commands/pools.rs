//! Pool and dataset command handlers.

use tabled::Tabled;

use truemanager_api::types::{Dataset, Pool, PropertyValue, ScrubAction};
use truemanager_core::Manager;

use crate::cli::{GlobalOpts, PoolsArgs, PoolsCommand, ScrubArg};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Healthy")]
    healthy: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Free")]
    free: String,
    #[tabled(rename = "Used")]
    used: String,
}

impl PoolRow {
    fn new(p: &Pool, color: bool) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            status: output::paint_pool_status(p.status, color),
            healthy: output::yes_no(p.healthy),
            size: output::bytes(p.size),
            free: output::bytes(p.free),
            used: output::percent(p.usage_percent()),
        }
    }
}

#[derive(Tabled)]
struct DatasetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Mountpoint")]
    mountpoint: String,
}

impl From<&Dataset> for DatasetRow {
    fn from(d: &Dataset) -> Self {
        Self {
            name: d.name.clone(),
            kind: d.dataset_type.clone(),
            used: output::bytes(d.used.as_ref().and_then(PropertyValue::as_u64)),
            available: output::bytes(d.available.as_ref().and_then(PropertyValue::as_u64)),
            mountpoint: d.mountpoint.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(manager: &Manager, args: PoolsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    match args.command {
        PoolsCommand::List => {
            let pools = manager.rest().list_pools().await?;
            let out = output::render_list(
                global.output,
                &pools,
                |p| PoolRow::new(p, color),
                |p| p.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoolsCommand::Get { pool } => {
            let pool = util::resolve_pool(manager, &pool).await?;
            let out = output::render_single(
                global.output,
                &pool,
                |p| detail(p, color),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoolsCommand::Scrub { pool, action } => {
            let pool = util::resolve_pool(manager, &pool).await?;
            let action = match action {
                ScrubArg::Start => ScrubAction::Start,
                ScrubArg::Stop => ScrubAction::Stop,
                ScrubArg::Pause => ScrubAction::Pause,
            };
            let job = manager.rest().scrub_pool(pool.id, action).await?;
            output::notice(
                &format!("Scrub {action} requested for '{}' (job {job})", pool.name),
                global.quiet,
            );
            Ok(())
        }

        PoolsCommand::Datasets => {
            let datasets = manager.rest().list_datasets().await?;
            let out = output::render_list(
                global.output,
                &datasets,
                |d| DatasetRow::from(d),
                |d| d.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn detail(p: &Pool, color: bool) -> String {
    let mut pairs = vec![
        ("ID", p.id.to_string()),
        ("Name", p.name.clone()),
        ("Status", output::paint_pool_status(p.status, color)),
        ("Healthy", output::yes_no(p.healthy)),
        ("Path", p.path.clone()),
        ("Size", output::bytes(p.size)),
        ("Allocated", output::bytes(p.allocated)),
        ("Free", output::bytes(p.free)),
        ("Used", output::percent(p.usage_percent())),
    ];
    if let Some(ref detail) = p.status_detail {
        pairs.push(("Detail", detail.clone()));
    }
    if let Some(ref scan) = p.scan {
        let function = scan.function.as_deref().unwrap_or("scan");
        let state = scan.state.as_deref().unwrap_or("-");
        pairs.push(("Last scan", format!("{function} {state}")));
        pairs.push(("Scan progress", output::percent(scan.percentage)));
        pairs.push(("Scan finished", output::timestamp(scan.end_time.as_ref())));
        pairs.push((
            "Scan errors",
            scan.errors.map_or_else(|| "-".into(), |e| e.to_string()),
        ));
    }
    output::render_pairs(&pairs)
}
