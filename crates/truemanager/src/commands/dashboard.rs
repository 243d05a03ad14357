//! Dashboard command handler.

use tabled::Tabled;

use truemanager_core::{DashboardSummary, Manager, PoolSummary, load_summary};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "Pool")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Healthy")]
    healthy: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Used")]
    used: String,
}

impl PoolRow {
    fn new(p: &PoolSummary, color: bool) -> Self {
        Self {
            name: p.name.clone(),
            status: output::paint_pool_status(p.status, color),
            healthy: output::yes_no(p.healthy),
            size: output::bytes(p.size),
            used: output::percent(p.usage_percent),
        }
    }
}

pub async fn handle(manager: &Manager, global: &GlobalOpts) -> Result<(), CliError> {
    let summary = load_summary(manager.rest()).await?;
    let color = output::should_color(global.color);

    let out = output::render_single(
        global.output,
        &summary,
        |s| detail(s, color),
        |s| (if s.is_healthy() { "healthy" } else { "unhealthy" }).to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(s: &DashboardSummary, color: bool) -> String {
    let load = s
        .load_average
        .iter()
        .map(|l| format!("{l:.2}"))
        .collect::<Vec<_>>()
        .join(" ");

    let alerts = if s.alerts.active == 0 {
        "none".to_owned()
    } else {
        s.alerts
            .by_level
            .iter()
            .rev()
            .map(|(level, n)| format!("{n} {}", output::paint_level(*level, color)))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut text = output::render_pairs(&[
        ("Hostname", s.hostname.clone()),
        ("Version", s.version.clone()),
        ("Model", format!("{} ({} cores)", s.model, s.cores)),
        ("Memory", output::bytes(Some(s.memory_total))),
        ("Uptime", output::uptime(s.uptime_seconds)),
        ("Load", load),
        ("Alerts", alerts),
    ]);

    if !s.pools.is_empty() {
        let rows: Vec<PoolRow> = s.pools.iter().map(|p| PoolRow::new(p, color)).collect();
        text.push_str("\n\n");
        text.push_str(&tabled::Table::new(rows).with(tabled::settings::Style::rounded()).to_string());
    }
    text
}
