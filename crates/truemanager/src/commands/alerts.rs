//! Alert command handlers.

use tabled::Tabled;

use truemanager_api::types::{Alert, AlertLevel};
use truemanager_core::Manager;

use crate::cli::{AlertsArgs, AlertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Class")]
    klass: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Dismissed")]
    dismissed: String,
}

impl AlertRow {
    fn new(a: &Alert, color: bool) -> Self {
        Self {
            uuid: a.uuid.clone(),
            time: output::timestamp(Some(&a.datetime)),
            level: output::paint_level(a.level, color),
            klass: a.klass.clone(),
            message: a.message().trim().to_owned(),
            dismissed: output::yes_no(a.dismissed),
        }
    }
}

#[derive(Clone, Tabled, serde::Serialize)]
struct ClassRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Level")]
    level: AlertLevel,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(manager: &Manager, args: AlertsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let rest = manager.rest();
    match args.command {
        AlertsCommand::List { all, level } => {
            let min_level = level
                .as_deref()
                .map(str::parse::<AlertLevel>)
                .transpose()
                .map_err(|_| CliError::Validation {
                    field: "level".into(),
                    reason: "expected info, notice, warning, error, critical, alert, or emergency"
                        .into(),
                })?;

            let alerts = filter_alerts(rest.list_alerts().await?, all, min_level);
            let color = output::should_color(global.color);
            let out = output::render_list(
                global.output,
                &alerts,
                |a| AlertRow::new(a, color),
                |a| a.uuid.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AlertsCommand::Dismiss { uuid } => {
            rest.dismiss_alert(&uuid).await?;
            output::notice(&format!("Alert {uuid} dismissed"), global.quiet);
            Ok(())
        }

        AlertsCommand::Restore { uuid } => {
            rest.restore_alert(&uuid).await?;
            output::notice(&format!("Alert {uuid} restored"), global.quiet);
            Ok(())
        }

        AlertsCommand::Categories => {
            let rows: Vec<ClassRow> = rest
                .list_alert_categories()
                .await?
                .into_iter()
                .flat_map(|category| {
                    let title = category.title;
                    category.classes.into_iter().map(move |class| ClassRow {
                        category: title.clone(),
                        class: class.id,
                        title: class.title,
                        level: class.level,
                    })
                })
                .collect();
            let out = output::render_list(
                global.output,
                &rows,
                Clone::clone,
                |r| r.class.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AlertsCommand::Policies => {
            let policies = rest.list_alert_policies().await?;
            let out = output::render_single(
                global.output,
                &policies,
                |p| p.join("\n"),
                |p| p.join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

/// Drop dismissed alerts (unless `all`) and those below `min_level`.
/// Most severe first, newest first within a level.
fn filter_alerts(alerts: Vec<Alert>, all: bool, min_level: Option<AlertLevel>) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = alerts
        .into_iter()
        .filter(|a| all || !a.dismissed)
        .filter(|a| min_level.is_none_or(|min| a.level >= min))
        .collect();
    alerts.sort_by(|a, b| b.level.cmp(&a.level).then(b.datetime.cmp(&a.datetime)));
    alerts
}
