//! Job command handlers.

use tabled::Tabled;

use truemanager_api::types::Job;
use truemanager_core::Manager;

use crate::cli::{GlobalOpts, JobsArgs, JobsCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Started")]
    started: String,
}

impl From<&Job> for JobRow {
    fn from(j: &Job) -> Self {
        let progress = j.progress.as_ref().map_or_else(
            || "-".into(),
            |p| {
                let pct = output::percent(p.percent);
                match p.description.as_deref() {
                    Some(d) if !d.is_empty() => format!("{pct} {d}"),
                    _ => pct,
                }
            },
        );
        Self {
            id: j.id,
            method: j.method.clone(),
            state: j.state.to_string(),
            progress,
            started: output::timestamp(j.time_started.as_ref()),
        }
    }
}

pub async fn handle(manager: &Manager, args: JobsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        JobsCommand::List { active } => {
            let mut jobs = manager.rest().list_jobs().await?;
            if active {
                jobs.retain(|j| !j.state.is_finished());
            }
            jobs.sort_by_key(|j| std::cmp::Reverse(j.id));
            let out = output::render_list(global.output, &jobs, |j| JobRow::from(j), |j| j.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        JobsCommand::Abort { id } => {
            manager.rest().abort_job(id).await?;
            output::notice(&format!("Job {id} aborted"), global.quiet);
            Ok(())
        }
    }
}
