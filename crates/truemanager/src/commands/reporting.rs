//! Reporting command handlers.

use chrono::DateTime;
use tabled::Tabled;
use tabled::builder::Builder;
use tabled::settings::Style;

use truemanager_api::types::{GraphData, GraphQuery, ReportingGraph, ReportingQuery, ReportingUnit};
use truemanager_core::Manager;

use crate::cli::{GlobalOpts, OutputFormat, ReportingArgs, ReportingCommand, UnitArg};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct GraphRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Instances")]
    identifiers: String,
}

impl From<&ReportingGraph> for GraphRow {
    fn from(g: &ReportingGraph) -> Self {
        Self {
            name: g.name.clone(),
            title: g.title.clone(),
            identifiers: g
                .identifiers
                .as_ref()
                .map_or_else(|| "-".into(), |ids| ids.join(", ")),
        }
    }
}

pub async fn handle(
    manager: &Manager,
    args: ReportingArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ReportingCommand::Graphs => {
            let graphs = manager.rest().list_graphs().await?;
            let out = output::render_list(global.output, &graphs, |g| GraphRow::from(g), |g| {
                g.name.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ReportingCommand::Data {
            graph,
            identifier,
            unit,
        } => {
            let unit = match unit {
                UnitArg::Hour => ReportingUnit::Hour,
                UnitArg::Day => ReportingUnit::Day,
                UnitArg::Week => ReportingUnit::Week,
                UnitArg::Month => ReportingUnit::Month,
                UnitArg::Year => ReportingUnit::Year,
            };
            let data = manager
                .rest()
                .graph_data(&[GraphQuery::new(graph, identifier)], &ReportingQuery::last(unit))
                .await?;

            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => data
                    .iter()
                    .map(|series| render_series(series, global.output == OutputFormat::Plain))
                    .collect::<Vec<_>>()
                    .join("\n\n"),
                _ => output::render_single(global.output, &data, |_| String::new(), |_| {
                    String::new()
                })?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

/// One row per sample. The first legend entry is the sample time.
fn render_series(series: &GraphData, plain: bool) -> String {
    let rows = series.data.iter().map(|row| {
        row.iter()
            .enumerate()
            .map(|(i, cell)| match (i, cell) {
                (0, Some(t)) => format_time(*t),
                (_, Some(v)) => format!("{v:.2}"),
                (_, None) => "-".into(),
            })
            .collect::<Vec<_>>()
    });

    if plain {
        return rows.map(|r| r.join("\t")).collect::<Vec<_>>().join("\n");
    }

    let mut builder = Builder::default();
    builder.push_record(series.legend.iter().cloned());
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::rounded());

    let title = match &series.identifier {
        Some(id) => format!("{} ({id})", series.name),
        None => series.name.clone(),
    };
    format!("{title}\n{table}")
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn format_time(epoch_secs: f64) -> String {
    DateTime::from_timestamp(epoch_secs as i64, 0).map_or_else(
        || format!("{epoch_secs}"),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
