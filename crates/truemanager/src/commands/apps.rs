//! App catalog command handlers.

use serde::Serialize;
use tabled::Tabled;

use truemanager_api::types::{Catalog, CatalogItems, CatalogItemsQuery};
use truemanager_core::Manager;

use crate::cli::{AppsArgs, AppsCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Repository")]
    repository: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "Trains")]
    trains: String,
}

impl From<&Catalog> for CatalogRow {
    fn from(c: &Catalog) -> Self {
        Self {
            label: c.label.clone(),
            repository: c.repository.clone(),
            branch: c.branch.clone(),
            trains: c.preferred_trains.join(", "),
        }
    }
}

#[derive(Clone, Serialize, Tabled)]
struct AppRow {
    #[tabled(rename = "Train")]
    train: String,
    #[tabled(rename = "App")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Healthy")]
    healthy: String,
    #[tabled(rename = "Categories")]
    categories: String,
}

/// Flatten train → app into rows, sorted by train then app name.
fn app_rows(items: &CatalogItems) -> Vec<AppRow> {
    items
        .iter()
        .flat_map(|(train, apps)| {
            apps.values().map(move |item| AppRow {
                train: train.clone(),
                name: item.name.clone(),
                version: item
                    .latest_app_version
                    .clone()
                    .or_else(|| item.latest_version.clone())
                    .unwrap_or_else(|| "-".into()),
                healthy: output::yes_no(item.healthy),
                categories: item.categories.join(", "),
            })
        })
        .collect()
}

pub async fn handle(manager: &Manager, args: AppsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AppsCommand::Catalogs => {
            let catalogs = manager.rest().list_catalogs().await?;
            let out = output::render_list(global.output, &catalogs, |c| CatalogRow::from(c), |c| {
                c.label.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Available {
            label,
            train,
            cached,
        } => {
            let mut query = CatalogItemsQuery::new(label);
            query.options.cache_only = cached;
            if let Some(train) = train {
                query.options.retrieve_all_trains = false;
                query.options.trains = vec![train];
            }

            let items = manager.rest().catalog_items(&query).await?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => {
                    output::render_list(global.output, &app_rows(&items), Clone::clone, |r| {
                        r.name.clone()
                    })?
                }
                _ => output::render_single(global.output, &items, |_| String::new(), |_| {
                    String::new()
                })?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Sync => {
            let job = manager.rest().sync_catalog().await?;
            output::notice(&format!("Catalog sync started (job {job})"), global.quiet);
            Ok(())
        }
    }
}
