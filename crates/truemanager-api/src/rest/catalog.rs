// Application catalog endpoints

use super::client::RestClient;
use super::types::{Catalog, CatalogItems, CatalogItemsQuery, JobId};
use crate::error::Error;

impl RestClient {
    pub async fn list_catalogs(&self) -> Result<Vec<Catalog>, Error> {
        self.get("catalog").await
    }

    pub async fn catalog_items(&self, query: &CatalogItemsQuery) -> Result<CatalogItems, Error> {
        self.post("catalog/items", query).await
    }

    /// Pull the latest catalog. Returns the middleware job id.
    pub async fn sync_catalog(&self) -> Result<JobId, Error> {
        self.post_empty("catalog/sync").await
    }
}
