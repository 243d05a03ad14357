// Pool and dataset endpoints

use super::client::RestClient;
use super::types::{Dataset, JobId, Pool, ScrubAction, ScrubRequest};
use crate::error::Error;

impl RestClient {
    pub async fn list_pools(&self) -> Result<Vec<Pool>, Error> {
        self.get("pool").await
    }

    pub async fn get_pool(&self, id: u64) -> Result<Pool, Error> {
        self.get(&format!("pool/id/{id}")).await
    }

    /// Start, stop or pause a scrub. Returns the middleware job id.
    pub async fn scrub_pool(&self, id: u64, action: ScrubAction) -> Result<JobId, Error> {
        self.post(&format!("pool/id/{id}/scrub"), &ScrubRequest { action })
            .await
    }

    pub async fn list_datasets(&self) -> Result<Vec<Dataset>, Error> {
        self.get("pool/dataset").await
    }
}
