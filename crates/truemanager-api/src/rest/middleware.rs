// Middleware core endpoints

use serde::de::IgnoredAny;

use super::client::RestClient;
use super::types::{Job, JobId};
use crate::error::Error;

impl RestClient {
    /// Liveness check; the server answers `"pong"`.
    pub async fn ping(&self) -> Result<String, Error> {
        self.get("core/ping").await
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>, Error> {
        self.get("core/get_jobs").await
    }

    pub async fn abort_job(&self, id: JobId) -> Result<(), Error> {
        self.post::<IgnoredAny, _>("core/job_abort", &id).await?;
        Ok(())
    }
}
