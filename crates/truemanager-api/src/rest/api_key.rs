// API key endpoints

use serde::de::IgnoredAny;

use super::client::RestClient;
use super::types::{ApiKey, ApiKeyCreate, ApiKeyUpdate};
use crate::error::Error;

impl RestClient {
    pub async fn list_api_keys(&self) -> Result<Vec<ApiKey>, Error> {
        self.get("api_key").await
    }

    /// Create a key. The returned [`ApiKey::key`] is the only time the
    /// secret is visible.
    pub async fn create_api_key(&self, request: &ApiKeyCreate) -> Result<ApiKey, Error> {
        self.post("api_key", request).await
    }

    pub async fn update_api_key(&self, id: u64, update: &ApiKeyUpdate) -> Result<ApiKey, Error> {
        self.put(&format!("api_key/id/{id}"), update).await
    }

    pub async fn delete_api_key(&self, id: u64) -> Result<(), Error> {
        self.delete::<IgnoredAny>(&format!("api_key/id/{id}")).await?;
        Ok(())
    }
}
