// Alert endpoints

use serde::de::IgnoredAny;

use super::client::RestClient;
use super::types::{Alert, AlertCategory, AlertPolicy};
use crate::error::Error;

impl RestClient {
    pub async fn list_alerts(&self) -> Result<Vec<Alert>, Error> {
        self.get("alert/list").await
    }

    /// Dismiss by alert uuid.
    pub async fn dismiss_alert(&self, uuid: &str) -> Result<(), Error> {
        self.post::<IgnoredAny, _>("alert/dismiss", uuid).await?;
        Ok(())
    }

    /// Undo a dismissal.
    pub async fn restore_alert(&self, uuid: &str) -> Result<(), Error> {
        self.post::<IgnoredAny, _>("alert/restore", uuid).await?;
        Ok(())
    }

    pub async fn list_alert_categories(&self) -> Result<Vec<AlertCategory>, Error> {
        self.get("alert/list_categories").await
    }

    pub async fn list_alert_policies(&self) -> Result<Vec<AlertPolicy>, Error> {
        self.get("alert/list_policies").await
    }
}
