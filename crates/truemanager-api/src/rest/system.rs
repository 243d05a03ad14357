// System endpoints

use super::client::RestClient;
use super::types::{JobId, PowerRequest, SystemInfo, SystemState};
use crate::error::Error;

impl RestClient {
    pub async fn system_info(&self) -> Result<SystemInfo, Error> {
        self.get("system/info").await
    }

    /// Version string, e.g. `"TrueNAS-SCALE-24.04.2"`.
    pub async fn system_version(&self) -> Result<String, Error> {
        self.get("system/version").await
    }

    /// `true` once the middleware finished booting.
    pub async fn system_ready(&self) -> Result<bool, Error> {
        self.get("system/ready").await
    }

    pub async fn system_state(&self) -> Result<SystemState, Error> {
        self.get("system/state").await
    }

    /// Schedule a reboot. Returns the middleware job id.
    pub async fn reboot(&self, delay_secs: Option<u64>) -> Result<JobId, Error> {
        self.post("system/reboot", &PowerRequest { delay: delay_secs })
            .await
    }

    /// Schedule a shutdown. Returns the middleware job id.
    pub async fn shutdown(&self, delay_secs: Option<u64>) -> Result<JobId, Error> {
        self.post("system/shutdown", &PowerRequest { delay: delay_secs })
            .await
    }
}
