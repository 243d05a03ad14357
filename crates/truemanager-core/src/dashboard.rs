// ── Dashboard summary ──
//
// One round of REST calls condensed into the overview a user sees
// first: who the box is, how loaded it is, whether pools are healthy,
// and how many alerts need attention.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use truemanager_api::RestClient;
use truemanager_api::types::{Alert, AlertLevel, Pool, PoolStatus};

use crate::error::CoreError;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub hostname: String,
    pub version: String,
    pub model: String,
    pub cores: u32,
    pub uptime_seconds: f64,
    /// 1, 5 and 15 minute load averages.
    pub load_average: Vec<f64>,
    pub memory_total: u64,
    pub pools: Vec<PoolSummary>,
    pub alerts: AlertCounts,
}

impl DashboardSummary {
    /// `true` when every pool is healthy and nothing above WARNING is active.
    pub fn is_healthy(&self) -> bool {
        self.pools.iter().all(|p| p.healthy)
            && self.alerts.worst().is_none_or(|level| level <= AlertLevel::Warning)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    pub id: u64,
    pub name: String,
    pub status: PoolStatus,
    pub healthy: bool,
    pub size: Option<u64>,
    pub allocated: Option<u64>,
    pub usage_percent: Option<f64>,
}

impl From<&Pool> for PoolSummary {
    fn from(pool: &Pool) -> Self {
        Self {
            id: pool.id,
            name: pool.name.clone(),
            status: pool.status,
            healthy: pool.healthy,
            size: pool.size,
            allocated: pool.allocated,
            usage_percent: pool.usage_percent(),
        }
    }
}

/// Active (non-dismissed) alerts per severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub by_level: BTreeMap<AlertLevel, usize>,
    pub active: usize,
    pub dismissed: usize,
}

impl AlertCounts {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let mut counts = Self::default();
        for alert in alerts {
            if alert.dismissed {
                counts.dismissed += 1;
            } else {
                counts.active += 1;
                *counts.by_level.entry(alert.level).or_default() += 1;
            }
        }
        counts
    }

    pub fn count(&self, level: AlertLevel) -> usize {
        self.by_level.get(&level).copied().unwrap_or(0)
    }

    /// Highest severity among active alerts.
    pub fn worst(&self) -> Option<AlertLevel> {
        self.by_level.keys().next_back().copied()
    }
}

/// Fetch system info, pools and alerts concurrently and summarize them.
pub async fn load_summary(rest: &RestClient) -> Result<DashboardSummary, CoreError> {
    let (info, pools, alerts) =
        tokio::try_join!(rest.system_info(), rest.list_pools(), rest.list_alerts())?;
    debug!(
        pools = pools.len(),
        alerts = alerts.len(),
        "dashboard data loaded"
    );

    Ok(DashboardSummary {
        hostname: info.hostname,
        version: info.version,
        model: info.model,
        cores: info.cores,
        uptime_seconds: info.uptime_seconds,
        load_average: info.loadavg,
        memory_total: info.physmem,
        pools: pools.iter().map(PoolSummary::from).collect(),
        alerts: AlertCounts::from_alerts(&alerts),
    })
}
