// REST response and request types
//
// Models for the TrueNAS v2.0 REST API. Fields use `#[serde(default)]`
// liberally because the middleware drops or nulls keys across releases.
// Types that are only partially modelled keep the rest in `extra`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ── Timestamps ───────────────────────────────────────────────────────

/// Timestamp as the middleware encodes it: `{"$date": <epoch millis>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiTimestamp(pub DateTime<Utc>);

#[derive(Serialize, Deserialize)]
struct DateEnvelope {
    #[serde(rename = "$date")]
    millis: i64,
}

impl<'de> Deserialize<'de> for ApiTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let DateEnvelope { millis } = DateEnvelope::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}")))
    }
}

impl Serialize for ApiTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DateEnvelope {
            millis: self.0.timestamp_millis(),
        }
        .serialize(serializer)
    }
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct CheckPasswordRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of `auth/generate_token`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateTokenRequest {
    /// Token lifetime in seconds; the server default (600) when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    pub attrs: serde_json::Map<String, Value>,
    pub match_origin: bool,
}

impl Default for GenerateTokenRequest {
    fn default() -> Self {
        Self {
            ttl: None,
            attrs: serde_json::Map::new(),
            match_origin: false,
        }
    }
}

/// The authenticated account, from `auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthMe {
    pub pw_name: String,
    pub pw_uid: u32,
    pub pw_gid: u32,
    #[serde(default)]
    pub pw_gecos: Option<String>,
    #[serde(default)]
    pub pw_dir: Option<String>,
    #[serde(default)]
    pub pw_shell: Option<String>,
    #[serde(default)]
    pub local: Option<bool>,
    #[serde(default)]
    pub attributes: Value,
}

// ── System ───────────────────────────────────────────────────────────

/// `system/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub version: String,
    pub hostname: String,
    /// Physical memory in bytes.
    pub physmem: u64,
    pub model: String,
    pub cores: u32,
    #[serde(default)]
    pub physical_cores: Option<u32>,
    /// 1, 5 and 15 minute load averages.
    #[serde(default)]
    pub loadavg: Vec<f64>,
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub uptime_seconds: f64,
    #[serde(default)]
    pub system_serial: Option<String>,
    #[serde(default)]
    pub system_product: Option<String>,
    #[serde(default)]
    pub system_product_version: Option<String>,
    #[serde(default)]
    pub system_manufacturer: Option<String>,
    #[serde(default)]
    pub license: Option<Value>,
    #[serde(default)]
    pub buildtime: Option<ApiTimestamp>,
    #[serde(default)]
    pub boottime: Option<ApiTimestamp>,
    #[serde(default)]
    pub datetime: Option<ApiTimestamp>,
    #[serde(default)]
    pub birthday: Option<ApiTimestamp>,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub ecc_memory: bool,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemState {
    Booting,
    Ready,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub(crate) struct PowerRequest {
    /// Seconds to wait before acting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

// ── Pool ─────────────────────────────────────────────────────────────

/// ZFS pool from `pool` / `pool/id/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub path: String,
    pub status: PoolStatus,
    #[serde(default)]
    pub healthy: bool,
    #[serde(default)]
    pub warning: bool,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub allocated: Option<u64>,
    #[serde(default)]
    pub free: Option<u64>,
    #[serde(default)]
    pub freeing: Option<u64>,
    #[serde(default)]
    pub fragmentation: Option<String>,
    #[serde(default)]
    pub scan: Option<PoolScan>,
    /// vdev layout; deeply nested and rarely needed, kept raw.
    #[serde(default)]
    pub topology: Option<Value>,
    #[serde(default)]
    pub is_upgraded: Option<bool>,
}

impl Pool {
    /// Allocated share of capacity, 0-100.
    pub fn usage_percent(&self) -> Option<f64> {
        match (self.allocated, self.size) {
            #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
            (Some(used), Some(size)) if size > 0 => Some(used as f64 / size as f64 * 100.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PoolStatus {
    Online,
    Degraded,
    Faulted,
    Offline,
    Unavail,
    Removed,
    #[serde(other)]
    Unknown,
}

/// Last (or running) scrub/resilver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolScan {
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub start_time: Option<ApiTimestamp>,
    #[serde(default)]
    pub end_time: Option<ApiTimestamp>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub bytes_to_process: Option<u64>,
    #[serde(default)]
    pub bytes_processed: Option<u64>,
    #[serde(default)]
    pub errors: Option<u64>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ScrubAction {
    Start,
    Stop,
    Pause,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScrubRequest {
    pub action: ScrubAction,
}

/// ZFS dataset from `pool/dataset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub pool: String,
    #[serde(rename = "type")]
    pub dataset_type: String,
    #[serde(default)]
    pub mountpoint: Option<String>,
    #[serde(default)]
    pub used: Option<PropertyValue>,
    #[serde(default)]
    pub available: Option<PropertyValue>,
    #[serde(default)]
    pub children: Vec<Dataset>,
}

/// ZFS property as the middleware reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyValue {
    #[serde(default)]
    pub parsed: Option<Value>,
    #[serde(default)]
    pub rawvalue: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl PropertyValue {
    /// Numeric value in bytes (or whatever unit the property uses).
    pub fn as_u64(&self) -> Option<u64> {
        self.parsed
            .as_ref()
            .and_then(Value::as_u64)
            .or_else(|| self.rawvalue.as_deref().and_then(|raw| raw.parse().ok()))
    }
}

// ── Reporting ────────────────────────────────────────────────────────

/// Graph definition from `reporting/netdata_graphs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingGraph {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub vertical_label: Option<String>,
    /// Instances of this graph (disks, interfaces, ...); `None` for singletons.
    #[serde(default)]
    pub identifiers: Option<Vec<String>>,
}

/// One graph to fetch data for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQuery {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl GraphQuery {
    pub fn new(name: impl Into<String>, identifier: Option<String>) -> Self {
        Self {
            name: name.into(),
            identifier,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ReportingUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Time window for `reporting/netdata_get_data`. Either `unit` (+ `page`)
/// or explicit `start`/`end` epoch seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<ReportingUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default)]
    pub aggregate: bool,
}

impl ReportingQuery {
    pub fn last(unit: ReportingUnit) -> Self {
        Self {
            unit: Some(unit),
            page: Some(1),
            aggregate: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GraphDataRequest<'a> {
    pub graphs: &'a [GraphQuery],
    pub reporting_query: &'a ReportingQuery,
}

/// Series for one graph. `data` rows line up with `legend`; the first
/// column is the sample time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    pub name: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub data: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    #[serde(default)]
    pub legend: Vec<String>,
    #[serde(default)]
    pub aggregations: Option<Value>,
}

// ── Alert ────────────────────────────────────────────────────────────

/// Alert from `alert/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub uuid: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: String,
    pub klass: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub datetime: ApiTimestamp,
    #[serde(default)]
    pub last_occurrence: Option<ApiTimestamp>,
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default)]
    pub mail: Option<Value>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub formatted: Option<String>,
    pub level: AlertLevel,
    #[serde(default)]
    pub one_shot: bool,
}

impl Alert {
    /// The rendered message, falling back to the raw template.
    pub fn message(&self) -> &str {
        self.formatted.as_deref().unwrap_or(&self.text)
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AlertLevel {
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

/// `alert/list_categories` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertCategory {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub classes: Vec<AlertClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertClass {
    pub id: String,
    pub title: String,
    pub level: AlertLevel,
    #[serde(default)]
    pub proactive_support: bool,
}

/// Delivery policy name (`IMMEDIATELY`, `HOURLY`, `DAILY`, `NEVER`).
pub type AlertPolicy = String;

// ── Catalog ──────────────────────────────────────────────────────────

/// Application catalog from `catalog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub builtin: bool,
    #[serde(default)]
    pub preferred_trains: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Body of `catalog/items`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItemsQuery {
    pub label: String,
    pub options: CatalogItemsOptions,
}

impl CatalogItemsQuery {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            options: CatalogItemsOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogItemsOptions {
    pub cache: bool,
    pub cache_only: bool,
    pub retrieve_all_trains: bool,
    /// Only consulted when `retrieve_all_trains` is false.
    pub trains: Vec<String>,
}

impl Default for CatalogItemsOptions {
    fn default() -> Self {
        Self {
            cache: true,
            cache_only: false,
            retrieve_all_trains: true,
            trains: Vec::new(),
        }
    }
}

/// Train name → application name → item.
pub type CatalogItems = BTreeMap<String, BTreeMap<String, CatalogItem>>;

/// One installable application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub healthy: bool,
    #[serde(default)]
    pub healthy_error: Option<String>,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub latest_app_version: Option<String>,
    #[serde(default)]
    pub latest_human_version: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── API keys ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<ApiTimestamp>,
    /// Only present in the response that created or reset the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub allowlist: Vec<AllowListEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListEntry {
    pub method: String,
    pub resource: String,
}

impl AllowListEntry {
    /// Every method on every resource.
    pub fn any() -> Self {
        Self {
            method: "*".into(),
            resource: "*".into(),
        }
    }
}

/// Body of `POST api_key`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyCreate {
    pub name: String,
    pub allowlist: Vec<AllowListEntry>,
}

impl ApiKeyCreate {
    pub fn full_access(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowlist: vec![AllowListEntry::any()],
        }
    }
}

/// Body of `PUT api_key/id/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiKeyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Regenerate the key; the new value is returned once.
    pub reset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowlist: Option<Vec<AllowListEntry>>,
}

// ── Core ─────────────────────────────────────────────────────────────

/// Middleware job from `core/get_jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default)]
    pub progress: Option<JobProgress>,
    pub state: JobState,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub time_started: Option<ApiTimestamp>,
    #[serde(default)]
    pub time_finished: Option<ApiTimestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum JobState {
    Waiting,
    Running,
    Success,
    Failed,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl JobState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Aborted)
    }
}

/// Middleware job id returned by long-running actions.
pub type JobId = u64;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn timestamp_from_date_envelope() {
        let ts: ApiTimestamp = serde_json::from_value(json!({ "$date": 1_700_000_000_000_i64 })).unwrap();
        assert_eq!(ts.0.timestamp(), 1_700_000_000);
        assert_eq!(
            serde_json::to_value(ts).unwrap(),
            json!({ "$date": 1_700_000_000_000_i64 })
        );
    }

    #[test]
    fn alert_levels_are_ordered() {
        assert!(AlertLevel::Critical > AlertLevel::Warning);
        assert!(AlertLevel::Info < AlertLevel::Notice);
        assert_eq!("warning".parse::<AlertLevel>().unwrap(), AlertLevel::Warning);
    }

    #[test]
    fn unknown_pool_status_does_not_fail() {
        let pool: Pool = serde_json::from_value(json!({
            "id": 1,
            "name": "tank",
            "status": "SOMETHING_NEW",
            "healthy": false
        }))
        .unwrap();
        assert_eq!(pool.status, PoolStatus::Unknown);
        assert!(pool.usage_percent().is_none());
    }

    #[test]
    fn pool_usage_percent() {
        let pool: Pool = serde_json::from_value(json!({
            "id": 1,
            "name": "tank",
            "status": "ONLINE",
            "healthy": true,
            "size": 1000,
            "allocated": 250,
            "free": 750
        }))
        .unwrap();
        let pct = pool.usage_percent().unwrap();
        assert!((pct - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn property_value_falls_back_to_rawvalue() {
        let prop: PropertyValue =
            serde_json::from_value(json!({ "parsed": null, "rawvalue": "4096", "value": "4K" }))
                .unwrap();
        assert_eq!(prop.as_u64(), Some(4096));
    }

    #[test]
    fn reporting_query_skips_unset_fields() {
        let query = ReportingQuery::last(ReportingUnit::Hour);
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({ "unit": "HOUR", "page": 1, "aggregate": true })
        );
    }

    #[test]
    fn job_state_finished() {
        assert!(JobState::Success.is_finished());
        assert!(!JobState::Running.is_finished());
    }
}
