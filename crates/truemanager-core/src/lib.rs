// truemanager-core: Connection management and feature logic between truemanager-api and the CLI.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod manager;
pub mod realtime;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ConnectionConfig, TlsVerification};
pub use dashboard::{AlertCounts, DashboardSummary, PoolSummary, load_summary};
pub use error::CoreError;
pub use manager::Manager;
pub use realtime::{InterfaceRate, RealtimeStats};
pub use truemanager_api::ConnectionState;
