// truemanager-api: Async Rust client for the TrueNAS REST (v2.0) and WebSocket/DDP APIs

pub mod ddp;
pub mod error;
pub mod rest;
pub mod session;
pub mod transport;
pub mod websocket;

pub use error::{Error, HttpNotOk, StatusOutOfRange};
pub use rest::RestClient;
pub use rest::types;
pub use session::{ApiState, Authorization, Session, normalize_server_address};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{
    ChangeKind, CollectionEvent, ConnectionState, DdpClient, DdpConfig, Subscription,
};
