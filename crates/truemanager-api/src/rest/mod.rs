// TrueNAS v2.0 REST resources
//
// `client` owns the transport; each sibling module adds one resource
// group to `RestClient` as inherent methods.

mod alert;
mod api_key;
mod auth;
mod catalog;
pub mod client;
mod middleware;
mod pool;
mod reporting;
mod system;
pub mod types;

pub use client::RestClient;
