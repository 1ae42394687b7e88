//! Twingate API module
//!
//! GraphQL client for listing and creating Remote Networks and Resources,
//! plus the record and operation types the import engine works with.

pub mod client;
pub mod config;
pub mod models;
pub mod operation;

pub use client::TwingateClient;
pub use config::ClientConfig;
pub use models::{LiveSnapshot, RemoteNetworkRecord, ResourceRecord};
pub use operation::CreateOperation;
