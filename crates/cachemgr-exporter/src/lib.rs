//! cachemgr exporter library entry.
//!
//! This crate wires configuration, the cache manager client, self-metrics,
//! and the HTTP surface into one service. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod client;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
