//! # AlertGate
//!
//! Gateway to an externally hosted, multi-tenant Alertmanager.
//!
//! AlertGate lets an alerting host delegate notification routing to a remote
//! Alertmanager (Mimir, Cortex) instead of running one in-process.
//!
//! ## Architecture
//!
//! - **Transport**: tenant header and optional basic auth on every request
//! - **Readiness**: one probe, then a bounded wait for a delivery target
//! - **Sync**: configuration push/pull, persisted through a [`store::ConfigStore`]
//! - **Relay**: silences and alert reads, fault isolated
//! - **Dispatcher**: queued, fire-and-forget alert delivery
//!
//! ## Quick Start
//!
//! ```bash
//! # Wait until the remote Alertmanager is ready
//! alertgate --config alertgate.toml ready
//!
//! # Push a configuration document
//! alertgate config push alertmanager.json
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cancel;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod models;
pub mod store;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::RemoteAlertmanager;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::cancel::CancellationToken;
    pub use crate::config::{Config, RemoteAlertmanagerConfig};
    pub use crate::error::{Error, Result};
    pub use crate::gateway::RemoteAlertmanager;
    pub use crate::models::*;
    pub use crate::store::{ConfigStore, FileConfigStore, InMemoryConfigStore};
}
