//! Local configuration storage
//!
//! The gateway keeps a copy of every configuration it applies remotely so the
//! organization can fall back to it. Persistence itself belongs to the host;
//! the gateway only talks to the [`ConfigStore`] trait.

mod file;
mod memory;

pub use file::FileConfigStore;
pub use memory::InMemoryConfigStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Version tag stamped on every persisted configuration
pub const CONFIGURATION_VERSION: &str = "v1";

/// Command persisting an applied configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfigurationCmd {
    /// Organization the configuration belongs to
    pub org_id: i64,
    /// Serialized configuration document
    pub alertmanager_configuration: String,
    /// Version tag of the configuration format
    pub configuration_version: String,
    /// When the configuration was applied, as UTC unix seconds
    pub last_applied: i64,
}

/// Persistence sink for applied configurations
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Save a configuration, failing with [`crate::Error::Storage`] on write failure
    async fn save_alertmanager_configuration(&self, cmd: &SaveConfigurationCmd) -> Result<()>;
}
