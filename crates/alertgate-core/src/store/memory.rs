//! In-memory configuration store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ConfigStore, SaveConfigurationCmd};
use crate::error::Result;

/// Keeps the latest configuration per organization in memory
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<i64, SaveConfigurationCmd>>,
}

impl InMemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest configuration saved for an organization
    pub fn get(&self, org_id: i64) -> Option<SaveConfigurationCmd> {
        self.configs.read().get(&org_id).cloned()
    }

    /// Number of organizations with a saved configuration
    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    /// Whether nothing has been saved yet
    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn save_alertmanager_configuration(&self, cmd: &SaveConfigurationCmd) -> Result<()> {
        self.configs.write().insert(cmd.org_id, cmd.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_save_wins() {
        let store = InMemoryConfigStore::new();
        for (config, applied) in [("{}", 1), ("{\"a\":1}", 2)] {
            store
                .save_alertmanager_configuration(&SaveConfigurationCmd {
                    org_id: 1,
                    alertmanager_configuration: config.to_string(),
                    configuration_version: "v1".to_string(),
                    last_applied: applied,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.len(), 1);
        let saved = store.get(1).unwrap();
        assert_eq!(saved.alertmanager_configuration, "{\"a\":1}");
        assert_eq!(saved.last_applied, 2);
        assert!(store.get(2).is_none());
    }
}
