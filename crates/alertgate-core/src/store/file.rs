//! JSON file configuration store
//!
//! One file per organization (`org-<id>.json`), replaced atomically through a
//! temporary file and a rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{ConfigStore, SaveConfigurationCmd};
use crate::error::{Error, Result};

/// Stores the last applied configuration of each organization on disk
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    dir: PathBuf,
}

impl FileConfigStore {
    /// Create a store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the configuration files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, org_id: i64) -> PathBuf {
        self.dir.join(format!("org-{org_id}.json"))
    }

    /// Load the last saved configuration of an organization
    pub async fn load(&self, org_id: i64) -> Result<Option<SaveConfigurationCmd>> {
        let path = self.path_for(org_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::storage(format!("reading {}: {e}", path.display())));
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::serialization(format!("decoding {}", path.display()), e))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn save_alertmanager_configuration(&self, cmd: &SaveConfigurationCmd) -> Result<()> {
        let path = self.path_for(cmd.org_id);
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(cmd)
            .map_err(|e| Error::serialization("encoding stored configuration", e))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::storage(format!("creating {}: {e}", self.dir.display())))?;
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| Error::storage(format!("writing {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::storage(format!("replacing {}: {e}", path.display())))?;

        debug!(org_id = cmd.org_id, path = %path.display(), "Saved Alertmanager configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cmd(org_id: i64) -> SaveConfigurationCmd {
        SaveConfigurationCmd {
            org_id,
            alertmanager_configuration: r#"{"template_files":{}}"#.to_string(),
            configuration_version: "v1".to_string(),
            last_applied: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("nested"));

        store.save_alertmanager_configuration(&cmd(3)).await.unwrap();

        assert_eq!(store.load(3).await.unwrap(), Some(cmd(3)));
        assert!(!dir.path().join("nested/org-3.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_missing_org() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path());
        assert_eq!(store.load(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = FileConfigStore::new(blocker.join("configs"));
        let err = store.save_alertmanager_configuration(&cmd(1)).await.unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
    }
}
