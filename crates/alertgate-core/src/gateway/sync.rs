//! Configuration push/pull against the remote Alertmanager
//!
//! The structured configuration travels JSON-encoded as a string inside the
//! envelope, so both directions encode/decode twice:
//!
//! ```text
//! POST  {"template_files": {...}, "grafana_alertmanager_config": "<json>"}
//! GET   {"data": {"template_files": {...}, "grafana_alertmanager_config": "<json>"}}
//! ```

use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{PostableApiAlertingConfig, PostableUserConfig, TemplateFiles};
use crate::store::{ConfigStore, SaveConfigurationCmd, CONFIGURATION_VERSION};
use crate::transport::TenantTransport;

/// Path suffix removed from the base URL before appending the config endpoint
pub const ALERTMANAGER_PATH_SUFFIX: &str = "/alertmanager";

/// Wire envelope of the configuration endpoint
#[derive(Debug, Serialize, Deserialize)]
struct ConfigEnvelope {
    #[serde(default)]
    template_files: Option<TemplateFiles>,
    #[serde(default)]
    grafana_alertmanager_config: String,
}

/// Response body of `GET {config endpoint}`
#[derive(Debug, Deserialize)]
struct ConfigResponse {
    data: ConfigEnvelope,
}

/// Pushes and pulls the alerting configuration document and keeps the local copy
pub struct ConfigSynchronizer {
    transport: TenantTransport,
    config_url: String,
    org_id: i64,
    store: Arc<dyn ConfigStore>,
}

impl ConfigSynchronizer {
    /// Create a synchronizer for the Alertmanager at `base_url`
    pub fn new(
        transport: TenantTransport,
        base_url: &str,
        config_endpoint: &str,
        org_id: i64,
        store: Arc<dyn ConfigStore>,
    ) -> Self {
        let root = base_url
            .strip_suffix(ALERTMANAGER_PATH_SUFFIX)
            .unwrap_or(base_url);

        Self {
            transport,
            config_url: format!("{root}{config_endpoint}"),
            org_id,
            store,
        }
    }

    /// URL used for both push and pull
    pub fn config_url(&self) -> &str {
        &self.config_url
    }

    /// Send the configuration to the remote Alertmanager. Only 201 is success.
    pub async fn push(&self, config: &PostableUserConfig) -> Result<()> {
        const OP: &str = "posting Alertmanager configuration";

        let inner = serde_json::to_string(&config.alertmanager_config)
            .map_err(|e| Error::serialization("encoding Alertmanager configuration", e))?;
        let envelope = ConfigEnvelope {
            template_files: Some(config.template_files.clone()),
            grafana_alertmanager_config: inner,
        };
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| Error::serialization("encoding configuration envelope", e))?;

        debug!(method = "POST", url = %self.config_url, "Sending request to remote Alertmanager");
        let response = self
            .transport
            .post(&self.config_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::transport(OP, e))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(OP, status.as_u16(), body));
        }

        Ok(())
    }

    /// Fetch the configuration currently applied remotely, defaults included.
    pub async fn pull(&self) -> Result<PostableUserConfig> {
        const OP: &str = "getting Alertmanager configuration";

        debug!(method = "GET", url = %self.config_url, "Sending request to remote Alertmanager");
        let response = self
            .transport
            .get(&self.config_url)
            .send()
            .await
            .map_err(|e| Error::transport(OP, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found("Alertmanager configuration", &self.config_url));
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(OP, status.as_u16(), body));
        }

        let bytes = response.bytes().await.map_err(|e| Error::transport(OP, e))?;
        let body: ConfigResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Error::serialization("decoding remote Alertmanager configuration", e))?;
        let alertmanager_config: PostableApiAlertingConfig =
            serde_json::from_str(&body.data.grafana_alertmanager_config).map_err(|e| {
                Error::serialization("decoding nested Alertmanager configuration", e)
            })?;

        Ok(PostableUserConfig {
            template_files: body.data.template_files.unwrap_or_default(),
            alertmanager_config,
        })
    }

    /// Save the configuration through the local store
    pub async fn persist(&self, config: &PostableUserConfig) -> Result<()> {
        let serialized = serde_json::to_string(config)
            .map_err(|e| Error::serialization("serializing the Alertmanager configuration", e))?;

        let cmd = SaveConfigurationCmd {
            org_id: self.org_id,
            alertmanager_configuration: serialized,
            configuration_version: CONFIGURATION_VERSION.to_string(),
            last_applied: Utc::now().timestamp(),
        };

        self.store.save_alertmanager_configuration(&cmd).await
    }
}
