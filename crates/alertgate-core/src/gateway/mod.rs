//! Remote Alertmanager gateway
//!
//! [`RemoteAlertmanager`] stands in for a local Alertmanager. It forwards
//! alerts through the dispatcher, proxies silences and alert reads to the v2
//! API and keeps the remote configuration in sync with the local store.
//!
//! ```no_run
//! use std::sync::Arc;
//! use alertgate::config::RemoteAlertmanagerConfig;
//! use alertgate::gateway::RemoteAlertmanager;
//! use alertgate::store::InMemoryConfigStore;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> alertgate::Result<()> {
//! let config = RemoteAlertmanagerConfig::new("http://mimir:8080/alertmanager", "tenant-1", "secret");
//! let gateway = RemoteAlertmanager::new(config, 1, Arc::new(InMemoryConfigStore::new()))?;
//!
//! let ctx = CancellationToken::new();
//! gateway.check_readiness(&ctx).await?;
//! let silences = gateway.list_silences(&ctx, &[]).await?;
//! # let _ = silences;
//! gateway.stop_and_wait().await;
//! # Ok(())
//! # }
//! ```

pub mod isolation;
pub mod readiness;
pub mod relay;
pub mod sync;

pub use readiness::ReadinessMonitor;
pub use relay::Relay;
pub use sync::ConfigSynchronizer;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::cancel::{ensure_active, run_until_cancelled};
use crate::client::{AlertmanagerApi, V2Client};
use crate::config::RemoteAlertmanagerConfig;
use crate::dispatcher::{AlertDispatcher, Dispatcher};
use crate::error::{Error, Result};
use crate::models::{
    AlertGroups, AlertQuery, GettableAlerts, GettableSilence, GettableSilences, GettableStatus,
    PostableAlerts, PostableSilence, PostableUserConfig, Receiver, TestReceiversConfigBodyParams,
    TestReceiversResult, TestTemplatesConfigBodyParams, TestTemplatesResults,
};
use crate::store::ConfigStore;
use crate::transport::TenantTransport;

/// Gateway to an externally hosted Alertmanager for one organization
pub struct RemoteAlertmanager {
    org_id: i64,
    url: Url,
    transport: TenantTransport,
    dispatcher: Arc<dyn Dispatcher>,
    readiness: ReadinessMonitor,
    sync: ConfigSynchronizer,
    relay: Relay,
}

impl RemoteAlertmanager {
    /// Build the gateway with the default v2 client and alert dispatcher.
    ///
    /// Fails with [`Error::Config`] when the URL is empty or invalid, or when
    /// a timing or queue setting is unusable. No network call is made; the
    /// returned gateway is not ready yet.
    pub fn new(
        config: RemoteAlertmanagerConfig,
        org_id: i64,
        store: Arc<dyn ConfigStore>,
    ) -> Result<Self> {
        let url = validate(&config)?;
        let transport = TenantTransport::new(&config.tenant_id, &config.basic_auth_password)?;

        let api = Arc::new(V2Client::new(&url, transport.clone())?);
        let dispatcher = Arc::new(AlertDispatcher::new(
            config.dispatcher.clone(),
            transport.clone(),
        ));

        Self::assemble(config, url, org_id, store, transport, api, dispatcher)
    }

    /// Build the gateway around an existing API binding and dispatcher
    pub fn with_components(
        config: RemoteAlertmanagerConfig,
        org_id: i64,
        store: Arc<dyn ConfigStore>,
        api: Arc<dyn AlertmanagerApi>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self> {
        let url = validate(&config)?;
        let transport = TenantTransport::new(&config.tenant_id, &config.basic_auth_password)?;

        Self::assemble(config, url, org_id, store, transport, api, dispatcher)
    }

    fn assemble(
        config: RemoteAlertmanagerConfig,
        url: Url,
        org_id: i64,
        store: Arc<dyn ConfigStore>,
        transport: TenantTransport,
        api: Arc<dyn AlertmanagerApi>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self> {
        let readiness = ReadinessMonitor::new(&config.url, &config.readiness);
        let sync = ConfigSynchronizer::new(
            transport.clone(),
            &config.url,
            config.config_endpoint(),
            org_id,
            store,
        );

        dispatcher.start()?;
        dispatcher.apply_targets(vec![url.clone()])?;

        info!(
            org_id,
            tenant = %config.tenant_id,
            url = %url,
            "Remote Alertmanager gateway created"
        );

        Ok(Self {
            org_id,
            url,
            transport,
            dispatcher,
            readiness,
            sync,
            relay: Relay::new(api),
        })
    }

    /// Organization served by this gateway
    pub fn org_id(&self) -> i64 {
        self.org_id
    }

    /// Tenant sent with every request
    pub fn tenant_id(&self) -> &str {
        self.transport.tenant_id()
    }

    /// Base URL of the remote Alertmanager
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL used to push and pull the configuration
    pub fn config_url(&self) -> &str {
        self.sync.config_url()
    }

    /// Whether readiness has been established
    pub fn ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// Establish readiness, a no-op once ready
    pub async fn check_readiness(&self, ctx: &CancellationToken) -> Result<()> {
        self.readiness
            .establish(&self.transport, self.dispatcher.as_ref(), ctx)
            .await
    }

    /// Configuration is applied remotely by [`Self::save_and_apply_config`];
    /// this only establishes readiness.
    pub async fn apply_config(
        &self,
        ctx: &CancellationToken,
        _config: &PostableUserConfig,
    ) -> Result<()> {
        self.check_readiness(ctx).await
    }

    /// Push the configuration remotely, then store it locally
    pub async fn save_and_apply_config(
        &self,
        ctx: &CancellationToken,
        config: &PostableUserConfig,
    ) -> Result<()> {
        run_until_cancelled(ctx, "saving and applying configuration", async {
            self.sync.push(config).await?;
            self.sync.persist(config).await?;
            info!(
                org_id = self.org_id,
                url = %self.sync.config_url(),
                "Configuration applied to remote Alertmanager"
            );
            Ok::<_, Error>(())
        })
        .await
    }

    /// Store the configuration currently applied remotely. Remote state is
    /// left untouched.
    pub async fn save_and_apply_default_config(&self, ctx: &CancellationToken) -> Result<()> {
        run_until_cancelled(ctx, "saving default configuration", async {
            let config = self.sync.pull().await?;
            self.sync.persist(&config).await?;
            info!(org_id = self.org_id, "Remote Alertmanager configuration saved locally");
            Ok::<_, Error>(())
        })
        .await
    }

    /// Create or update a silence and return its ID
    pub async fn create_silence(
        &self,
        ctx: &CancellationToken,
        silence: &PostableSilence,
    ) -> Result<String> {
        self.relay.create_silence(ctx, silence).await
    }

    /// Fetch one silence by ID
    pub async fn get_silence(
        &self,
        ctx: &CancellationToken,
        silence_id: &str,
    ) -> Result<GettableSilence> {
        self.relay.get_silence(ctx, silence_id).await
    }

    /// List silences matching `filter`
    pub async fn list_silences(
        &self,
        ctx: &CancellationToken,
        filter: &[String],
    ) -> Result<GettableSilences> {
        self.relay.list_silences(ctx, filter).await
    }

    /// Expire a silence
    pub async fn delete_silence(&self, ctx: &CancellationToken, silence_id: &str) -> Result<()> {
        self.relay.delete_silence(ctx, silence_id).await
    }

    /// Alerts known to the remote Alertmanager
    pub async fn get_alerts(
        &self,
        ctx: &CancellationToken,
        query: &AlertQuery,
    ) -> Result<GettableAlerts> {
        self.relay.get_alerts(ctx, query).await
    }

    /// Alerts grouped by route
    pub async fn get_alert_groups(
        &self,
        ctx: &CancellationToken,
        query: &AlertQuery,
    ) -> Result<AlertGroups> {
        self.relay.get_alert_groups(ctx, query).await
    }

    /// Hand alerts to the dispatcher and return without waiting for delivery
    pub fn put_alerts(&self, ctx: &CancellationToken, alerts: PostableAlerts) -> Result<()> {
        ensure_active(ctx, "sending alerts")?;
        debug!(alerts = alerts.len(), "Sending alerts to a remote Alertmanager");
        self.dispatcher.send(alerts);
        Ok(())
    }

    /// Receivers of the applied configuration
    pub async fn get_receivers(&self, ctx: &CancellationToken) -> Result<Vec<Receiver>> {
        self.relay.get_receivers(ctx).await
    }

    /// Receiver tests are not supported remotely; the result is always empty.
    pub async fn test_receivers(
        &self,
        ctx: &CancellationToken,
        _params: &TestReceiversConfigBodyParams,
    ) -> Result<TestReceiversResult> {
        ensure_active(ctx, "testing receivers")?;
        Ok(TestReceiversResult::default())
    }

    /// Template tests are not supported remotely; the result is always empty.
    pub async fn test_template(
        &self,
        ctx: &CancellationToken,
        _params: &TestTemplatesConfigBodyParams,
    ) -> Result<TestTemplatesResults> {
        ensure_active(ctx, "testing templates")?;
        Ok(TestTemplatesResults::default())
    }

    /// Status is not read remotely; always the default
    pub fn get_status(&self) -> GettableStatus {
        GettableStatus::default()
    }

    /// Stop the dispatcher and wait for it to exit
    pub async fn stop_and_wait(&self) {
        self.dispatcher.stop().await;
        info!(org_id = self.org_id, "Remote Alertmanager gateway stopped");
    }

    /// Nothing is kept on disk by the gateway itself
    pub fn clean_up(&self) {}
}

fn validate(config: &RemoteAlertmanagerConfig) -> Result<Url> {
    if config.url.is_empty() {
        return Err(Error::config(format!(
            "empty remote Alertmanager URL for tenant '{}'",
            config.tenant_id
        )));
    }

    let url = Url::parse(&config.url).map_err(|e| {
        Error::config(format!("invalid remote Alertmanager URL '{}': {e}", config.url))
    })?;
    config.validate()?;
    Ok(url)
}
