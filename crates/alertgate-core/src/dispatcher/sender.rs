//! Default dispatcher: bounded queue drained by a single tokio task
//!
//! Alerts are queued in memory. When the queue is full the oldest alerts are
//! dropped. The actor posts batches of at most `max_batch_size` alerts to
//! every active target concurrently and never retries a failed delivery.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::client::API_V2_BASE_PATH;
use crate::config::DispatcherConfig;
use crate::error::{Error, Result};
use crate::models::{PostableAlert, PostableAlerts};
use crate::transport::TenantTransport;

use super::Dispatcher;

const ALERTS_SENT: &str = "alertgate_dispatcher_alerts_sent_total";
const ALERTS_DROPPED: &str = "alertgate_dispatcher_alerts_dropped_total";
const DELIVERY_ERRORS: &str = "alertgate_dispatcher_errors_total";

/// State shared between the handle and the actor task
struct Shared {
    queue: Mutex<VecDeque<PostableAlert>>,
    queued: Notify,
    pending_targets: Mutex<Option<Vec<Url>>>,
    active_targets: RwLock<Vec<Url>>,
}

impl Shared {
    /// Apply targets handed over since the last discovery cycle
    fn sync_targets(&self) {
        if let Some(targets) = self.pending_targets.lock().take() {
            info!(count = targets.len(), "Alert delivery targets updated");
            *self.active_targets.write() = targets;
        }
    }

    fn next_batch(&self, max: usize) -> Vec<PostableAlert> {
        let mut queue = self.queue.lock();
        let n = queue.len().min(max);
        queue.drain(..n).collect()
    }
}

/// Default [`Dispatcher`] implementation
pub struct AlertDispatcher {
    config: DispatcherConfig,
    transport: TenantTransport,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AlertDispatcher {
    /// Create a stopped dispatcher
    pub fn new(config: DispatcherConfig, transport: TenantTransport) -> Self {
        Self {
            config,
            transport,
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                queued: Notify::new(),
                pending_targets: Mutex::new(None),
                active_targets: RwLock::new(Vec::new()),
            }),
            shutdown: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Whether the actor task is alive
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            queue_len: self.shared.queue.lock().len(),
            queue_capacity: self.config.queue_capacity,
            active_targets: self.target_count(),
        }
    }

    #[cfg(test)]
    fn queued(&self) -> Vec<PostableAlert> {
        self.shared.queue.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl Dispatcher for AlertDispatcher {
    fn start(&self) -> Result<()> {
        let mut task = self.task.lock();
        if task.is_some() {
            return Ok(());
        }
        if self.shutdown.is_cancelled() {
            return Err(Error::config("alert dispatcher was already stopped"));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::config(format!("alert dispatcher needs a tokio runtime: {e}")))?;

        let worker = Worker {
            config: self.config.clone(),
            transport: self.transport.clone(),
            shared: self.shared.clone(),
            shutdown: self.shutdown.clone(),
        };
        *task = Some(runtime.spawn(worker.run()));

        Ok(())
    }

    fn apply_targets(&self, targets: Vec<Url>) -> Result<()> {
        if let Some(bad) = targets.iter().find(|t| t.cannot_be_a_base()) {
            return Err(Error::config(format!("invalid alert delivery target: {bad}")));
        }

        *self.shared.pending_targets.lock() = Some(targets);
        Ok(())
    }

    fn send(&self, alerts: PostableAlerts) {
        let capacity = self.config.queue_capacity;
        let mut incoming = alerts.alerts;
        let mut dropped = 0;

        if incoming.len() > capacity {
            let excess = incoming.len() - capacity;
            incoming.drain(..excess);
            dropped += excess;
        }

        {
            let mut queue = self.shared.queue.lock();
            let overflow = (queue.len() + incoming.len()).saturating_sub(capacity);
            queue.drain(..overflow);
            dropped += overflow;
            queue.extend(incoming);
        }

        if dropped > 0 {
            warn!(dropped, "Alert queue full, dropping oldest alerts");
            metrics::counter!(ALERTS_DROPPED).increment(dropped as u64);
        }

        self.shared.queued.notify_one();
    }

    fn target_count(&self) -> usize {
        self.shared.active_targets.read().len()
    }

    async fn stop(&self) {
        self.shutdown.cancel();

        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Alert dispatcher task failed");
            }
            info!("Alert dispatcher stopped");
        }
    }
}

/// The actor loop and everything it owns
struct Worker {
    config: DispatcherConfig,
    transport: TenantTransport,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
}

impl Worker {
    async fn run(self) {
        info!(
            "Alert dispatcher started (queue_capacity={}, max_batch_size={})",
            self.config.queue_capacity, self.config.max_batch_size
        );

        let mut discovery = interval(self.config.discovery_interval);
        discovery.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,

                _ = discovery.tick() => self.shared.sync_targets(),

                _ = self.shared.queued.notified() => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = self.drain() => {}
                    }
                }
            }
        }

        debug!("Alert dispatcher loop exited");
    }

    /// Deliver queued alerts until the queue is empty
    async fn drain(&self) {
        loop {
            let batch = self.shared.next_batch(self.config.max_batch_size.max(1));
            if batch.is_empty() {
                return;
            }

            let targets = self.shared.active_targets.read().clone();
            if targets.is_empty() {
                warn!(count = batch.len(), "No alert delivery targets, dropping alerts");
                metrics::counter!(ALERTS_DROPPED).increment(batch.len() as u64);
                continue;
            }

            let payload = PostableAlerts::from(batch);
            let results = join_all(targets.iter().map(|t| self.post(t, &payload))).await;

            if results.iter().any(|delivered| *delivered) {
                metrics::counter!(ALERTS_SENT).increment(payload.len() as u64);
            } else {
                metrics::counter!(ALERTS_DROPPED).increment(payload.len() as u64);
            }
        }
    }

    /// Post one batch to one target, returning whether it was accepted
    async fn post(&self, target: &Url, alerts: &PostableAlerts) -> bool {
        let url = alerts_endpoint(target);

        let result = self
            .transport
            .post(url.clone())
            .timeout(self.config.send_timeout)
            .json(alerts)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(url = %url, count = alerts.len(), "Alerts delivered");
                true
            }
            Ok(response) => {
                error!(url = %url, status = %response.status(), "Alert delivery rejected");
                metrics::counter!(DELIVERY_ERRORS).increment(1);
                false
            }
            Err(e) => {
                error!(url = %url, error = %e, "Alert delivery failed");
                metrics::counter!(DELIVERY_ERRORS).increment(1);
                false
            }
        }
    }
}

/// `{target}/api/v2/alerts`
fn alerts_endpoint(target: &Url) -> Url {
    let mut url = target.clone();
    let path = format!(
        "{}{}/alerts",
        target.path().trim_end_matches('/'),
        API_V2_BASE_PATH
    );
    url.set_path(&path);
    url
}

/// Dispatcher statistics
#[derive(Debug, Clone)]
pub struct DispatcherStats {
    /// Alerts waiting for delivery
    pub queue_len: usize,
    /// Maximum queue length
    pub queue_capacity: usize,
    /// Targets currently receiving alerts
    pub active_targets: usize,
}
