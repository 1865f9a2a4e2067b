//! Readiness protocol for the remote Alertmanager
//!
//! Readiness is established in two steps. First a single probe of
//! `{url}/-/ready` must answer 200. Then the dispatcher is polled until it
//! reports at least one discovered target. The poll ticker and the overall
//! deadline are independent timers; whichever fires first decides. Once
//! ready, the monitor never goes back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cancel::run_until_cancelled;
use crate::config::ReadinessConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::transport::TenantTransport;

/// Path probed on the remote Alertmanager
pub const READY_ENDPOINT: &str = "/-/ready";

const OPERATION: &str = "checking Alertmanager readiness";

/// One-way NotReady -> Ready state machine
pub struct ReadinessMonitor {
    ready: AtomicBool,
    probe_url: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl ReadinessMonitor {
    /// Create a monitor for the Alertmanager at `base_url`
    pub fn new(base_url: &str, config: &ReadinessConfig) -> Self {
        Self {
            ready: AtomicBool::new(false),
            probe_url: format!("{}{}", base_url.trim_end_matches('/'), READY_ENDPOINT),
            poll_interval: config.poll_interval,
            timeout: config.timeout,
        }
    }

    /// Whether readiness has been established
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// URL of the readiness probe
    pub fn probe_url(&self) -> &str {
        &self.probe_url
    }

    /// Establish readiness. A no-op once ready.
    pub async fn establish(
        &self,
        transport: &TenantTransport,
        dispatcher: &dyn Dispatcher,
        ctx: &CancellationToken,
    ) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        run_until_cancelled(ctx, OPERATION, self.probe(transport)).await?;
        self.wait_for_targets(dispatcher, ctx).await
    }

    async fn probe(&self, transport: &TenantTransport) -> Result<()> {
        let response = transport
            .get(&self.probe_url)
            .send()
            .await
            .map_err(|e| Error::transport("performing readiness check", e))?;

        if response.status() != StatusCode::OK {
            return Err(Error::not_ready(format!(
                "status code: {}",
                response.status().as_u16()
            )));
        }

        Ok(())
    }

    async fn wait_for_targets(
        &self,
        dispatcher: &dyn Dispatcher,
        ctx: &CancellationToken,
    ) -> Result<()> {
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = sleep(self.timeout);
        tokio::pin!(deadline);

        let mut attempts: u32 = 0;

        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Err(Error::cancelled(OPERATION)),

                _ = &mut deadline => {
                    warn!(attempts, timeout = ?self.timeout, "No alert delivery target discovered");
                    return Err(Error::not_ready(format!(
                        "no alert delivery target discovered within {:?}",
                        self.timeout
                    )));
                }

                _ = ticker.tick() => {
                    attempts += 1;
                    if dispatcher.target_count() > 0 {
                        self.ready.store(true, Ordering::Release);
                        debug!(attempts, "Alertmanager readiness check successful");
                        return Ok(());
                    }
                }
            }
        }
    }
}
