//! Alert dispatcher - asynchronous delivery of alert batches
//!
//! The dispatcher is a long-lived background actor. It owns target discovery
//! and the delivery queue; callers only enqueue alerts and read how many
//! targets are currently active.

mod sender;

pub use sender::{AlertDispatcher, DispatcherStats};

use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::models::PostableAlerts;

/// Background actor delivering alerts to discovered Alertmanagers
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Spawn the background actor. Calling it again is a no-op.
    fn start(&self) -> Result<()>;

    /// Replace the set of delivery targets. Targets become active on the
    /// actor's next discovery cycle.
    fn apply_targets(&self, targets: Vec<Url>) -> Result<()>;

    /// Enqueue alerts for delivery and return immediately.
    fn send(&self, alerts: PostableAlerts);

    /// Number of targets currently receiving alerts
    fn target_count(&self) -> usize;

    /// Stop the actor and wait for it to exit. Idempotent.
    async fn stop(&self);
}
