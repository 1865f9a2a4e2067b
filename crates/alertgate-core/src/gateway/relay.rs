//! Silence and alert reads/writes proxied to the v2 API

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::isolation::guard;
use crate::cancel::run_until_cancelled;
use crate::client::AlertmanagerApi;
use crate::error::Result;
use crate::models::{
    AlertGroups, AlertQuery, GettableAlerts, GettableSilence, GettableSilences, PostableSilence,
    Receiver,
};

/// Proxies one call per operation to the API binding.
///
/// The binding call itself runs inside the fault boundary, so a panic while
/// building its future is caught as well as one raised while polling it.
#[derive(Clone)]
pub struct Relay {
    api: Arc<dyn AlertmanagerApi>,
}

impl Relay {
    /// Relay calls to `api`
    pub fn new(api: Arc<dyn AlertmanagerApi>) -> Self {
        Self { api }
    }

    /// Create or update a silence and return its ID
    pub async fn create_silence(
        &self,
        ctx: &CancellationToken,
        silence: &PostableSilence,
    ) -> Result<String> {
        const OP: &str = "creating silence";
        run_until_cancelled(ctx, OP, guard(OP, async { self.api.post_silence(silence).await }))
            .await
    }

    /// Fetch one silence by ID
    pub async fn get_silence(
        &self,
        ctx: &CancellationToken,
        silence_id: &str,
    ) -> Result<GettableSilence> {
        const OP: &str = "getting silence";
        run_until_cancelled(ctx, OP, guard(OP, async { self.api.get_silence(silence_id).await }))
            .await
    }

    /// List silences matching `filter`
    pub async fn list_silences(
        &self,
        ctx: &CancellationToken,
        filter: &[String],
    ) -> Result<GettableSilences> {
        const OP: &str = "listing silences";
        run_until_cancelled(ctx, OP, guard(OP, async { self.api.get_silences(filter).await })).await
    }

    /// Expire a silence
    pub async fn delete_silence(&self, ctx: &CancellationToken, silence_id: &str) -> Result<()> {
        const OP: &str = "deleting silence";
        run_until_cancelled(ctx, OP, guard(OP, async { self.api.delete_silence(silence_id).await }))
            .await
    }

    /// Alerts known to the remote Alertmanager
    pub async fn get_alerts(
        &self,
        ctx: &CancellationToken,
        query: &AlertQuery,
    ) -> Result<GettableAlerts> {
        const OP: &str = "getting alerts";
        run_until_cancelled(ctx, OP, guard(OP, async { self.api.get_alerts(query).await })).await
    }

    /// Alerts grouped by route
    pub async fn get_alert_groups(
        &self,
        ctx: &CancellationToken,
        query: &AlertQuery,
    ) -> Result<AlertGroups> {
        const OP: &str = "getting alert groups";
        run_until_cancelled(ctx, OP, guard(OP, async { self.api.get_alert_groups(query).await }))
            .await
    }

    /// Not wrapped in [`guard`]: a panicking binding propagates to the caller.
    pub async fn get_receivers(&self, ctx: &CancellationToken) -> Result<Vec<Receiver>> {
        run_until_cancelled(ctx, "getting receivers", self.api.get_receivers()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::Matcher;
    use crate::testing::{EagerPanickingApi, PanickingApi};

    fn relay() -> Relay {
        Relay::new(Arc::new(PanickingApi))
    }

    fn silence() -> PostableSilence {
        let now = chrono::Utc::now();
        PostableSilence {
            id: None,
            matchers: vec![Matcher::equal("alertname", "Watchdog")],
            starts_at: now,
            ends_at: now + chrono::Duration::hours(1),
            created_by: "ops".to_string(),
            comment: "maintenance".to_string(),
        }
    }

    fn assert_isolated<T: std::fmt::Debug>(result: Result<T>, expected_op: &str) {
        match result {
            Err(Error::FaultIsolated { operation, .. }) => assert_eq!(operation, expected_op),
            other => panic!("expected FaultIsolated for {expected_op}, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_silence_calls_are_isolated() {
        let relay = relay();
        let ctx = CancellationToken::new();

        assert_isolated(
            relay.create_silence(&ctx, &silence()).await,
            "creating silence",
        );
        assert_isolated(relay.get_silence(&ctx, "abc").await, "getting silence");
        assert_isolated(relay.list_silences(&ctx, &[]).await, "listing silences");
        assert_isolated(relay.delete_silence(&ctx, "abc").await, "deleting silence");
    }

    #[tokio::test]
    async fn test_alert_reads_are_isolated() {
        let relay = relay();
        let ctx = CancellationToken::new();
        let query = AlertQuery::default();

        assert_isolated(relay.get_alerts(&ctx, &query).await, "getting alerts");
        assert_isolated(
            relay.get_alert_groups(&ctx, &query).await,
            "getting alert groups",
        );
    }

    #[tokio::test]
    async fn test_panics_before_the_future_exists_are_isolated() {
        let relay = Relay::new(Arc::new(EagerPanickingApi));
        let ctx = CancellationToken::new();
        let query = AlertQuery::default();

        assert_isolated(
            relay.create_silence(&ctx, &silence()).await,
            "creating silence",
        );
        assert_isolated(relay.get_silence(&ctx, "abc").await, "getting silence");
        assert_isolated(relay.list_silences(&ctx, &[]).await, "listing silences");
        assert_isolated(relay.delete_silence(&ctx, "abc").await, "deleting silence");
        assert_isolated(relay.get_alerts(&ctx, &query).await, "getting alerts");
        assert_isolated(
            relay.get_alert_groups(&ctx, &query).await,
            "getting alert groups",
        );
    }

    #[tokio::test]
    #[should_panic(expected = "malformed receivers payload")]
    async fn test_receivers_are_not_isolated() {
        let _ = relay().get_receivers(&CancellationToken::new()).await;
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let ctx = CancellationToken::new();
        ctx.cancel();

        let err = relay().get_silence(&ctx, "abc").await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
