//! Test doubles shared by unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use url::Url;

use crate::client::AlertmanagerApi;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::models::{
    AlertGroups, AlertQuery, GettableAlerts, GettableSilence, GettableSilences, PostableAlerts,
    PostableSilence, Receiver,
};

/// Dispatcher whose target count is set by the test
#[derive(Default)]
pub struct StaticDispatcher {
    targets: AtomicUsize,
    started: AtomicBool,
    stops: AtomicUsize,
    applied: Mutex<Vec<Url>>,
    sent: Mutex<Vec<PostableAlerts>>,
}

impl StaticDispatcher {
    pub fn with_targets(count: usize) -> Self {
        let dispatcher = Self::default();
        dispatcher.set_targets(count);
        dispatcher
    }

    pub fn set_targets(&self, count: usize) {
        self.targets.store(count, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn applied(&self) -> Vec<Url> {
        self.applied.lock().clone()
    }

    pub fn sent(&self) -> Vec<PostableAlerts> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Dispatcher for StaticDispatcher {
    fn start(&self) -> Result<()> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn apply_targets(&self, targets: Vec<Url>) -> Result<()> {
        *self.applied.lock() = targets;
        Ok(())
    }

    fn send(&self, alerts: PostableAlerts) {
        self.sent.lock().push(alerts);
    }

    fn target_count(&self) -> usize {
        self.targets.load(Ordering::SeqCst)
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// API binding that panics on every call, as a broken decoder would
pub struct PanickingApi;

#[async_trait]
impl AlertmanagerApi for PanickingApi {
    async fn post_silence(&self, _silence: &PostableSilence) -> Result<String> {
        panic!("malformed silence payload")
    }

    async fn get_silence(&self, _silence_id: &str) -> Result<GettableSilence> {
        panic!("malformed silence payload")
    }

    async fn get_silences(&self, _filter: &[String]) -> Result<GettableSilences> {
        panic!("malformed silences payload")
    }

    async fn delete_silence(&self, _silence_id: &str) -> Result<()> {
        panic!("malformed delete response")
    }

    async fn get_alerts(&self, _query: &AlertQuery) -> Result<GettableAlerts> {
        panic!("malformed alerts payload")
    }

    async fn get_alert_groups(&self, _query: &AlertQuery) -> Result<AlertGroups> {
        panic!("malformed alert groups payload")
    }

    async fn get_receivers(&self) -> Result<Vec<Receiver>> {
        panic!("malformed receivers payload")
    }
}

/// API binding that panics while building the request future, before any
/// polling happens
pub struct EagerPanickingApi;

impl AlertmanagerApi for EagerPanickingApi {
    fn post_silence<'life0, 'life1, 'async_trait>(
        &'life0 self,
        _silence: &'life1 PostableSilence,
    ) -> BoxFuture<'async_trait, Result<String>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        panic!("invalid silence request")
    }

    fn get_silence<'life0, 'life1, 'async_trait>(
        &'life0 self,
        _silence_id: &'life1 str,
    ) -> BoxFuture<'async_trait, Result<GettableSilence>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        panic!("invalid silence request")
    }

    fn get_silences<'life0, 'life1, 'async_trait>(
        &'life0 self,
        _filter: &'life1 [String],
    ) -> BoxFuture<'async_trait, Result<GettableSilences>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        panic!("invalid silences request")
    }

    fn delete_silence<'life0, 'life1, 'async_trait>(
        &'life0 self,
        _silence_id: &'life1 str,
    ) -> BoxFuture<'async_trait, Result<()>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        panic!("invalid delete request")
    }

    fn get_alerts<'life0, 'life1, 'async_trait>(
        &'life0 self,
        _query: &'life1 AlertQuery,
    ) -> BoxFuture<'async_trait, Result<GettableAlerts>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        panic!("invalid alerts request")
    }

    fn get_alert_groups<'life0, 'life1, 'async_trait>(
        &'life0 self,
        _query: &'life1 AlertQuery,
    ) -> BoxFuture<'async_trait, Result<AlertGroups>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        panic!("invalid alert groups request")
    }

    fn get_receivers<'life0, 'async_trait>(
        &'life0 self,
    ) -> BoxFuture<'async_trait, Result<Vec<Receiver>>>
    where
        'life0: 'async_trait,
        Self: 'async_trait,
    {
        panic!("invalid receivers request")
    }
}
