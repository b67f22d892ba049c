//! Background sync of locally queued records.
//!
//! Each domain reads its pending batch from the local data store and POSTs
//! it to the sync endpoint in one JSON payload. Failures are never surfaced:
//! the domain's tag is registered with the retry scheduler and the platform
//! re-invokes the sync later.

pub mod scheduler;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::control::OutboundMessage;
use crate::fetch::Fetcher;
use crate::http::Request;
use crate::session::SessionHub;

pub use scheduler::{BoundedRetryScheduler, RetryPolicy, RetryScheduler};

/// Periodic-sync tag that runs every domain.
pub const PERIODIC_CONTENT_TAG: &str = "content-sync";

/// A data domain synced as one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDomain {
    Tournaments,
    Players,
}

impl SyncDomain {
    pub const ALL: [SyncDomain; 2] = [SyncDomain::Tournaments, SyncDomain::Players];

    /// Retry tag registered with the scheduler.
    pub fn tag(&self) -> &'static str {
        match self {
            SyncDomain::Tournaments => "sync-tournaments",
            SyncDomain::Players => "sync-players",
        }
    }

    /// Top-level key of the POSTed payload.
    pub fn payload_key(&self) -> &'static str {
        match self {
            SyncDomain::Tournaments => "tournaments",
            SyncDomain::Players => "players",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.tag() == tag)
    }
}

impl fmt::Display for SyncDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.payload_key())
    }
}

/// Source of records waiting to be synced.
#[async_trait]
pub trait LocalDataStore: Send + Sync {
    async fn get_batch(&self, domain: SyncDomain) -> Result<Vec<serde_json::Value>, Error>;
}

/// Data store with nothing queued. Stands in until an on-device store is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDataStore;

#[async_trait]
impl LocalDataStore for EmptyDataStore {
    async fn get_batch(&self, _domain: SyncDomain) -> Result<Vec<serde_json::Value>, Error> {
        Ok(Vec::new())
    }
}

/// Result of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Empty batch; no request was made.
    NothingToSync { domain: SyncDomain },
    Synced { domain: SyncDomain, count: usize },
    /// Failed and registered for retry.
    Deferred { domain: SyncDomain, reason: String },
    /// Failed and the scheduler refused the retry.
    Abandoned { domain: SyncDomain, reason: String },
}

/// Pushes queued batches and schedules retries on failure.
#[derive(Clone)]
pub struct SyncCoordinator {
    store: Arc<dyn LocalDataStore>,
    fetcher: Arc<dyn Fetcher>,
    hub: Arc<dyn SessionHub>,
    scheduler: Arc<dyn RetryScheduler>,
    endpoint: Url,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<dyn LocalDataStore>, fetcher: Arc<dyn Fetcher>, hub: Arc<dyn SessionHub>,
        scheduler: Arc<dyn RetryScheduler>, endpoint: Url,
    ) -> Self {
        Self { store, fetcher, hub, scheduler, endpoint }
    }

    pub async fn sync(&self, domain: SyncDomain) -> SyncOutcome {
        let batch = match self.store.get_batch(domain).await {
            Ok(batch) => batch,
            Err(e) => return self.defer(domain, e).await,
        };

        if batch.is_empty() {
            tracing::debug!(%domain, "nothing to sync");
            return SyncOutcome::NothingToSync { domain };
        }

        let count = batch.len();
        if let Err(e) = self.push(domain, batch).await {
            return self.defer(domain, e).await;
        }

        self.scheduler.complete(domain.tag()).await;
        if let Err(e) = self.hub.broadcast(&OutboundMessage::SyncSuccess { domain }).await {
            tracing::warn!(%domain, error = %e, "failed to broadcast sync result");
        }

        tracing::info!(%domain, count, "synced");
        SyncOutcome::Synced { domain, count }
    }

    async fn push(&self, domain: SyncDomain, batch: Vec<serde_json::Value>) -> Result<(), Error> {
        let mut payload = serde_json::Map::new();
        payload.insert(domain.payload_key().to_string(), serde_json::Value::Array(batch));

        let request = Request::post_json(self.endpoint.clone(), &serde_json::Value::Object(payload))?;
        let response = self.fetcher.fetch(&request).await?;

        if !response.is_ok() {
            return Err(Error::RemoteRejection { status: response.status });
        }
        Ok(())
    }

    async fn defer(&self, domain: SyncDomain, cause: Error) -> SyncOutcome {
        let reason = cause.to_string();
        match self.scheduler.register(domain.tag()).await {
            Ok(()) => {
                tracing::warn!(%domain, error = %reason, "sync failed, retry registered");
                SyncOutcome::Deferred { domain, reason }
            }
            Err(e) => {
                tracing::warn!(%domain, error = %reason, scheduler_error = %e, "sync failed, retry refused");
                SyncOutcome::Abandoned { domain, reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Response};
    use crate::test_support::{FixedDataStore, RecordingHub, RecordingScheduler, ScriptedFetcher};
    use serde_json::json;

    struct Fixture {
        fetcher: Arc<ScriptedFetcher>,
        hub: Arc<RecordingHub>,
        scheduler: Arc<RecordingScheduler>,
        coordinator: SyncCoordinator,
        endpoint: Url,
    }

    fn fixture(store: FixedDataStore) -> Fixture {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let hub = Arc::new(RecordingHub::new());
        let scheduler = Arc::new(RecordingScheduler::new());
        let endpoint = Url::parse("http://localhost:8080/api/sync").unwrap();
        let coordinator =
            SyncCoordinator::new(Arc::new(store), fetcher.clone(), hub.clone(), scheduler.clone(), endpoint.clone());
        Fixture { fetcher, hub, scheduler, coordinator, endpoint }
    }

    #[test]
    fn test_domain_tags() {
        assert_eq!(SyncDomain::Tournaments.tag(), "sync-tournaments");
        assert_eq!(SyncDomain::from_tag("sync-players"), Some(SyncDomain::Players));
        assert_eq!(SyncDomain::from_tag("sync-weather"), None);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let f = fixture(FixedDataStore::default());

        let outcome = f.coordinator.sync(SyncDomain::Tournaments).await;
        assert_eq!(outcome, SyncOutcome::NothingToSync { domain: SyncDomain::Tournaments });
        assert!(f.fetcher.requests().is_empty());
        assert!(f.scheduler.registered().is_empty());
        assert!(f.hub.messages().is_empty());
    }

    #[tokio::test]
    async fn test_empty_data_store_default() {
        let store = EmptyDataStore;
        assert!(store.get_batch(SyncDomain::Players).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_posts_batch_and_broadcasts() {
        let f = fixture(FixedDataStore::default().with(SyncDomain::Players, vec![json!({"id": 1}), json!({"id": 2})]));
        f.fetcher.respond(&f.endpoint, Response::new(200, "{}"));

        let outcome = f.coordinator.sync(SyncDomain::Players).await;
        assert_eq!(outcome, SyncOutcome::Synced { domain: SyncDomain::Players, count: 2 });

        let requests = f.fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        let body: serde_json::Value = serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({"players": [{"id": 1}, {"id": 2}]}));

        assert_eq!(f.hub.messages(), vec![OutboundMessage::SyncSuccess { domain: SyncDomain::Players }]);
        assert_eq!(f.scheduler.completed(), vec!["sync-players".to_string()]);
        assert!(f.scheduler.registered().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_registers_retry() {
        let f = fixture(FixedDataStore::default().with(SyncDomain::Tournaments, vec![json!({"name": "Open"})]));
        f.fetcher.respond(&f.endpoint, Response::new(500, "down"));

        let outcome = f.coordinator.sync(SyncDomain::Tournaments).await;
        assert!(matches!(outcome, SyncOutcome::Deferred { domain: SyncDomain::Tournaments, .. }));
        assert_eq!(f.scheduler.registered(), vec!["sync-tournaments".to_string()]);
        assert!(f.hub.messages().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_registers_retry() {
        let f = fixture(FixedDataStore::default().with(SyncDomain::Players, vec![json!({"id": 9})]));
        f.fetcher.fail(&f.endpoint);

        let outcome = f.coordinator.sync(SyncDomain::Players).await;
        match outcome {
            SyncOutcome::Deferred { reason, .. } => assert!(reason.contains("TRANSPORT_FAILURE")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(f.scheduler.registered(), vec!["sync-players".to_string()]);
    }
}
