//! The four caching strategies.
//!
//! Every strategy resolves to a response: failures are recovered here and
//! turned into cached content or a synthetic 503, never surfaced to the
//! caller. Responses with a non-ok status are returned but never stored.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cache::{CacheNames, CacheStore};
use crate::fetch::Fetcher;
use crate::http::{Request, RequestKey, Response};
use crate::routing::Strategy;

/// Where the returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Network,
    Cache,
    /// The designated offline document, served to a failed navigation.
    OfflineDocument,
    /// A synthetic 503.
    Synthetic,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Network => "network",
            Source::Cache => "cache",
            Source::OfflineDocument => "offline_document",
            Source::Synthetic => "synthetic",
        }
    }
}

/// Background refresh spawned by stale-while-revalidate on a cache hit.
#[derive(Debug)]
pub struct Revalidation(JoinHandle<Option<Response>>);

impl Revalidation {
    /// Wait for the refresh to finish.
    ///
    /// Yields the fresh network response, or on failure the cached value
    /// the strategy started from.
    pub async fn settled(self) -> Option<Response> {
        self.0.await.ok().flatten()
    }
}

/// A strategy's answer to one request.
#[derive(Debug)]
pub struct Outcome {
    pub response: Response,
    pub source: Source,
    pub strategy: Strategy,
    /// Set when the response was served from cache while a refresh runs.
    pub revalidation: Option<Revalidation>,
}

impl Outcome {
    fn new(strategy: Strategy, source: Source, response: Response) -> Self {
        Self { response, source, strategy, revalidation: None }
    }
}

/// Executes strategies against the cache store and the network.
#[derive(Clone)]
pub struct StrategyEngine {
    cache: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    names: CacheNames,
    offline_document: RequestKey,
    network_timeout: Duration,
}

impl StrategyEngine {
    pub fn new(
        cache: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, names: CacheNames, offline_document: RequestKey,
        network_timeout: Duration,
    ) -> Self {
        Self { cache, fetcher, names, offline_document, network_timeout }
    }

    pub async fn execute(&self, strategy: Strategy, request: &Request) -> Outcome {
        let outcome = match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::NetworkFirstWithOfflineFallback => self.network_first_with_offline_fallback(request).await,
        };

        tracing::debug!(
            url = %request.url,
            strategy = %strategy,
            source = ?outcome.source,
            status = outcome.response.status,
            "request handled"
        );

        outcome
    }

    async fn cache_first(&self, request: &Request) -> Outcome {
        let key = request.key();
        let name = &self.names.static_assets;

        if let Some(hit) = lookup(self.cache.as_ref(), name, &key).await {
            return Outcome::new(Strategy::CacheFirst, Source::Cache, hit);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    store(self.cache.as_ref(), name, &key, response.clone()).await;
                }
                Outcome::new(Strategy::CacheFirst, Source::Network, response)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache-first fetch failed");
                Outcome::new(Strategy::CacheFirst, Source::Synthetic, Response::offline())
            }
        }
    }

    async fn network_first(&self, request: &Request) -> Outcome {
        let key = request.key();

        // The losing fetch is dropped and never stored.
        match tokio::time::timeout(self.network_timeout, self.fetcher.fetch(request)).await {
            Ok(Ok(response)) => {
                if response.is_ok() {
                    store(self.cache.as_ref(), &self.names.dynamic, &key, response.clone()).await;
                }
                return Outcome::new(Strategy::NetworkFirst, Source::Network, response);
            }
            Ok(Err(e)) => {
                tracing::debug!(url = %request.url, error = %e, "network-first fetch failed, trying cache");
            }
            Err(_) => {
                tracing::debug!(
                    url = %request.url,
                    timeout_ms = self.network_timeout.as_millis() as u64,
                    "network-first fetch timed out, trying cache"
                );
            }
        }

        for name in [&self.names.dynamic, &self.names.static_assets] {
            if let Some(hit) = lookup(self.cache.as_ref(), name, &key).await {
                return Outcome::new(Strategy::NetworkFirst, Source::Cache, hit);
            }
        }

        Outcome::new(Strategy::NetworkFirst, Source::Synthetic, Response::offline())
    }

    async fn stale_while_revalidate(&self, request: &Request) -> Outcome {
        let key = request.key();
        let cached = lookup(self.cache.as_ref(), &self.names.dynamic, &key).await;

        let refresh = {
            let cache = Arc::clone(&self.cache);
            let fetcher = Arc::clone(&self.fetcher);
            let name = self.names.dynamic.clone();
            let request = request.clone();
            let fallback = cached.clone();
            tokio::spawn(async move {
                match fetcher.fetch(&request).await {
                    Ok(response) => {
                        if response.is_ok() {
                            store(cache.as_ref(), &name, &request.key(), response.clone()).await;
                        }
                        Some(response)
                    }
                    Err(e) => {
                        tracing::debug!(url = %request.url, error = %e, "revalidation failed");
                        fallback
                    }
                }
            })
        };

        if let Some(hit) = cached {
            let mut outcome = Outcome::new(Strategy::StaleWhileRevalidate, Source::Cache, hit);
            outcome.revalidation = Some(Revalidation(refresh));
            return outcome;
        }

        match refresh.await {
            Ok(Some(response)) => Outcome::new(Strategy::StaleWhileRevalidate, Source::Network, response),
            Ok(None) => Outcome::new(Strategy::StaleWhileRevalidate, Source::Synthetic, Response::offline()),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "revalidation task aborted");
                Outcome::new(Strategy::StaleWhileRevalidate, Source::Synthetic, Response::offline())
            }
        }
    }

    async fn network_first_with_offline_fallback(&self, request: &Request) -> Outcome {
        const STRATEGY: Strategy = Strategy::NetworkFirstWithOfflineFallback;
        let key = request.key();

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    store(self.cache.as_ref(), &self.names.dynamic, &key, response.clone()).await;
                }
                return Outcome::new(STRATEGY, Source::Network, response);
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "document fetch failed, trying cache");
            }
        }

        if let Some(hit) = lookup(self.cache.as_ref(), &self.names.dynamic, &key).await {
            return Outcome::new(STRATEGY, Source::Cache, hit);
        }

        if !request.is_navigation() {
            return Outcome::new(STRATEGY, Source::Synthetic, Response::offline());
        }

        for name in [&self.names.static_assets, &self.names.dynamic] {
            if let Some(page) = lookup(self.cache.as_ref(), name, &self.offline_document).await {
                return Outcome::new(STRATEGY, Source::OfflineDocument, page);
            }
        }

        tracing::warn!(offline_document = %self.offline_document, "offline document missing from cache");
        Outcome::new(STRATEGY, Source::Synthetic, Response::offline_page())
    }
}

/// Cache read that treats a store error as a miss.
async fn lookup(cache: &dyn CacheStore, name: &str, key: &RequestKey) -> Option<Response> {
    match cache.lookup(name, key).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(cache = name, key = %key, error = %e, "cache lookup failed");
            None
        }
    }
}

/// Cache write whose failure only costs the entry.
async fn store(cache: &dyn CacheStore, name: &str, key: &RequestKey, response: Response) {
    if let Err(e) = cache.put(name, key, response).await {
        tracing::warn!(cache = name, key = %key, error = %e, "cache put failed");
    }
}
