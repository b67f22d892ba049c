//! Cache generation lifecycle: install, activate, and the full reset.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use url::Url;

use crate::Error;
use crate::cache::{CacheNames, CacheStore};
use crate::fetch::Fetcher;
use crate::http::{CacheMode, Request, RequestKey};
use crate::session::SessionHub;

/// Summary of an install pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Assets stored in the static generation when install finished.
    pub cached: usize,
    /// Assets that failed to fetch or came back non-ok.
    pub failed: usize,
    /// Population was still running at the install deadline.
    pub timed_out: bool,
}

/// Summary of an activation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    /// Superseded generations that were deleted.
    pub deleted: Vec<String>,
}

#[derive(Debug, Default)]
struct Progress {
    cached: AtomicUsize,
    failed: AtomicUsize,
}

/// Creates, sweeps, and wipes cache generations.
#[derive(Clone)]
pub struct CacheLifecycle {
    cache: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    hub: Arc<dyn SessionHub>,
    names: CacheNames,
    static_assets: Vec<Url>,
    install_timeout: Duration,
}

impl CacheLifecycle {
    pub fn new(
        cache: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, hub: Arc<dyn SessionHub>, names: CacheNames,
        static_assets: Vec<Url>, install_timeout: Duration,
    ) -> Self {
        Self { cache, fetcher, hub, names, static_assets, install_timeout }
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    /// Open the static generation and fill it from the network.
    ///
    /// Population races the install deadline. If the deadline wins, install
    /// completes anyway and population keeps running in the background.
    /// Each asset is fetched with [`CacheMode::Reload`]; a failed asset is
    /// counted and skipped.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        tracing::info!(cache = %self.names.static_assets, assets = self.static_assets.len(), "installing");

        self.cache.open(&self.names.static_assets).await?;

        let progress = Arc::new(Progress::default());
        let mut population = tokio::spawn(populate(
            Arc::clone(&self.cache),
            Arc::clone(&self.fetcher),
            self.names.static_assets.clone(),
            self.static_assets.clone(),
            Arc::clone(&progress),
        ));

        let timed_out = match tokio::time::timeout(self.install_timeout, &mut population).await {
            Ok(Ok(())) => false,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "static population task failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.install_timeout.as_millis() as u64,
                    "install deadline reached, finishing population in background"
                );
                true
            }
        };

        self.hub.skip_waiting().await?;

        let report = InstallReport {
            cached: progress.cached.load(Ordering::SeqCst),
            failed: progress.failed.load(Ordering::SeqCst),
            timed_out,
        };
        tracing::info!(cached = report.cached, failed = report.failed, timed_out, "install finished");
        Ok(report)
    }

    /// Delete every generation outside the current set and take over all
    /// open sessions. Both must finish before activation completes.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let sweep = async {
            let stale: Vec<String> = self
                .cache
                .names()
                .await?
                .into_iter()
                .filter(|name| !self.names.is_current(name))
                .collect();
            self.delete_all(&stale).await?;
            Ok::<_, Error>(stale)
        };

        let (deleted, ()) = tokio::try_join!(sweep, self.hub.claim())?;

        tracing::info!(deleted = ?deleted, "activated");
        Ok(ActivateReport { deleted })
    }

    /// Delete every generation regardless of name.
    pub async fn clear_all(&self) -> Result<Vec<String>, Error> {
        let names = self.cache.names().await?;
        self.delete_all(&names).await?;
        tracing::info!(deleted = names.len(), "cleared all caches");
        Ok(names)
    }

    async fn delete_all(&self, names: &[String]) -> Result<(), Error> {
        let results = join_all(names.iter().map(|name| self.cache.delete(name))).await;
        for result in results {
            result?;
        }
        Ok(())
    }
}

async fn populate(
    cache: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, name: String, assets: Vec<Url>, progress: Arc<Progress>,
) {
    let fetches = assets.into_iter().map(|url| {
        let cache = Arc::clone(&cache);
        let fetcher = Arc::clone(&fetcher);
        let progress = Arc::clone(&progress);
        let name = name.as_str();
        async move {
            let request = Request::get(url).with_cache(CacheMode::Reload);
            let key = RequestKey::from(&request.url);
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_ok() => match cache.put(name, &key, response).await {
                    Ok(()) => {
                        progress.cached.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => {
                        tracing::warn!(url = %key, error = %e, "failed to store static asset");
                        progress.failed.fetch_add(1, Ordering::SeqCst);
                    }
                },
                Ok(response) => {
                    tracing::warn!(url = %key, status = response.status, "static asset returned error status");
                    progress.failed.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    tracing::warn!(url = %key, error = %e, "failed to fetch static asset");
                    progress.failed.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
    });

    join_all(fetches).await;
}
