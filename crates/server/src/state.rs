//! Shared state handed to every tool call.

use std::sync::Arc;

use harbor_core::{
    AppConfig, BoundedRetryScheduler, CacheStore, Collaborators, Error, Fetcher, LocalDataStore, RetryPolicy,
    ServiceProxy,
};

use crate::session::OutboxHub;

#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<AppConfig>,
    pub proxy: Arc<ServiceProxy>,
    /// Used directly for requests the proxy does not intercept.
    pub fetcher: Arc<dyn Fetcher>,
    pub hub: Arc<OutboxHub>,
    pub scheduler: Arc<BoundedRetryScheduler>,
}

impl ProxyState {
    pub fn build(
        config: AppConfig, cache: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, data: Arc<dyn LocalDataStore>,
    ) -> Result<Self, Error> {
        let hub = Arc::new(OutboxHub::new());
        let scheduler = Arc::new(BoundedRetryScheduler::new(RetryPolicy::from_config(&config)));

        let proxy = ServiceProxy::new(
            &config,
            Collaborators {
                cache,
                fetcher: Arc::clone(&fetcher),
                hub: hub.clone(),
                scheduler: scheduler.clone(),
                data,
            },
        )?;

        Ok(Self { config: Arc::new(config), proxy: Arc::new(proxy), fetcher, hub, scheduler })
    }
}
