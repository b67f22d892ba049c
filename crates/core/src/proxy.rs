//! Event dispatch for one proxy instance.
//!
//! The host owns the event loop and calls one handler per platform event;
//! [`ServiceProxy::dispatch`] offers the same thing as a single entry point.

use std::sync::Arc;

use tokio::sync::oneshot;
use url::Url;

use crate::Error;
use crate::cache::{CacheNames, CacheStore};
use crate::config::AppConfig;
use crate::control::{ControlChannel, ControlCommand, OutboundMessage};
use crate::fetch::Fetcher;
use crate::http::{Request, RequestKey};
use crate::lifecycle::{ActivateReport, CacheLifecycle, InstallReport};
use crate::notify::{Notification, click_target};
use crate::routing::{Route, RouteTable};
use crate::session::SessionHub;
use crate::strategy::{Outcome, StrategyEngine};
use crate::sync::{LocalDataStore, PERIODIC_CONTENT_TAG, RetryScheduler, SyncCoordinator, SyncDomain, SyncOutcome};

/// External collaborators the proxy is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub cache: Arc<dyn CacheStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub hub: Arc<dyn SessionHub>,
    pub scheduler: Arc<dyn RetryScheduler>,
    pub data: Arc<dyn LocalDataStore>,
}

/// What to do with an intercepted request.
#[derive(Debug)]
pub enum FetchDisposition {
    /// Not intercepted; the host forwards the request unmodified.
    Passthrough,
    Respond(Outcome),
}

/// Platform lifecycle events.
#[derive(Debug)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Sync { tag: String },
    PeriodicSync { tag: String },
    Push { payload: Option<String> },
    NotificationClick { action: Option<String>, url: Option<String> },
    Message { command: ControlCommand, reply: Option<oneshot::Sender<OutboundMessage>> },
    Error { message: String },
}

/// Result of dispatching an [`Event`].
#[derive(Debug)]
pub enum EventOutput {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchDisposition),
    Synced(Vec<SyncOutcome>),
    ShowNotification(Notification),
    OpenWindow(Option<Url>),
    Handled,
}

/// One proxy instance: routing, strategies, lifecycle, sync and control.
pub struct ServiceProxy {
    routes: RouteTable,
    engine: StrategyEngine,
    lifecycle: Arc<CacheLifecycle>,
    sync: SyncCoordinator,
    control: ControlChannel,
    hub: Arc<dyn SessionHub>,
    version: String,
    app_root: Url,
}

impl ServiceProxy {
    /// Build a proxy from validated configuration.
    pub fn new(config: &AppConfig, parts: Collaborators) -> Result<Self, Error> {
        let routes = RouteTable::from_config(config)?;
        let names = CacheNames::from_config(config);

        let static_assets = config
            .static_assets
            .iter()
            .map(|asset| config.resolve(asset))
            .collect::<Result<Vec<_>, _>>()?;
        let offline_document = RequestKey::from(&config.resolve(&config.offline_document)?);

        let engine = StrategyEngine::new(
            Arc::clone(&parts.cache),
            Arc::clone(&parts.fetcher),
            names.clone(),
            offline_document,
            config.network_timeout(),
        );
        let lifecycle = Arc::new(CacheLifecycle::new(
            Arc::clone(&parts.cache),
            Arc::clone(&parts.fetcher),
            Arc::clone(&parts.hub),
            names,
            static_assets,
            config.install_timeout(),
        ));
        let sync = SyncCoordinator::new(
            parts.data,
            Arc::clone(&parts.fetcher),
            Arc::clone(&parts.hub),
            parts.scheduler,
            config.sync_endpoint_url()?,
        );
        let control = ControlChannel::new(Arc::clone(&lifecycle), Arc::clone(&parts.hub), config.cache_version.clone());

        Ok(Self {
            routes,
            engine,
            lifecycle,
            sync,
            control,
            hub: parts.hub,
            version: config.cache_version.clone(),
            app_root: config.resolve(&config.app_root)?,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn cache_names(&self) -> &CacheNames {
        self.lifecycle.names()
    }

    pub async fn dispatch(&self, event: Event) -> Result<EventOutput, Error> {
        let output = match event {
            Event::Install => EventOutput::Installed(self.handle_install().await?),
            Event::Activate => EventOutput::Activated(self.handle_activate().await?),
            Event::Fetch(request) => EventOutput::Fetched(self.handle_fetch(request).await),
            Event::Sync { tag } => EventOutput::Synced(self.handle_sync(&tag).await.into_iter().collect()),
            Event::PeriodicSync { tag } => EventOutput::Synced(self.handle_periodic_sync(&tag).await),
            Event::Push { payload } => EventOutput::ShowNotification(self.handle_push(payload.as_deref())),
            Event::NotificationClick { action, url } => {
                EventOutput::OpenWindow(self.handle_notification_click(action.as_deref(), url.as_deref()))
            }
            Event::Message { command, reply } => {
                self.handle_message(command, reply).await?;
                EventOutput::Handled
            }
            Event::Error { message } => {
                self.report_error(&message);
                EventOutput::Handled
            }
        };
        Ok(output)
    }

    /// Route `request` through its strategy. Non-GET requests are not touched.
    pub async fn handle_fetch(&self, request: Request) -> FetchDisposition {
        match self.routes.classify(&request) {
            Route::Passthrough => {
                tracing::debug!(method = %request.method, url = %request.url, "passthrough");
                FetchDisposition::Passthrough
            }
            Route::Intercept(strategy) => FetchDisposition::Respond(self.engine.execute(strategy, &request).await),
        }
    }

    pub async fn handle_install(&self) -> Result<InstallReport, Error> {
        let report = self.lifecycle.install().await?;
        self.notify(&OutboundMessage::OfflineReady).await;
        Ok(report)
    }

    pub async fn handle_activate(&self) -> Result<ActivateReport, Error> {
        let report = self.lifecycle.activate().await?;
        self.notify(&OutboundMessage::CacheUpdated { version: self.version.clone() }).await;
        Ok(report)
    }

    /// Background-sync event. Unknown tags are ignored.
    pub async fn handle_sync(&self, tag: &str) -> Option<SyncOutcome> {
        match SyncDomain::from_tag(tag) {
            Some(domain) => Some(self.sync.sync(domain).await),
            None => {
                tracing::debug!(tag, "ignoring unknown sync tag");
                None
            }
        }
    }

    /// Periodic-sync event. The content tag syncs every domain.
    pub async fn handle_periodic_sync(&self, tag: &str) -> Vec<SyncOutcome> {
        if tag != PERIODIC_CONTENT_TAG {
            tracing::debug!(tag, "ignoring unknown periodic sync tag");
            return Vec::new();
        }

        let (tournaments, players) =
            tokio::join!(self.sync.sync(SyncDomain::Tournaments), self.sync.sync(SyncDomain::Players));
        vec![tournaments, players]
    }

    pub fn handle_push(&self, payload: Option<&str>) -> Notification {
        Notification::from_push(payload)
    }

    pub fn handle_notification_click(&self, action: Option<&str>, url: Option<&str>) -> Option<Url> {
        click_target(&self.app_root, action, url)
    }

    pub async fn handle_message(
        &self, command: ControlCommand, reply: Option<oneshot::Sender<OutboundMessage>>,
    ) -> Result<(), Error> {
        self.control.handle(command, reply).await
    }

    /// Runtime error or unhandled rejection raised in the host.
    pub fn report_error(&self, message: &str) {
        tracing::error!(message, "proxy runtime error");
    }

    async fn notify(&self, message: &OutboundMessage) {
        if let Err(e) = self.hub.broadcast(message).await {
            tracing::warn!(error = %e, "broadcast failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::http::{Method, Response};
    use crate::strategy::Source;
    use crate::sync::EmptyDataStore;
    use crate::test_support::{RecordingHub, RecordingScheduler, ScriptedFetcher};

    struct Fixture {
        cache: Arc<MemoryCacheStore>,
        fetcher: Arc<ScriptedFetcher>,
        hub: Arc<RecordingHub>,
        scheduler: Arc<RecordingScheduler>,
        proxy: ServiceProxy,
        config: AppConfig,
    }

    fn fixture() -> Fixture {
        let config = AppConfig {
            static_assets: vec!["/".into(), "/offline.html".into(), "/js/app.js".into()],
            ..Default::default()
        };
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let hub = Arc::new(RecordingHub::new());
        let scheduler = Arc::new(RecordingScheduler::new());
        let proxy = ServiceProxy::new(
            &config,
            Collaborators {
                cache: cache.clone(),
                fetcher: fetcher.clone(),
                hub: hub.clone(),
                scheduler: scheduler.clone(),
                data: Arc::new(EmptyDataStore),
            },
        )
        .unwrap();
        Fixture { cache, fetcher, hub, scheduler, proxy, config }
    }

    fn url(f: &Fixture, path: &str) -> Url {
        f.config.resolve(path).unwrap()
    }

    #[tokio::test]
    async fn test_non_get_is_never_intercepted() {
        let f = fixture();
        let req = Request::get(url(&f, "/js/app.js")).with_method(Method::Post);

        let disposition = f.proxy.handle_fetch(req).await;
        assert!(matches!(disposition, FetchDisposition::Passthrough));
        assert!(f.fetcher.requests().is_empty());
        assert!(f.cache.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_then_offline_navigation() {
        let f = fixture();
        for path in ["/", "/offline.html", "/js/app.js"] {
            f.fetcher.respond(&url(&f, path), Response::new(200, format!("asset {path}")));
        }

        let report = f.proxy.handle_install().await.unwrap();
        assert_eq!(report.cached, 3);
        assert_eq!(f.hub.messages(), vec![OutboundMessage::OfflineReady]);

        let page = url(&f, "/tournaments/1");
        f.fetcher.fail(&page);
        match f.proxy.handle_fetch(Request::navigate(page)).await {
            FetchDisposition::Respond(outcome) => {
                assert_eq!(outcome.source, Source::OfflineDocument);
                assert_eq!(outcome.response.text(), "asset /offline.html");
            }
            FetchDisposition::Passthrough => panic!("navigation was not intercepted"),
        }
    }

    #[tokio::test]
    async fn test_activate_broadcasts_cache_updated() {
        let f = fixture();
        f.cache.open("harbor-static-v0").await.unwrap();
        f.cache.open("harbor-static-v1").await.unwrap();

        let report = f.proxy.handle_activate().await.unwrap();
        assert_eq!(report.deleted, vec!["harbor-static-v0".to_string()]);
        assert_eq!(f.hub.messages(), vec![OutboundMessage::CacheUpdated { version: "v1".into() }]);
    }

    #[tokio::test]
    async fn test_sync_tags() {
        let f = fixture();
        let outcome = f.proxy.handle_sync("sync-players").await;
        assert_eq!(outcome, Some(SyncOutcome::NothingToSync { domain: SyncDomain::Players }));
        assert!(f.proxy.handle_sync("sync-unknown").await.is_none());

        let periodic = f.proxy.handle_periodic_sync(PERIODIC_CONTENT_TAG).await;
        assert_eq!(periodic.len(), 2);
        assert!(f.proxy.handle_periodic_sync("news").await.is_empty());
        assert!(f.fetcher.requests().is_empty());
        assert!(f.scheduler.registered().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_routes_events() {
        let f = fixture();
        let (tx, rx) = oneshot::channel();

        let output = f
            .proxy
            .dispatch(Event::Message { command: ControlCommand::GetVersion, reply: Some(tx) })
            .await
            .unwrap();
        assert!(matches!(output, EventOutput::Handled));
        assert_eq!(rx.await.unwrap(), OutboundMessage::Version { version: "v1".into() });

        let output = f.proxy.dispatch(Event::Push { payload: None }).await.unwrap();
        assert!(matches!(output, EventOutput::ShowNotification(_)));

        let output = f
            .proxy
            .dispatch(Event::NotificationClick { action: None, url: Some("/rounds/3".into()) })
            .await
            .unwrap();
        match output {
            EventOutput::OpenWindow(Some(target)) => assert_eq!(target.path(), "/rounds/3"),
            other => panic!("unexpected output: {other:?}"),
        }

        let output = f.proxy.dispatch(Event::Error { message: "boom".into() }).await.unwrap();
        assert!(matches!(output, EventOutput::Handled));
    }
}
