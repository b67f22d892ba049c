//! Request routing: picks exactly one caching strategy per GET request.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. non-GET: not intercepted
//! 2. static asset literal: cache-first
//! 3. dynamic prefix: stale-while-revalidate
//! 4. third-party API marker in the URL: network-first
//! 5. document destination: network-first with offline fallback
//! 6. anything else: network-first

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::config::AppConfig;
use crate::http::{Destination, Method, Request, RequestKey};

/// One of the four request-handling policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    NetworkFirstWithOfflineFallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache_first",
            Strategy::NetworkFirst => "network_first",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
            Strategy::NetworkFirstWithOfflineFallback => "network_first_with_offline_fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Forward untouched; no cache is read or written.
    Passthrough,
    Intercept(Strategy),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Prefix {
    Url(String),
    Path(String),
}

/// Immutable pattern table built once from configuration.
#[derive(Debug, Clone)]
pub struct RouteTable {
    origin: Url,
    static_assets: Vec<RequestKey>,
    dynamic_prefixes: Vec<Prefix>,
    api_markers: Vec<String>,
}

impl RouteTable {
    /// Build the table, resolving relative asset paths against the origin.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin)?;

        let static_assets = config
            .static_assets
            .iter()
            .map(|asset| -> Result<RequestKey, Error> { Ok(RequestKey::from(&origin.join(asset)?)) })
            .collect::<Result<Vec<_>, Error>>()?;

        let dynamic_prefixes = config
            .dynamic_prefixes
            .iter()
            .map(|p| if p.contains("://") { Prefix::Url(p.clone()) } else { Prefix::Path(p.clone()) })
            .collect();

        Ok(Self { origin, static_assets, dynamic_prefixes, api_markers: config.api_markers.clone() })
    }

    /// Select the route for `request`. Pure; every GET gets a strategy.
    pub fn classify(&self, request: &Request) -> Route {
        if request.method != Method::Get {
            return Route::Passthrough;
        }

        let key = request.key();
        let strategy = if self.is_static_asset(&key) {
            Strategy::CacheFirst
        } else if self.is_dynamic(&request.url, &key) {
            Strategy::StaleWhileRevalidate
        } else if self.is_api(&key) {
            Strategy::NetworkFirst
        } else if request.destination == Destination::Document {
            Strategy::NetworkFirstWithOfflineFallback
        } else {
            Strategy::NetworkFirst
        };

        Route::Intercept(strategy)
    }

    fn is_static_asset(&self, key: &RequestKey) -> bool {
        self.static_assets.contains(key)
    }

    fn is_dynamic(&self, url: &Url, key: &RequestKey) -> bool {
        self.dynamic_prefixes.iter().any(|prefix| match prefix {
            Prefix::Url(p) => key.as_str().starts_with(p.as_str()),
            Prefix::Path(p) => url.origin() == self.origin.origin() && url.path().starts_with(p.as_str()),
        })
    }

    fn is_api(&self, key: &RequestKey) -> bool {
        self.api_markers.iter().any(|m| key.as_str().contains(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestMode;

    fn table() -> RouteTable {
        let config = AppConfig {
            dynamic_prefixes: vec!["/images/".into(), "https://cdn.example/media/".into()],
            ..Default::default()
        };
        RouteTable::from_config(&config).unwrap()
    }

    fn get(s: &str) -> Request {
        Request::get(Url::parse(s).unwrap())
    }

    #[test]
    fn test_non_get_passes_through() {
        let t = table();
        for method in [Method::Post, Method::Put, Method::Delete, Method::Head] {
            let req = get("http://localhost:8080/index.html").with_method(method);
            assert_eq!(t.classify(&req), Route::Passthrough);
        }
    }

    #[test]
    fn test_static_asset_is_cache_first() {
        let t = table();
        assert_eq!(t.classify(&get("http://localhost:8080/js/app.js")), Route::Intercept(Strategy::CacheFirst));
        assert_eq!(
            t.classify(&get("http://localhost:8080/index.html#section")),
            Route::Intercept(Strategy::CacheFirst)
        );
    }

    #[test]
    fn test_static_wins_over_navigation() {
        let t = table();
        let req = Request::navigate(Url::parse("http://localhost:8080/").unwrap());
        assert_eq!(t.classify(&req), Route::Intercept(Strategy::CacheFirst));
    }

    #[test]
    fn test_static_literal_requires_same_origin() {
        let t = table();
        assert_eq!(t.classify(&get("https://elsewhere.example/js/app.js")), Route::Intercept(Strategy::NetworkFirst));
    }

    #[test]
    fn test_dynamic_prefix_is_stale_while_revalidate() {
        let t = table();
        assert_eq!(
            t.classify(&get("http://localhost:8080/images/logo.png")),
            Route::Intercept(Strategy::StaleWhileRevalidate)
        );
        assert_eq!(
            t.classify(&get("https://cdn.example/media/clip.mp4")),
            Route::Intercept(Strategy::StaleWhileRevalidate)
        );
    }

    #[test]
    fn test_api_marker_is_network_first() {
        let t = table();
        assert_eq!(
            t.classify(&get("https://fonts.googleapis.com/css2?family=Inter")),
            Route::Intercept(Strategy::NetworkFirst)
        );
        let nav = Request::navigate(Url::parse("https://myapp.firebaseapp.com/login").unwrap());
        assert_eq!(t.classify(&nav), Route::Intercept(Strategy::NetworkFirst));
    }

    #[test]
    fn test_document_is_offline_fallback() {
        let t = table();
        let req = get("http://localhost:8080/tournaments/42")
            .with_destination(Destination::Document)
            .with_mode(RequestMode::Navigate);
        assert_eq!(t.classify(&req), Route::Intercept(Strategy::NetworkFirstWithOfflineFallback));
    }

    #[test]
    fn test_default_is_network_first() {
        let t = table();
        let req = get("http://localhost:8080/api/standings").with_destination(Destination::Empty);
        assert_eq!(t.classify(&req), Route::Intercept(Strategy::NetworkFirst));
    }

    #[test]
    fn test_every_get_is_intercepted() {
        let t = table();
        for url in [
            "http://localhost:8080/",
            "http://localhost:8080/anything",
            "https://third.party/x.js",
            "http://localhost:8080/images/",
        ] {
            assert!(matches!(t.classify(&get(url)), Route::Intercept(_)), "{url} was not intercepted");
        }
    }
}
