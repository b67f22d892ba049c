//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HARBOR_*)
//! 2. TOML config file (if HARBOR_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The loaded config is read once at startup; the route table and cache
//! names derived from it never change while the proxy runs.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HARBOR_*)
/// 2. TOML config file (if HARBOR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prefix shared by every cache generation name.
    ///
    /// Set via HARBOR_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag; bumping it supersedes every existing generation.
    ///
    /// Set via HARBOR_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin the relative asset paths and sync endpoint resolve against.
    ///
    /// Set via HARBOR_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Pre-enumerated assets cached at install and served cache-first.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// URL or path prefixes served stale-while-revalidate.
    #[serde(default = "default_dynamic_prefixes")]
    pub dynamic_prefixes: Vec<String>,

    /// Substrings marking third-party API hosts (always network-first).
    #[serde(default = "default_api_markers")]
    pub api_markers: Vec<String>,

    /// Document served to failed navigations with no cached copy.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Page opened when a notification is clicked without a target URL.
    #[serde(default = "default_app_root")]
    pub app_root: String,

    /// Network-first race timeout in milliseconds.
    ///
    /// Set via HARBOR_NETWORK_TIMEOUT_MS environment variable.
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,

    /// Install population deadline in milliseconds.
    ///
    /// Set via HARBOR_INSTALL_TIMEOUT_MS environment variable.
    #[serde(default = "default_install_timeout_ms")]
    pub install_timeout_ms: u64,

    /// Endpoint receiving sync batches, absolute or relative to `origin`.
    ///
    /// Set via HARBOR_SYNC_ENDPOINT environment variable.
    #[serde(default = "default_sync_endpoint")]
    pub sync_endpoint: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via HARBOR_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Path to SQLite cache store.
    ///
    /// Set via HARBOR_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Registrations allowed per retry tag before it is dropped.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Delay before the first retry, doubled on each further attempt.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound on the retry delay.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_cache_prefix() -> String {
    "harbor".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/offline.html",
        "/manifest.json",
        "/css/styles.css",
        "/js/app.js",
        "/js/db.js",
        "/icons/icon-192x192.png",
        "/icons/icon-512x512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_dynamic_prefixes() -> Vec<String> {
    vec!["/images/".into(), "/data/".into()]
}

fn default_api_markers() -> Vec<String> {
    vec!["firebase".into(), "googleapis".into()]
}

fn default_offline_document() -> String {
    "/offline.html".into()
}

fn default_app_root() -> String {
    "/".into()
}

fn default_network_timeout_ms() -> u64 {
    5_000
}

fn default_install_timeout_ms() -> u64 {
    10_000
}

fn default_sync_endpoint() -> String {
    "/api/sync".into()
}

fn default_user_agent() -> String {
    "harbor/0.1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./harbor-cache.sqlite")
}

fn default_retry_max_attempts() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    30_000
}

fn default_retry_max_delay_ms() -> u64 {
    3_600_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            static_assets: default_static_assets(),
            dynamic_prefixes: default_dynamic_prefixes(),
            api_markers: default_api_markers(),
            offline_document: default_offline_document(),
            app_root: default_app_root(),
            network_timeout_ms: default_network_timeout_ms(),
            install_timeout_ms: default_install_timeout_ms(),
            sync_endpoint: default_sync_endpoint(),
            user_agent: default_user_agent(),
            db_path: default_db_path(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Network-first race timeout as Duration for use with tokio.
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_millis(self.install_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    /// Resolve an absolute URL or an origin-relative path.
    pub fn resolve(&self, path: &str) -> Result<Url, crate::Error> {
        let origin = Url::parse(&self.origin)?;
        Ok(origin.join(path)?)
    }

    pub fn sync_endpoint_url(&self) -> Result<Url, crate::Error> {
        self.resolve(&self.sync_endpoint)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HARBOR_`
    /// 2. TOML file from `HARBOR_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HARBOR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HARBOR_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::from_figment(figment)
    }

    /// Extract and validate a config from an already-assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_prefix, "harbor");
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.network_timeout_ms, 5_000);
        assert_eq!(config.install_timeout_ms, 10_000);
        assert_eq!(config.offline_document, "/offline.html");
        assert_eq!(config.api_markers, vec!["firebase".to_string(), "googleapis".to_string()]);
        assert!(config.static_assets.contains(&"/offline.html".to_string()));
        assert_eq!(config.db_path, PathBuf::from("./harbor-cache.sqlite"));
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.network_timeout(), Duration::from_millis(5_000));
        assert_eq!(config.install_timeout(), Duration::from_millis(10_000));
        assert_eq!(config.retry_base_delay(), Duration::from_secs(30));
        assert_eq!(config.retry_max_delay(), Duration::from_secs(3600));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = AppConfig::default();
        assert_eq!(config.resolve("/index.html").unwrap().as_str(), "http://localhost:8080/index.html");
        assert_eq!(
            config.resolve("https://cdn.example/lib.js").unwrap().as_str(),
            "https://cdn.example/lib.js"
        );
        assert_eq!(config.sync_endpoint_url().unwrap().path(), "/api/sync");
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            cache_version = "v7"
            network_timeout_ms = 2500
            dynamic_prefixes = ["/feeds/"]
            "#,
        ));

        let config = AppConfig::from_figment(figment).unwrap();
        assert_eq!(config.cache_version, "v7");
        assert_eq!(config.network_timeout_ms, 2500);
        assert_eq!(config.dynamic_prefixes, vec!["/feeds/".to_string()]);
        assert_eq!(config.cache_prefix, "harbor");
    }

    #[test]
    fn test_invalid_layer_fails_validation() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("network_timeout_ms = 5"));
        let result = AppConfig::from_figment(figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "network_timeout_ms"));
    }
}
