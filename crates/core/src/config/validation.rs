//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

/// Bounds shared by both timers.
const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 300_000;

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_prefix`, `cache_version` or `user_agent` is empty
    /// - a timeout is below 100ms or exceeds 5 minutes
    /// - `origin` or `sync_endpoint` do not form an http(s) URL
    /// - the retry policy is unbounded or inverted
    ///
    /// Returns `ConfigError::Missing` if `static_assets` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("cache_prefix", &self.cache_prefix),
            ("cache_version", &self.cache_version),
            ("user_agent", &self.user_agent),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
        }

        let timers = [("network_timeout_ms", self.network_timeout_ms), ("install_timeout_ms", self.install_timeout_ms)];
        for (field, value) in timers {
            if value < MIN_TIMEOUT_MS {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
            }
            if value > MAX_TIMEOUT_MS {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        let origin = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL".into() });
        }

        let endpoint = origin
            .join(&self.sync_endpoint)
            .map_err(|e| ConfigError::Invalid { field: "sync_endpoint".into(), reason: e.to_string() })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "sync_endpoint".into(),
                reason: "must be an http(s) URL".into(),
            });
        }

        if self.static_assets.is_empty() {
            return Err(ConfigError::Missing {
                field: "static_assets".into(),
                hint: "list the application shell assets in the config file".into(),
            });
        }

        if self.retry_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "retry_max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(ConfigError::Invalid {
                field: "retry_base_delay_ms".into(),
                reason: "must not exceed retry_max_delay_ms".into(),
            });
        }

        if !self.static_assets.contains(&self.offline_document) {
            tracing::warn!(
                offline_document = %self.offline_document,
                "offline_document is not a static asset; failed navigations fall back to the built-in page"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version() {
        let config = AppConfig { cache_version: " ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_network_timeout_too_small() {
        let config = AppConfig { network_timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "network_timeout_ms"));
    }

    #[test]
    fn test_validate_install_timeout_exceeds_limit() {
        let config = AppConfig { install_timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "install_timeout_ms"));
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "ftp://files.example".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_absolute_sync_endpoint() {
        let config = AppConfig { sync_endpoint: "https://sync.example/api/sync".into(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_static_assets() {
        let config = AppConfig { static_assets: Vec::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "static_assets"));
    }

    #[test]
    fn test_validate_zero_retry_attempts() {
        let config = AppConfig { retry_max_attempts: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "retry_max_attempts"));
    }

    #[test]
    fn test_validate_inverted_retry_delays() {
        let config = AppConfig { retry_base_delay_ms: 10_000, retry_max_delay_ms: 1_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "retry_base_delay_ms"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { network_timeout_ms: 100, install_timeout_ms: 300_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
