//! Named cache generations.
//!
//! A generation is a named, versioned collection of `RequestKey -> Response`
//! entries. The engine only talks to generations through [`CacheStore`], so
//! hosts can plug in their own persistence. Two backends ship here:
//!
//! - [`MemoryCacheStore`] for embedding and tests
//! - [`CacheDb`], SQLite via tokio-rusqlite with migrations and WAL mode
//!
//! Entries are overwritten wholesale on `put` (last writer for a key wins).

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;

use async_trait::async_trait;

pub use crate::Error;
use crate::config::AppConfig;
use crate::http::{RequestKey, Response};

pub use connection::CacheDb;
pub use memory::MemoryCacheStore;

/// Persistent store of named cache generations.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open the generation `name`, creating it if it does not exist.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Look up `key` in generation `name`. A missing generation is a miss.
    async fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Store `response` under `key`, replacing any previous entry.
    ///
    /// Opens the generation implicitly.
    async fn put(&self, name: &str, key: &RequestKey, response: Response) -> Result<(), Error>;

    /// Delete a whole generation. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Names of every existing generation.
    async fn names(&self) -> Result<Vec<String>, Error>;

    /// Keys stored in generation `name`.
    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, Error>;
}

/// The current generation names, derived once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    /// Pre-enumerated shell assets, filled at install.
    pub static_assets: String,
    /// Runtime-populated entries.
    pub dynamic: String,
    /// Umbrella version marker, only compared during activation.
    pub umbrella: String,
}

impl CacheNames {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            static_assets: format!("{prefix}-static-{version}"),
            dynamic: format!("{prefix}-dynamic-{version}"),
            umbrella: format!("{prefix}-{version}"),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.cache_prefix, &config.cache_version)
    }

    /// Whether `name` belongs to the current version set.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_assets || name == self.dynamic || name == self.umbrella
    }
}
