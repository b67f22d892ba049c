//! Core engine for harbor, an offline-support proxy.
//!
//! This crate provides:
//! - Request routing and the four caching strategies
//! - Cache generation lifecycle (install, activate, clear)
//! - Background sync with bounded retries
//! - The control channel shared with page sessions
//! - Cache stores (in-memory and SQLite)
//! - Unified error types and configuration

pub mod cache;
pub mod config;
pub mod control;
pub mod error;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod proxy;
pub mod routing;
pub mod session;
pub mod strategy;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheDb, CacheNames, CacheStore, MemoryCacheStore};
pub use config::{AppConfig, ConfigError};
pub use control::{ControlCommand, OutboundMessage};
pub use error::Error;
pub use fetch::Fetcher;
pub use http::{CacheMode, Destination, Method, Request, RequestKey, RequestMode, Response};
pub use lifecycle::{ActivateReport, InstallReport};
pub use notify::Notification;
pub use proxy::{Collaborators, Event, EventOutput, FetchDisposition, ServiceProxy};
pub use routing::{Route, Strategy};
pub use session::SessionHub;
pub use strategy::{Outcome, Source};
pub use sync::{
    BoundedRetryScheduler, EmptyDataStore, LocalDataStore, RetryPolicy, RetryScheduler, SyncDomain, SyncOutcome,
};
