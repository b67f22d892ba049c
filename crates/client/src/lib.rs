//! Client code for harbor.
//!
//! This crate provides the network side of the proxy: an HTTP fetcher
//! implementing [`harbor_core::Fetcher`] on top of reqwest.

pub mod fetch;

pub use fetch::{FetchConfig, HttpFetcher};
