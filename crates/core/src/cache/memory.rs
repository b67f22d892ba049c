//! In-process cache store.
//!
//! Uses a HashMap of generations behind a tokio RwLock. Nothing survives a
//! restart; hosts that need persistence use [`super::CacheDb`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CacheStore;
use crate::Error;
use crate::http::{RequestKey, Response};

type Generation = HashMap<RequestKey, Response>;

/// Cache store holding every generation in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    generations: Arc<RwLock<HashMap<String, Generation>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        generations.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let generations = self.generations.read().await;
        Ok(generations.get(name).and_then(|g| g.get(key)).cloned())
    }

    async fn put(&self, name: &str, key: &RequestKey, response: Response) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        generations
            .entry(name.to_string())
            .or_default()
            .insert(key.clone(), response);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut generations = self.generations.write().await;
        Ok(generations.remove(name).is_some())
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        let generations = self.generations.read().await;
        let mut names: Vec<String> = generations.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        let generations = self.generations.read().await;
        let mut keys: Vec<RequestKey> = generations
            .get(name)
            .map(|g| g.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}
