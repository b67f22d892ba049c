//! Scripted collaborators shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::Error;
use crate::control::OutboundMessage;
use crate::fetch::Fetcher;
use crate::http::{Request, RequestKey, Response};
use crate::session::SessionHub;
use crate::sync::{LocalDataStore, RetryScheduler, SyncDomain};

#[derive(Debug, Clone)]
pub enum Script {
    Respond(Response),
    Delay(Duration, Response),
    Fail,
}

/// Fetcher answering from a per-URL script. Unscripted URLs fail.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<RequestKey, Script>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &Url, script: Script) {
        self.scripts.lock().unwrap().insert(RequestKey::from(url), script);
    }

    pub fn respond(&self, url: &Url, response: Response) {
        self.script(url, Script::Respond(response));
    }

    pub fn delay(&self, url: &Url, latency: Duration, response: Response) {
        self.script(url, Script::Delay(latency, response));
    }

    pub fn fail(&self, url: &Url) {
        self.script(url, Script::Fail);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &Url) -> usize {
        let key = RequestKey::from(url);
        self.requests.lock().unwrap().iter().filter(|r| r.key() == key).count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self.scripts.lock().unwrap().get(&request.key()).cloned();

        match script {
            Some(Script::Respond(response)) => Ok(response),
            Some(Script::Delay(latency, response)) => {
                tokio::time::sleep(latency).await;
                Ok(response)
            }
            Some(Script::Fail) | None => Err(Error::Transport(format!("unreachable: {}", request.url))),
        }
    }
}

/// Session hub that records everything it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingHub {
    messages: Mutex<Vec<OutboundMessage>>,
    claims: AtomicUsize,
    skips: AtomicUsize,
}

impl RecordingHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn skips(&self) -> usize {
        self.skips.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionHub for RecordingHub {
    async fn broadcast(&self, message: &OutboundMessage) -> Result<(), Error> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn claim(&self) -> Result<(), Error> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skips.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scheduler that only records registrations.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    registered: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetryScheduler for RecordingScheduler {
    async fn register(&self, tag: &str) -> Result<(), Error> {
        self.registered.lock().unwrap().push(tag.to_string());
        Ok(())
    }

    async fn complete(&self, tag: &str) {
        self.completed.lock().unwrap().push(tag.to_string());
    }
}

/// Data store returning preset batches.
#[derive(Debug, Default)]
pub struct FixedDataStore {
    batches: HashMap<SyncDomain, Vec<serde_json::Value>>,
}

impl FixedDataStore {
    pub fn with(mut self, domain: SyncDomain, batch: Vec<serde_json::Value>) -> Self {
        self.batches.insert(domain, batch);
        self
    }
}

#[async_trait]
impl LocalDataStore for FixedDataStore {
    async fn get_batch(&self, domain: SyncDomain) -> Result<Vec<serde_json::Value>, Error> {
        Ok(self.batches.get(&domain).cloned().unwrap_or_default())
    }
}
