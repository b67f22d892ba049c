//! Session hub for stdio hosts.
//!
//! There is no page to post to over stdio, so broadcasts queue in an outbox
//! that the host drains through the `proxy_status` tool.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use harbor_core::{Error, OutboundMessage, SessionHub};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct OutboxHub {
    outbox: Mutex<Vec<OutboundMessage>>,
    claimed: AtomicBool,
    skip_requests: AtomicUsize,
}

impl OutboxHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued message, oldest first.
    pub async fn drain(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.outbox.lock().await)
    }

    /// Whether the proxy has claimed its sessions.
    pub fn claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    pub fn skip_requests(&self) -> usize {
        self.skip_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionHub for OutboxHub {
    async fn broadcast(&self, message: &OutboundMessage) -> Result<(), Error> {
        tracing::debug!(?message, "queued outbound message");
        self.outbox.lock().await.push(message.clone());
        Ok(())
    }

    async fn claim(&self) -> Result<(), Error> {
        self.claimed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
