//! Control channel between page sessions and the proxy.
//!
//! Messages are JSON objects tagged by `type`. Unknown commands decode to
//! [`ControlCommand::Unknown`] and are ignored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::Error;
use crate::lifecycle::CacheLifecycle;
use crate::session::SessionHub;
use crate::sync::SyncDomain;

/// Commands a page session can send to the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlCommand {
    /// Activate the waiting instance now.
    SkipWaiting,
    /// Report the cache version.
    GetVersion,
    /// Delete every cache generation.
    ClearCache,
    #[serde(other)]
    Unknown,
}

impl ControlCommand {
    /// Decode a raw message; anything unrecognised is `Unknown`.
    pub fn decode(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or(ControlCommand::Unknown)
    }
}

/// Messages the proxy posts to page sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    SyncSuccess { domain: SyncDomain },
    CacheUpdated { version: String },
    OfflineReady,
    Version { version: String },
    CacheCleared { deleted: Vec<String> },
}

/// Handles control commands, one consumer per message.
#[derive(Clone)]
pub struct ControlChannel {
    lifecycle: Arc<CacheLifecycle>,
    hub: Arc<dyn SessionHub>,
    version: String,
}

impl ControlChannel {
    pub fn new(lifecycle: Arc<CacheLifecycle>, hub: Arc<dyn SessionHub>, version: impl Into<String>) -> Self {
        Self { lifecycle, hub, version: version.into() }
    }

    /// Handle `command`. `reply` answers the sender directly; without one,
    /// replies are broadcast.
    pub async fn handle(
        &self, command: ControlCommand, reply: Option<oneshot::Sender<OutboundMessage>>,
    ) -> Result<(), Error> {
        match command {
            ControlCommand::SkipWaiting => {
                tracing::info!("skip waiting requested");
                self.hub.skip_waiting().await
            }
            ControlCommand::GetVersion => {
                let message = OutboundMessage::Version { version: self.version.clone() };
                match reply {
                    Some(reply) => {
                        if reply.send(message).is_err() {
                            tracing::debug!("version requester went away");
                        }
                        Ok(())
                    }
                    None => self.hub.broadcast(&message).await,
                }
            }
            ControlCommand::ClearCache => {
                let deleted = self.lifecycle.clear_all().await?;
                self.hub.broadcast(&OutboundMessage::CacheCleared { deleted }).await
            }
            ControlCommand::Unknown => {
                tracing::debug!("ignoring unknown control command");
                Ok(())
            }
        }
    }
}
