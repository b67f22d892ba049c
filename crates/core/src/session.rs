//! Page-session seam: broadcasts, takeover and replacement signals.

use async_trait::async_trait;

use crate::Error;
use crate::control::OutboundMessage;

/// The set of page sessions governed by this proxy instance.
#[async_trait]
pub trait SessionHub: Send + Sync {
    /// Post `message` to every open session.
    async fn broadcast(&self, message: &OutboundMessage) -> Result<(), Error>;

    /// Take control of every open session, including ones loaded by a
    /// previous proxy version.
    async fn claim(&self) -> Result<(), Error>;

    /// Ask the platform to activate this instance without waiting for the
    /// previous one to lose its last session.
    async fn skip_waiting(&self) -> Result<(), Error>;
}
