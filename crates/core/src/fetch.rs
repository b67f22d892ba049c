//! Network fetcher seam.

use async_trait::async_trait;

use crate::Error;
use crate::http::{Request, Response};

/// Performs HTTP requests on behalf of the engine.
///
/// A returned `Ok` carries any status the server sent, including 4xx/5xx.
/// `Err` is reserved for transport failures (`Error::Transport`,
/// `Error::Timeout`). Dropping the returned future abandons the request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
