//! proxy_status tool implementation.
//!
//! Reports the cache generation in use and drains queued session messages.

use harbor_core::OutboundMessage;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use super::json_result;
use crate::state::ProxyState;

#[derive(Debug, Serialize)]
pub struct ProxyStatusOutput {
    pub version: String,
    pub static_cache: String,
    pub dynamic_cache: String,
    pub claimed: bool,
    pub skip_waiting_requests: usize,
    pub pending_retries: Vec<String>,
    /// Broadcasts queued since the previous call, oldest first.
    pub messages: Vec<OutboundMessage>,
}

/// Implementation of the proxy_status tool.
pub async fn status_impl(state: &ProxyState) -> Result<CallToolResult, McpError> {
    let names = state.proxy.cache_names();
    let output = ProxyStatusOutput {
        version: state.proxy.version().to_string(),
        static_cache: names.static_assets.clone(),
        dynamic_cache: names.dynamic.clone(),
        claimed: state.hub.claimed(),
        skip_waiting_requests: state.hub.skip_requests(),
        pending_retries: state.scheduler.pending().await,
        messages: state.hub.drain().await,
    };
    json_result(&output)
}
