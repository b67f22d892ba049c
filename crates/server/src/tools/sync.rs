//! proxy_sync tool implementation.
//!
//! Delivers a background-sync or periodic-sync event by tag.

use harbor_core::SyncOutcome;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::ProxyState;

/// Input parameters for the proxy_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxySyncParams {
    /// Sync tag, e.g. "sync-tournaments", "sync-players" or, when periodic, "content-sync".
    pub tag: String,

    /// Deliver as a periodic-sync event instead of a one-off sync.
    #[serde(default)]
    pub periodic: bool,
}

#[derive(Debug, Serialize)]
pub struct ProxySyncOutput {
    /// One entry per domain attempted; empty for unknown tags.
    pub outcomes: Vec<SyncOutcome>,
    /// Tags waiting on the retry scheduler after this attempt.
    pub pending_retries: Vec<String>,
}

/// Implementation of the proxy_sync tool.
pub async fn sync_impl(state: &ProxyState, params: ProxySyncParams) -> Result<CallToolResult, McpError> {
    let outcomes = if params.periodic {
        state.proxy.handle_periodic_sync(&params.tag).await
    } else {
        state.proxy.handle_sync(&params.tag).await.into_iter().collect()
    };

    let output = ProxySyncOutput { outcomes, pending_retries: state.scheduler.pending().await };
    json_result(&output)
}
