//! proxy_control tool implementation.
//!
//! Posts a control message to the proxy the way a page session would.
//! Direct replies (the version answer) come back in the tool result;
//! broadcasts land in the outbox.

use harbor_core::{ControlCommand, OutboundMessage};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::json_result;
use crate::state::ProxyState;

/// Input parameters for the proxy_control tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyControlParams {
    /// Message type: "SKIP_WAITING", "GET_VERSION" or "CLEAR_CACHE".
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct ProxyControlOutput {
    /// False for unrecognised message types, which are ignored.
    pub recognised: bool,
    pub reply: Option<OutboundMessage>,
}

/// Implementation of the proxy_control tool.
pub async fn control_impl(state: &ProxyState, params: ProxyControlParams) -> Result<CallToolResult, McpError> {
    let command = ControlCommand::decode(serde_json::json!({ "type": params.kind }));
    let recognised = command != ControlCommand::Unknown;

    let (tx, rx) = oneshot::channel();
    state.proxy.handle_message(command, Some(tx)).await?;

    let output = ProxyControlOutput { recognised, reply: rx.await.ok() };
    json_result(&output)
}
