//! MCP tool implementations.
//!
//! Each tool feeds one platform event into the proxy and returns the
//! result as pretty-printed JSON.

pub mod control;
pub mod fetch;
pub mod lifecycle;
pub mod notify;
pub mod status;
pub mod sync;

pub use control::ProxyControlParams;
pub use fetch::ProxyFetchParams;
pub use lifecycle::ProxyLifecycleParams;
pub use notify::{ProxyNotificationClickParams, ProxyPushParams};
pub use sync::ProxySyncParams;

use harbor_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(Error::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
