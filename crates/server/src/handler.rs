//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the proxy's event handlers.
use crate::state::ProxyState;
use crate::tools::{
    ProxyControlParams, ProxyFetchParams, ProxyLifecycleParams, ProxyNotificationClickParams, ProxyPushParams,
    ProxySyncParams, control, fetch, lifecycle, notify, status, sync,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for harbor.
#[derive(Clone)]
pub struct HarborServer {
    state: ProxyState,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl HarborServer {
    /// Create a new server handler.
    pub fn new(state: ProxyState) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Route a request through the offline proxy. Returns the response with the strategy and source that produced it."
    )]
    async fn proxy_fetch(&self, params: Parameters<ProxyFetchParams>) -> Result<CallToolResult, McpError> {
        fetch::fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver an install or activate lifecycle event. Returns the install or activation report.")]
    async fn proxy_lifecycle(&self, params: Parameters<ProxyLifecycleParams>) -> Result<CallToolResult, McpError> {
        lifecycle::lifecycle_impl(&self.state, params.0).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING, GET_VERSION, CLEAR_CACHE) to the proxy.")]
    async fn proxy_control(&self, params: Parameters<ProxyControlParams>) -> Result<CallToolResult, McpError> {
        control::control_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver a background-sync or periodic-sync event by tag.")]
    async fn proxy_sync(&self, params: Parameters<ProxySyncParams>) -> Result<CallToolResult, McpError> {
        sync::sync_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver a push message. Returns the notification to display.")]
    async fn proxy_push(&self, params: Parameters<ProxyPushParams>) -> Result<CallToolResult, McpError> {
        notify::push_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver a notification click. Returns the page to focus or open, if any.")]
    async fn proxy_notification_click(
        &self, params: Parameters<ProxyNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notify::notification_click_impl(&self.state, params.0).await
    }

    #[tool(description = "Report cache generations, session state and pending retries, and drain queued messages.")]
    async fn proxy_status(&self) -> Result<CallToolResult, McpError> {
        status::status_impl(&self.state).await
    }
}

impl ServerHandler for HarborServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "harbor".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
