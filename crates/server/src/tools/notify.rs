//! proxy_push and proxy_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::ProxyState;

/// Input parameters for the proxy_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyPushParams {
    /// Push payload: JSON with title/body/url, or plain text.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Input parameters for the proxy_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyNotificationClickParams {
    /// Action button pressed, if any. "dismiss" opens nothing.
    #[serde(default)]
    pub action: Option<String>,

    /// Target URL carried by the notification.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProxyNotificationClickOutput {
    /// Window to focus or open.
    pub open: Option<String>,
}

/// Implementation of the proxy_push tool.
pub async fn push_impl(state: &ProxyState, params: ProxyPushParams) -> Result<CallToolResult, McpError> {
    json_result(&state.proxy.handle_push(params.payload.as_deref()))
}

/// Implementation of the proxy_notification_click tool.
pub async fn notification_click_impl(
    state: &ProxyState, params: ProxyNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let open = state
        .proxy
        .handle_notification_click(params.action.as_deref(), params.url.as_deref())
        .map(|url| url.to_string());
    json_result(&ProxyNotificationClickOutput { open })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, state};
    use serde_json::json;

    #[tokio::test]
    async fn test_push_json_payload() {
        let (state, _) = state();
        let params = ProxyPushParams { payload: Some(r#"{"title":"Final","body":"Table 1 is up"}"#.into()) };

        let out = output(&push_impl(&state, params).await.unwrap());
        assert_eq!(out, json!({"title": "Final", "body": "Table 1 is up", "url": null}));
    }

    #[tokio::test]
    async fn test_click_opens_resolved_url() {
        let (state, _) = state();
        let params = ProxyNotificationClickParams { action: None, url: Some("/players/7".into()) };

        let out = output(&notification_click_impl(&state, params).await.unwrap());
        assert_eq!(out["open"], "http://localhost:8080/players/7");
    }

    #[tokio::test]
    async fn test_dismiss_opens_nothing() {
        let (state, _) = state();
        let params = ProxyNotificationClickParams { action: Some("dismiss".into()), url: None };

        let out = output(&notification_click_impl(&state, params).await.unwrap());
        assert!(out["open"].is_null());
    }
}
