//! proxy_lifecycle tool implementation.
//!
//! Delivers install and activate events.

use harbor_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::ProxyState;

/// Input parameters for the proxy_lifecycle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyLifecycleParams {
    /// "install" or "activate".
    pub event: String,
}

/// Implementation of the proxy_lifecycle tool.
pub async fn lifecycle_impl(state: &ProxyState, params: ProxyLifecycleParams) -> Result<CallToolResult, McpError> {
    match params.event.as_str() {
        "install" => json_result(&state.proxy.handle_install().await?),
        "activate" => json_result(&state.proxy.handle_activate().await?),
        other => Err(Error::InvalidInput(format!("unknown lifecycle event: {other}")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubFetcher, output, state, state_with};
    use harbor_core::{OutboundMessage, Response};

    fn params(event: &str) -> ProxyLifecycleParams {
        ProxyLifecycleParams { event: event.into() }
    }

    #[tokio::test]
    async fn test_install_reports_population() {
        let fetcher = StubFetcher::default()
            .serve("/", Response::new(200, "<html></html>"))
            .serve("/offline.html", Response::new(200, "<h1>offline</h1>"));
        let (state, _) = state_with(fetcher);

        let report = output(&lifecycle_impl(&state, params("install")).await.unwrap());
        assert_eq!(report["cached"], 2);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["timed_out"], false);

        assert_eq!(state.hub.skip_requests(), 1);
        assert_eq!(state.hub.drain().await, vec![OutboundMessage::OfflineReady]);
    }

    #[tokio::test]
    async fn test_activate_claims_and_announces_version() {
        let (state, _) = state();

        let report = output(&lifecycle_impl(&state, params("activate")).await.unwrap());
        assert_eq!(report["deleted"], serde_json::json!([]));
        assert!(state.hub.claimed());
        assert_eq!(state.hub.drain().await, vec![OutboundMessage::CacheUpdated { version: "v1".into() }]);
    }

    #[tokio::test]
    async fn test_unknown_event_rejected() {
        let (state, _) = state();
        assert!(lifecycle_impl(&state, params("uninstall")).await.is_err());
    }
}
