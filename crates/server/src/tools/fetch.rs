//! proxy_fetch tool implementation.
//!
//! Routes one request through the proxy. Requests the proxy does not
//! intercept are forwarded to the network unmodified.

use harbor_core::{FetchDisposition, Method, Request, Response, Strategy};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::ProxyState;

/// Input parameters for the proxy_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination, e.g. "document", "script", "image".
    #[serde(default)]
    pub destination: Option<String>,

    /// Request mode: "navigate", "same-origin", "cors" or "no-cors".
    #[serde(default)]
    pub mode: Option<String>,

    /// Request body, sent as-is.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the proxy_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyFetchOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
    /// Strategy that handled the request; absent for passthrough.
    pub strategy: Option<String>,
    /// "network", "cache", "offline_document", "synthetic" or "passthrough".
    pub source: String,
    /// A background refresh is updating the cached copy.
    pub revalidating: bool,
}

impl ProxyFetchOutput {
    fn new(url: &str, response: &Response, strategy: Option<Strategy>, source: &str, revalidating: bool) -> Self {
        Self {
            url: url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            content_type: response.content_type().map(str::to_string),
            body: response.text(),
            strategy: strategy.map(|s| s.as_str().to_string()),
            source: source.to_string(),
            revalidating,
        }
    }
}

fn build_request(state: &ProxyState, params: ProxyFetchParams) -> Result<Request, harbor_core::Error> {
    let url = state.config.resolve(&params.url)?;
    let method: Method = params.method.parse()?;

    let mut request = Request::get(url).with_method(method);
    if let Some(destination) = params.destination.as_deref() {
        request = request.with_destination(destination.parse()?);
    }
    if let Some(mode) = params.mode.as_deref() {
        request = request.with_mode(mode.parse()?);
    }
    if let Some(body) = params.body {
        request.body = Some(body.into());
    }
    Ok(request)
}

/// Implementation of the proxy_fetch tool.
pub async fn fetch_impl(state: &ProxyState, params: ProxyFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(state, params)?;
    let url = request.url.to_string();

    let output = match state.proxy.handle_fetch(request.clone()).await {
        FetchDisposition::Respond(outcome) => ProxyFetchOutput::new(
            &url,
            &outcome.response,
            Some(outcome.strategy),
            outcome.source.as_str(),
            outcome.revalidation.is_some(),
        ),
        FetchDisposition::Passthrough => {
            let response = state.fetcher.fetch(&request).await?;
            ProxyFetchOutput::new(&url, &response, None, "passthrough", false)
        }
    };

    json_result(&output)
}
