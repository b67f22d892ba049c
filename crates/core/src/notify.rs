//! Push payloads and notification clicks.
//!
//! The proxy only decides what to show and where a click leads; displaying
//! the notification and focusing windows is up to the host.

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_TITLE: &str = "Harbor";
const DEFAULT_BODY: &str = "You have new updates.";
const DISMISS_ACTION: &str = "dismiss";

/// A notification the host should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Page opened when the notification is clicked.
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    title: Option<String>,
    body: Option<String>,
    url: Option<String>,
}

impl Notification {
    /// Build a notification from a push payload.
    ///
    /// JSON payloads may set `title`, `body` and `url`; plain text becomes
    /// the body; anything missing falls back to defaults.
    pub fn from_push(payload: Option<&str>) -> Self {
        let parsed = match payload {
            Some(text) => serde_json::from_str::<PushPayload>(text)
                .unwrap_or_else(|_| PushPayload { body: Some(text.to_string()), ..Default::default() }),
            None => PushPayload::default(),
        };

        Self {
            title: parsed.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: parsed.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            url: parsed.url,
        }
    }
}

/// Resolve the page a notification click should focus or open.
///
/// The dismiss action opens nothing; otherwise the target URL (relative to
/// `app_root`) or the app root itself.
pub fn click_target(app_root: &Url, action: Option<&str>, url: Option<&str>) -> Option<Url> {
    if action == Some(DISMISS_ACTION) {
        return None;
    }

    match url {
        Some(target) => match app_root.join(target) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                tracing::warn!(target, error = %e, "invalid notification url, opening app root");
                Some(app_root.clone())
            }
        },
        None => Some(app_root.clone()),
    }
}
