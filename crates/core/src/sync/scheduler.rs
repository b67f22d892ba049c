//! Deferred retry registration.
//!
//! [`BoundedRetryScheduler`] is idempotent by tag, backs off exponentially
//! and gives up on a tag after a fixed number of registrations. The host
//! polls [`BoundedRetryScheduler::take_due`] and re-dispatches the tags as
//! sync events.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::Error;
use crate::config::AppConfig;

/// Platform-owned re-invocation of failed sync work.
#[async_trait]
pub trait RetryScheduler: Send + Sync {
    /// Register `tag` for a later retry. No-op if `tag` is already pending.
    async fn register(&self, tag: &str) -> Result<(), Error>;

    /// Forget any retry state for `tag` after it succeeded.
    async fn complete(&self, _tag: &str) {}
}

/// Backoff bounds for [`BoundedRetryScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            base_delay: config.retry_base_delay(),
            max_delay: config.retry_max_delay(),
        }
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

#[derive(Debug, Default)]
struct TagState {
    attempts: u32,
    due: Option<Instant>,
}

/// In-process retry scheduler with bounded exponential backoff.
#[derive(Debug)]
pub struct BoundedRetryScheduler {
    policy: RetryPolicy,
    tags: Mutex<HashMap<String, TagState>>,
}

impl BoundedRetryScheduler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, tags: Mutex::new(HashMap::new()) }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Remove and return every pending tag whose deadline is at or before `now`.
    pub async fn take_due(&self, now: Instant) -> Vec<String> {
        let mut tags = self.tags.lock().await;
        let mut due: Vec<String> = tags
            .iter_mut()
            .filter_map(|(tag, state)| match state.due {
                Some(deadline) if deadline <= now => {
                    state.due = None;
                    Some(tag.clone())
                }
                _ => None,
            })
            .collect();
        due.sort();
        due
    }

    /// Tags currently waiting for their deadline.
    pub async fn pending(&self) -> Vec<String> {
        let tags = self.tags.lock().await;
        let mut pending: Vec<String> = tags
            .iter()
            .filter(|(_, s)| s.due.is_some())
            .map(|(t, _)| t.clone())
            .collect();
        pending.sort();
        pending
    }

    /// Earliest pending deadline, if any.
    pub async fn next_due(&self) -> Option<Instant> {
        let tags = self.tags.lock().await;
        tags.values().filter_map(|s| s.due).min()
    }
}

#[async_trait]
impl RetryScheduler for BoundedRetryScheduler {
    async fn register(&self, tag: &str) -> Result<(), Error> {
        let mut tags = self.tags.lock().await;
        let state = tags.entry(tag.to_string()).or_default();

        if state.due.is_some() {
            tracing::debug!(tag, "retry already pending");
            return Ok(());
        }

        if state.attempts >= self.policy.max_attempts {
            let attempts = state.attempts;
            tags.remove(tag);
            tracing::warn!(tag, attempts, "retries exhausted, dropping tag");
            return Err(Error::RetryExhausted { tag: tag.to_string(), attempts });
        }

        state.attempts += 1;
        let delay = self.policy.delay_for(state.attempts);
        state.due = Some(Instant::now() + delay);

        tracing::debug!(tag, attempt = state.attempts, delay_ms = delay.as_millis() as u64, "retry registered");
        Ok(())
    }

    async fn complete(&self, tag: &str) {
        self.tags.lock().await.remove(tag);
    }
}
