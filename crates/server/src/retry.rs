//! Retry ticker: re-runs sync tags once their backoff has elapsed.

use std::time::Duration;

use harbor_core::SyncOutcome;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::state::ProxyState;

/// Run every tag due at `now` through the sync handler.
pub async fn run_due(state: &ProxyState, now: Instant) -> Vec<SyncOutcome> {
    let mut outcomes = Vec::new();
    for tag in state.scheduler.take_due(now).await {
        tracing::info!(tag, "retrying sync");
        if let Some(outcome) = state.proxy.handle_sync(&tag).await {
            outcomes.push(outcome);
        }
    }
    outcomes
}

pub fn spawn(state: ProxyState, poll: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll);
        loop {
            ticker.tick().await;
            let outcomes = run_due(&state, Instant::now()).await;
            if !outcomes.is_empty() {
                tracing::debug!(count = outcomes.len(), "retry pass finished");
            }
        }
    })
}
