use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::TokenStore;

/// Periodic full scan of the store.
pub struct Sweeper {
    store: Arc<TokenStore>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(store: Arc<TokenStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Removes every entry whose deadline is at or before `now`.
    ///
    /// Candidates come from a snapshot taken under the read lock; the purge
    /// re-checks each one under the write lock, so a token re-inserted in
    /// between keeps its new deadline.
    pub fn sweep_once(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|(_, deadline)| *deadline <= now)
            .map(|(token, _)| token)
            .collect();

        if expired.is_empty() {
            return 0;
        }

        let removed = self.store.purge(expired.iter().map(String::as_str), now);
        if removed < expired.len() {
            debug!(
                skipped = expired.len() - removed,
                "entries changed since snapshot were left in place"
            );
        }
        removed
    }

    /// Sweeps on every tick until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "token sweeper started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("token sweeper shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    let removed = self.sweep_once(Utc::now());
                    if removed > 0 {
                        debug!(removed, remaining = self.store.len(), "swept expired tokens");
                    }
                }
            }
        }
    }
}
