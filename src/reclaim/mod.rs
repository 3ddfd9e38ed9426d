//! Reclamation of expired tokens.
//!
//! A [`Reclaimer`] owns exactly one [`ReclaimPolicy`] for the lifetime of its
//! store. Sweeping and deferred removal are never combined.

mod deferred;
mod sweep;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::store::TokenStore;

pub use deferred::DeferredRemoval;
pub use sweep::Sweeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Periodically purge every expired entry.
    Sweep { interval: Duration },
    /// Schedule one removal per token at its deadline.
    Deferred,
}

impl fmt::Display for ReclaimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReclaimPolicy::Sweep { interval } => write!(f, "sweep every {}ms", interval.as_millis()),
            ReclaimPolicy::Deferred => f.write_str("deferred per-token removal"),
        }
    }
}

pub struct Reclaimer {
    store: Arc<TokenStore>,
    policy: ReclaimPolicy,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl Reclaimer {
    /// Starts reclaiming `store` under `policy`.
    ///
    /// Must be called from within a tokio runtime: the sweep policy spawns
    /// its background task immediately.
    pub fn start(store: Arc<TokenStore>, policy: ReclaimPolicy) -> Self {
        let cancel = CancellationToken::new();
        let tasks = TaskTracker::new();

        if let ReclaimPolicy::Sweep { interval } = policy {
            let sweeper = Sweeper::new(Arc::clone(&store), interval);
            tasks.spawn(sweeper.run(cancel.clone()));
        }

        tracing::info!(%policy, "token reclamation started");

        Self {
            store,
            policy,
            cancel,
            tasks,
        }
    }

    pub fn policy(&self) -> ReclaimPolicy {
        self.policy
    }

    /// Longest time an expired token can still validate.
    pub fn staleness_bound(&self) -> Duration {
        match self.policy {
            ReclaimPolicy::Sweep { interval } => interval,
            ReclaimPolicy::Deferred => Duration::ZERO,
        }
    }

    /// Number of reclamation tasks still running: the sweeper, or the
    /// pending deferred removals.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Hook run after a token has been inserted into the store.
    pub(crate) fn token_issued(&self, token: &str, deadline: DateTime<Utc>) {
        match self.policy {
            ReclaimPolicy::Sweep { .. } => {}
            ReclaimPolicy::Deferred => {
                let removal = DeferredRemoval::new(Arc::clone(&self.store), token, deadline);
                self.tasks.spawn(removal.run(self.cancel.clone()));
            }
        }
    }

    /// Stops the sweeper and cancels pending deferred removals, waiting for
    /// all of them to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        tracing::info!(remaining = self.store.len(), "token reclamation stopped");
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
