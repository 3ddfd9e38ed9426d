use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::store::TokenStore;
use crate::utils::token_prefix;

/// One scheduled removal, bound to a single token and the deadline it was
/// issued with.
pub struct DeferredRemoval {
    store: Arc<TokenStore>,
    token: String,
    deadline: DateTime<Utc>,
}

impl DeferredRemoval {
    pub fn new(store: Arc<TokenStore>, token: &str, deadline: DateTime<Utc>) -> Self {
        Self {
            store,
            token: token.to_owned(),
            deadline,
        }
    }

    /// Waits for the deadline, then removes the token if its recorded
    /// deadline has passed. Returns whether an entry was removed.
    pub async fn run(self, cancel: CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            removed = self.fire() => removed,
        }
    }

    async fn fire(&self) -> bool {
        // the timer runs on the monotonic clock, deadlines on the wall clock
        loop {
            let now = Utc::now();
            if self.deadline <= now {
                break;
            }
            let wait = (self.deadline - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
        }

        let removed = self.store.remove_if_expired(&self.token, Utc::now());
        if removed {
            debug!(token = token_prefix(&self.token), "expired token removed");
        } else {
            debug!(
                token = token_prefix(&self.token),
                "token already removed or renewed, nothing to do"
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::time::Duration;

    #[tokio::test]
    async fn removes_token_at_deadline() {
        let store = Arc::new(TokenStore::new());
        let deadline = Utc::now() + TimeDelta::milliseconds(50);
        store.insert("t", deadline);

        let removal = DeferredRemoval::new(Arc::clone(&store), "t", deadline);
        let handle = tokio::spawn(removal.run(CancellationToken::new()));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.validate("t"));

        assert!(handle.await.unwrap());
        assert!(!store.validate("t"));
    }

    #[tokio::test]
    async fn renewed_token_survives_old_removal() {
        let store = Arc::new(TokenStore::new());
        let first = Utc::now() + TimeDelta::milliseconds(30);
        store.insert("t", first);
        let removal = DeferredRemoval::new(Arc::clone(&store), "t", first);
        let handle = tokio::spawn(removal.run(CancellationToken::new()));

        store.insert("t", Utc::now() + TimeDelta::seconds(60));

        assert!(!handle.await.unwrap());
        assert!(store.validate("t"));
    }

    #[tokio::test]
    async fn already_removed_token_is_a_noop() {
        let store = Arc::new(TokenStore::new());
        let deadline = Utc::now() - TimeDelta::milliseconds(1);
        let removal = DeferredRemoval::new(Arc::clone(&store), "gone", deadline);
        assert!(!removal.run(CancellationToken::new()).await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn cancelled_removal_keeps_token() {
        let store = Arc::new(TokenStore::new());
        let deadline = Utc::now() + TimeDelta::seconds(60);
        store.insert("t", deadline);

        let cancel = CancellationToken::new();
        let removal = DeferredRemoval::new(Arc::clone(&store), "t", deadline);
        let handle = tokio::spawn(removal.run(cancel.clone()));
        cancel.cancel();

        assert!(!handle.await.unwrap());
        assert!(store.validate("t"));
    }
}
