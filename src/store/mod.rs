//! In-memory token store.
//!
//! Maps each issued token to its deadline behind a single reader/writer
//! lock. `validate` only checks membership: keeping expired entries out of
//! the map is the job of the [`crate::reclaim`] strategy that owns the store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the token, overwriting the deadline of an identical token.
    pub fn insert(&self, token: impl Into<String>, deadline: DateTime<Utc>) {
        self.write().insert(token.into(), deadline);
    }

    /// Returns `true` iff the token is present at the instant of lookup.
    pub fn validate(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        self.read().contains_key(token)
    }

    /// Removes the token. Returns whether an entry was present.
    pub fn remove(&self, token: &str) -> bool {
        self.write().remove(token).is_some()
    }

    /// Removes the token only if its recorded deadline is at or before `now`.
    ///
    /// Check and delete happen under the same exclusive lock, so an entry
    /// re-inserted with a later deadline survives.
    pub fn remove_if_expired(&self, token: &str, now: DateTime<Utc>) -> bool {
        let mut tokens = self.write();
        match tokens.get(token) {
            Some(deadline) if *deadline <= now => {
                tokens.remove(token);
                true
            }
            _ => false,
        }
    }

    /// Bulk variant of [`remove_if_expired`](Self::remove_if_expired) taken
    /// under one write lock. Returns the number of entries removed.
    pub(crate) fn purge<'a, I>(&self, candidates: I, now: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tokens = self.write();
        let mut removed = 0;
        for token in candidates {
            if tokens.get(token).is_some_and(|deadline| *deadline <= now) {
                tokens.remove(token);
                removed += 1;
            }
        }
        removed
    }

    /// Copies every entry out of the store. Sweeper only.
    pub(crate) fn snapshot(&self) -> Vec<(String, DateTime<Utc>)> {
        self.read()
            .iter()
            .map(|(token, deadline)| (token.clone(), *deadline))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A writer that panicked cannot leave the map half-updated (every
    // mutation is a single HashMap call), so poisoning is recovered.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.tokens.read().unwrap_or_else(|poisoned| {
            tracing::warn!("token store lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.tokens.write().unwrap_or_else(|poisoned| {
            tracing::warn!("token store lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}
