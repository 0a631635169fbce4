//! Shared Bearer Token Cell
//!
//! Holds the most recently acquired bearer token. Writers replace the whole
//! value; readers get a cheap `Arc<str>` snapshot and never observe a
//! partially written token.
//!
//! No expiry is tracked. A stale token is discovered when a backend answers
//! 401, which triggers a refresh.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Last-writer-wins token storage.
#[derive(Debug)]
pub struct TokenCell {
    token: RwLock<Arc<str>>,
    /// Number of successful stores, reported when a token is refreshed
    generation: AtomicU64,
}

impl TokenCell {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            token: RwLock::new(Arc::from("")),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current token. Empty until the first store.
    pub fn get(&self) -> Arc<str> {
        self.token.read().clone()
    }

    /// Replace the token and return the new generation.
    pub fn store(&self, token: &str) -> u64 {
        let token: Arc<str> = Arc::from(token);
        *self.token.write() = token;
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.token.read().is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for TokenCell {
    fn default() -> Self {
        Self::new()
    }
}
