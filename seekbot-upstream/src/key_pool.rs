//! Rotating pool of upstream API credentials.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;

/// Ordered, non-empty set of upstream credentials with a current index.
///
/// `rotate()` advances the index and wraps modulo pool size; a logical
/// request never tries more than `len()` distinct keys (the caller bounds
/// its failover loop with `len()`).
pub struct KeyPool {
    keys: Vec<String>,
    current: AtomicUsize,
}

impl KeyPool {
    /// Creates a pool from the given keys. An empty list is a configuration
    /// error and is rejected here rather than surfacing mid-request.
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            anyhow::bail!("Key pool requires at least one API key");
        }
        Ok(Self {
            keys,
            current: AtomicUsize::new(0),
        })
    }

    /// Returns the currently active credential.
    pub fn current(&self) -> &str {
        let idx = self.current.load(Ordering::Relaxed) % self.keys.len();
        &self.keys[idx]
    }

    /// Advances to the next credential, cycling back to the first after the last.
    pub fn rotate(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
