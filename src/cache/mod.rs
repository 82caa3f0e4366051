//! Response-validator (ETag) caching.
//!
//! # Responsibilities
//! - Map resource identifiers to opaque validator tokens
//! - Populate entries lazily on first read
//! - Drop entries when a resource is invalidated
//!
//! # Design Decisions
//! - Generic over the key type; the cache has no opinion on token contents
//! - DashMap entry API gives per-key atomicity without a global lock
//! - Invalidation removes the entry; the next read recomputes it. There is
//!   no in-place update path, so a stale token can never overwrite a fresh one

use std::hash::Hash;

use dashmap::DashMap;

/// Concurrency-safe cache of validator tokens keyed by resource identifier.
#[derive(Debug, Default)]
pub struct ValidatorCache<K: Eq + Hash> {
    entries: DashMap<K, String>,
}

impl<K: Eq + Hash + Clone> ValidatorCache<K> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Return the cached token for `key`, computing and caching it with
    /// `derive` if absent.
    ///
    /// The computation runs while the key's entry is held, so a concurrent
    /// reader of the same key observes either the full token or nothing.
    pub fn get_or_compute(&self, key: K, derive: impl FnOnce() -> String) -> String {
        self.entries.entry(key).or_insert_with(derive).value().clone()
    }

    /// Fallible variant of [`ValidatorCache::get_or_compute`]: a failing
    /// derivation caches nothing and the error is returned to the caller.
    ///
    /// Because `derive` runs while the key's entry is held, a derivation
    /// that reads the source of truth observes any mutation committed
    /// before this call, and a mutation committed after it evicts the
    /// entry once its invalidation hook runs.
    pub fn get_or_try_compute<E>(
        &self,
        key: K,
        derive: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        Ok(self
            .entries
            .entry(key)
            .or_try_insert_with(derive)?
            .value()
            .clone())
    }

    /// Remove any cached token for `key`. A subsequent read recomputes it.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Number of cached tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
