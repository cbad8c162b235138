//! Bounded cache of diff hunks keyed by repository, commit pair and path.
//!
//! Entries are weighed by hunk count (minimum 1, so empty diffs still occupy a
//! slot) and the least recently used entries are evicted once the total cost
//! exceeds the budget. An entry heavier than the whole budget is not admitted.
//! The cache is safe to share between requests.

use crate::hunk::Hunk;
use lru::LruCache;
use std::sync::{Arc, Mutex, PoisonError};

/// Hunks of one file diff. An empty slice is a cached "no changes", distinct from a miss.
pub type Hunks = Arc<[Hunk]>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HunkCacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
    pub cost: usize,
}

struct Inner {
    entries: LruCache<String, Hunks>,
    cost: usize,
    hits: usize,
    misses: usize,
}

pub struct HunkCache {
    max_cost: usize,
    inner: Mutex<Inner>,
}

impl HunkCache {
    pub fn new(max_cost: usize) -> Self {
        Self {
            max_cost,
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                cost: 0,
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn key(repository_id: i64, source_commit: &str, target_commit: &str, path: &str) -> String {
        format!("{repository_id}:{source_commit}:{target_commit}:{path}")
    }

    pub fn get(&self, key: &str) -> Option<Hunks> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let found = inner.entries.get(key).cloned();
        match found {
            Some(hunks) => {
                inner.hits += 1;
                Some(hunks)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert `hunks` under `key`. Returns `false` when the entry was too heavy to admit.
    pub fn set(&self, key: String, hunks: Hunks) -> bool {
        let cost = entry_cost(&hunks);
        if cost > self.max_cost {
            log::debug!("hunk cache rejected {key} (cost {cost} > budget {})", self.max_cost);
            return false;
        }

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = inner.entries.put(key, hunks);
        if let Some(previous) = previous {
            inner.cost -= entry_cost(&previous);
        }
        inner.cost += cost;

        while inner.cost > self.max_cost {
            let Some((_, evicted)) = inner.entries.pop_lru() else {
                break;
            };
            inner.cost -= entry_cost(&evicted);
        }
        true
    }

    pub fn stats(&self) -> HunkCacheStats {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        HunkCacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
            cost: inner.cost,
        }
    }
}

fn entry_cost(hunks: &[Hunk]) -> usize {
    hunks.len().max(1)
}
