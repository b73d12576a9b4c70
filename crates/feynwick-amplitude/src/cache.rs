//! Concurrent trace cache.
//!
//! Reduction calls are pure, so identical chain signatures across diagrams
//! (and across rayon workers) resolve to the same expression. The cache is a
//! read-write-locked map with insert-if-absent semantics and hit/miss
//! counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use feynwick_model::Expr;

/// Shared cache from chain signature to reduced expression.
#[derive(Debug, Default)]
pub struct TraceCache {
    entries: RwLock<HashMap<String, Expr>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl TraceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a signature, computing and inserting on a miss.
    ///
    /// Two workers racing on the same fresh key may both evaluate `compute`;
    /// purity makes the duplicate work harmless and the first insert wins.
    pub fn get_or_insert_with(&self, key: &str, compute: impl FnOnce() -> Expr) -> Expr {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(found) = entries.get(key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return found.clone();
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(key.to_owned()).or_insert_with(|| value.clone());
        value
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that had to compute.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_and_miss_accounting() {
        let cache = TraceCache::new();
        let a = cache.get_or_insert_with("k", || Expr::symbol("v"));
        assert_eq!(a, Expr::symbol("v"));
        assert_eq!((cache.hits(), cache.misses()), (0, 1));

        let b = cache.get_or_insert_with("k", || Expr::symbol("other"));
        assert_eq!(b, Expr::symbol("v"));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_resets_entries_and_counters() {
        let cache = TraceCache::new();
        cache.get_or_insert_with("k", Expr::one);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!((cache.hits(), cache.misses()), (0, 0));
    }

    #[test]
    fn concurrent_lookups_agree() {
        use std::sync::Arc;
        let cache = Arc::new(TraceCache::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                cache.get_or_insert_with("shared", || Expr::symbol("r"))
            }));
        }
        for h in handles {
            assert_eq!(h.join().unwrap(), Expr::symbol("r"));
        }
        assert_eq!(cache.len(), 1);
    }
}
