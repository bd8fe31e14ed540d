//! Bounded LRU cache for analyzed bytecode, keyed by `(code hash, revision)`.
//!
//! Analysis is pure and revision-dependent but otherwise independent of the
//! call that triggered it, so repeated calls into the same contract (common
//! within one block, and across blocks for popular contracts) reuse the
//! `AnalyzedCode` instead of re-running the analyzer. Entries are
//! `Arc`-wrapped so a `Frame` can hold one past cache eviction.

use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use ethereum_types::H256;
use sha3::{Digest, Keccak256};

use crate::{analyzer::AnalyzedCode, common::Revision, common::StatusCode};

/// Default bound; arbitrary but generous for the handful of hot contracts a
/// single process sees repeatedly.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    code_hash: H256,
    revision: Revision,
}

/// Insertion-order-tracked LRU: `entries` holds the data, `order` the most-
/// to-least-recently-used key sequence. Simple linear eviction is fine at
/// this capacity; this is not a hot path relative to interpretation itself.
pub struct AnalysisCache {
    capacity: usize,
    entries: HashMap<CacheKey, Arc<AnalyzedCode>>,
    order: Vec<CacheKey>,
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Returns the cached analysis for `code` under `revision`, analyzing
    /// and inserting it first if absent.
    pub fn get_or_analyze(
        &mut self,
        code: Bytes,
        revision: Revision,
        max_code_size: usize,
    ) -> Result<Arc<AnalyzedCode>, StatusCode> {
        let code_hash = H256::from_slice(&Keccak256::digest(&code));
        let key = CacheKey { code_hash, revision };

        if let Some(hit) = self.entries.get(&key) {
            let hit = hit.clone();
            self.touch(key);
            return Ok(hit);
        }

        let analyzed = Arc::new(AnalyzedCode::analyze(code, revision, max_code_size)?);
        self.insert(key, analyzed.clone());
        Ok(analyzed)
    }

    fn touch(&mut self, key: CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
    }

    fn insert(&mut self, key: CacheKey, value: Arc<AnalyzedCode>) {
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = (!self.order.is_empty()).then(|| self.order.remove(0)) {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key, value);
        self.order.push(key);
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_analysis_returns_same_arc() {
        let mut cache = AnalysisCache::new(2);
        let code = Bytes::from_static(&[0x00]);
        let a = cache
            .get_or_analyze(code.clone(), Revision::Cancun, 0x6000)
            .unwrap();
        let b = cache.get_or_analyze(code, Revision::Cancun, 0x6000).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_revisions_are_distinct_entries() {
        let mut cache = AnalysisCache::new(2);
        let code = Bytes::from_static(&[0x5f]); // PUSH0
        let shanghai = cache
            .get_or_analyze(code.clone(), Revision::Shanghai, 0x6000)
            .unwrap();
        let london = cache.get_or_analyze(code, Revision::London, 0x6000).unwrap();
        assert!(!Arc::ptr_eq(&shanghai, &london));
    }

    #[test]
    fn eviction_drops_oldest_entry() {
        let mut cache = AnalysisCache::new(1);
        let a = Bytes::from_static(&[0x00]);
        let b = Bytes::from_static(&[0x01]);
        cache.get_or_analyze(a.clone(), Revision::Cancun, 0x6000).unwrap();
        cache.get_or_analyze(b, Revision::Cancun, 0x6000).unwrap();
        assert_eq!(cache.entries.len(), 1);
        // `a` was evicted, so re-fetching it is a fresh analysis, not a hit;
        // we can only observe that the cache still holds exactly one entry.
        cache.get_or_analyze(a, Revision::Cancun, 0x6000).unwrap();
        assert_eq!(cache.entries.len(), 1);
    }
}
