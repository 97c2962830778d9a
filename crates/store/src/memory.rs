//! MemoryKv: in-memory key-value store with merge-operator accumulation
//!
//! This module implements the key-value collaborator contract using:
//! - `BTreeMap<String, Slot>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - a registered stateless `MergeFn` applied lazily
//!
//! # Design Notes
//!
//! - **Deferred merging**: `merge` only queues the operand; reads fold
//!   pending operands through the merge function, and `compact` (or the
//!   configured per-key threshold) folds them into the base value. This
//!   mirrors how an embedded store applies merges during background
//!   compaction, in whatever grouping order it likes.
//! - **Atomicity**: folds happen under the lock, so a merge is atomic with
//!   respect to other merges and reads on the same key.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use sift_core::{MergeFn, PointOps, Result, ScanSource};

use crate::config::KvConfig;

/// A stored key's state: base value plus queued merge operands.
#[derive(Debug, Default, Clone)]
struct Slot {
    base: Option<Vec<u8>>,
    pending: Vec<Vec<u8>>,
}

impl Slot {
    fn fold(&self, merge_fn: MergeFn) -> Option<Vec<u8>> {
        let mut current = self.base.clone();
        for operand in &self.pending {
            current = Some(merge_fn(current.as_deref(), operand));
        }
        current
    }

    fn is_empty(&self) -> bool {
        self.base.is_none() && self.pending.is_empty()
    }
}

/// In-memory reference implementation of the key-value collaborator.
///
/// Thread-safe through `parking_lot::RwLock`. The merge function is a
/// stateless hook registered at construction and invoked under the lock;
/// it must be associative (see `merge_patch`).
#[derive(Debug)]
pub struct MemoryKv {
    data: RwLock<BTreeMap<String, Slot>>,
    merge_fn: MergeFn,
    config: KvConfig,
}

impl MemoryKv {
    /// Create an empty store with the given configuration and merge hook.
    pub fn new(config: KvConfig, merge_fn: MergeFn) -> Self {
        MemoryKv {
            data: RwLock::new(BTreeMap::new()),
            merge_fn,
            config,
        }
    }

    /// Fold all pending merge operands into their base values.
    ///
    /// Equivalent to the background compaction of an embedded store;
    /// observable state is unchanged because reads already fold.
    pub fn compact(&self) {
        let mut data = self.data.write();
        for slot in data.values_mut() {
            if !slot.pending.is_empty() {
                slot.base = slot.fold(self.merge_fn);
                slot.pending.clear();
            }
        }
    }

    /// Number of keys with a current value.
    pub fn len(&self) -> usize {
        let data = self.data.read();
        data.values().filter(|slot| !slot.is_empty()).count()
    }

    /// Whether the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PointOps for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let data = self.data.read();
        Ok(data.get(key).and_then(|slot| slot.fold(self.merge_fn)))
    }

    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let mut data = self.data.write();
        data.insert(
            key.to_string(),
            Slot {
                base: Some(bytes),
                pending: Vec::new(),
            },
        );
        Ok(())
    }

    fn merge(&self, key: &str, patch: Vec<u8>) -> Result<()> {
        let mut data = self.data.write();
        let slot = data.entry(key.to_string()).or_default();
        slot.pending.push(patch);
        if slot.pending.len() >= self.config.merge_compaction_threshold {
            slot.base = slot.fold(self.merge_fn);
            slot.pending.clear();
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut data = self.data.write();
        Ok(data.remove(key).is_some_and(|slot| !slot.is_empty()))
    }
}

impl ScanSource for MemoryKv {
    fn scan(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let data = self.data.read();
        Ok(data
            .iter()
            .filter_map(|(key, slot)| {
                slot.fold(self.merge_fn)
                    .map(|bytes| (key.clone(), bytes))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge_patch;
    use serde_json::json;

    fn store() -> MemoryKv {
        MemoryKv::new(KvConfig::default(), merge_patch)
    }

    fn bytes(v: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    fn decode(b: &[u8]) -> serde_json::Value {
        serde_json::from_slice(b).unwrap()
    }

    #[test]
    fn test_put_get_roundtrip() {
        let kv = store();
        kv.put("k", b"v".to_vec()).unwrap();
        assert_eq!(kv.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(kv.get("missing").unwrap(), None);
    }

    #[test]
    fn test_merge_without_base_stores_patch() {
        let kv = store();
        kv.merge("k", bytes(json!({"a": 1}))).unwrap();
        assert_eq!(decode(&kv.get("k").unwrap().unwrap()), json!({"a": 1}));
    }

    #[test]
    fn test_merge_folds_on_read() {
        let kv = store();
        kv.put("k", bytes(json!({"tags": ["a"]}))).unwrap();
        kv.merge("k", bytes(json!({"tags": ["b"]}))).unwrap();
        kv.merge("k", bytes(json!({"n": 1}))).unwrap();
        let merged = decode(&kv.get("k").unwrap().unwrap());
        assert_eq!(merged, json!({"tags": ["a", "b"], "n": 1}));
    }

    #[test]
    fn test_compact_preserves_observable_state() {
        let kv = store();
        kv.put("k", bytes(json!({"tags": ["a"]}))).unwrap();
        kv.merge("k", bytes(json!({"tags": ["b", "c"]}))).unwrap();
        let before = kv.get("k").unwrap();
        kv.compact();
        assert_eq!(kv.get("k").unwrap(), before);
    }

    #[test]
    fn test_threshold_triggers_in_place_fold() {
        let kv = MemoryKv::new(
            KvConfig::default().with_merge_compaction_threshold(2),
            merge_patch,
        );
        kv.merge("k", bytes(json!({"a": 1}))).unwrap();
        kv.merge("k", bytes(json!({"b": 2}))).unwrap();
        // Threshold reached: the slot folded, reads still agree
        assert_eq!(
            decode(&kv.get("k").unwrap().unwrap()),
            json!({"a": 1, "b": 2})
        );
    }

    #[test]
    fn test_put_discards_pending_merges() {
        let kv = store();
        kv.merge("k", bytes(json!({"a": 1}))).unwrap();
        kv.put("k", bytes(json!({"fresh": true}))).unwrap();
        assert_eq!(
            decode(&kv.get("k").unwrap().unwrap()),
            json!({"fresh": true})
        );
    }

    #[test]
    fn test_delete() {
        let kv = store();
        kv.put("k", b"v".to_vec()).unwrap();
        assert!(kv.delete("k").unwrap());
        assert!(!kv.delete("k").unwrap());
        assert_eq!(kv.get("k").unwrap(), None);
    }

    #[test]
    fn test_scan_is_key_ordered() {
        let kv = store();
        kv.put("b", b"2".to_vec()).unwrap();
        kv.put("a", b"1".to_vec()).unwrap();
        kv.put("c", b"3".to_vec()).unwrap();
        let keys: Vec<String> = kv.scan().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_scan_folds_pending_merges() {
        let kv = store();
        kv.put("k", bytes(json!({"tags": ["a"]}))).unwrap();
        kv.merge("k", bytes(json!({"tags": ["b"]}))).unwrap();
        let scanned = kv.scan().unwrap();
        assert_eq!(decode(&scanned[0].1), json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn test_len_counts_live_keys() {
        let kv = store();
        assert!(kv.is_empty());
        kv.put("a", b"1".to_vec()).unwrap();
        kv.merge("b", bytes(json!({}))).unwrap();
        assert_eq!(kv.len(), 2);
    }
}
