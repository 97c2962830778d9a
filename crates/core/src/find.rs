//! Find-result contract shared by both execution backends
//!
//! A `find` against either backend resolves to the same shape: per-field
//! facet count buckets, a total matched count, and one paginated page of
//! records. The document backend receives this from the store's facet
//! stage; the key-value backend computes it in-process after the scan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::Value;

/// One distinct-value bucket of a facet breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetBucket {
    /// The distinct field value this bucket counts
    pub value: Value,
    /// Number of matched records carrying that value
    pub count: u64,
}

/// A record returned by `find`, paired with its backend key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundRecord {
    /// Backend-assigned record id
    pub id: String,
    /// The decoded record
    pub record: Value,
}

/// Result of a faceted, paginated `find`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FindResult {
    /// Facet field name -> count buckets, ordered by descending count,
    /// ties broken by value rendering for determinism
    pub facets: BTreeMap<String, Vec<FacetBucket>>,
    /// Total number of matched records before pagination
    pub total: u64,
    /// The requested page of matched records
    pub results: Vec<FoundRecord>,
}

impl FindResult {
    /// Look up the count for one distinct value of a facet field.
    pub fn facet_count(&self, field: &str, value: &Value) -> Option<u64> {
        self.facets
            .get(field)?
            .iter()
            .find(|bucket| &bucket.value == value)
            .map(|bucket| bucket.count)
    }
}
