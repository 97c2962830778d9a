//! Key-value execution backend: scan, evaluate, merge
//!
//! A stateless facade over a key-value collaborator. `find` runs the same
//! filter semantics as the document pipeline, but in-process: predicates
//! are evaluated record by record during a forward scan, then facet
//! counts, the total and the result page are computed over the matches.
//! Partial updates go through the store's merge hook instead of
//! read-modify-write.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use sift_core::{
    Error, FacetBucket, FieldPath, FindResult, FoundRecord, JsonCodec, PointOps, RecordCodec,
    Result, ScanSource, Value,
};
use sift_query::{collect_predicates, FacetSpec, Operator, Predicate};

use crate::backend::{Backend, FindQuery};
use crate::eval;

/// Key-value storage backend.
///
/// Holds no state beyond the store handle and codec; multiple instances
/// over the same store are safe.
#[derive(Debug, Clone)]
pub struct KvBackend<S, C = JsonCodec> {
    store: Arc<S>,
    codec: C,
}

impl<S> KvBackend<S, JsonCodec>
where
    S: ScanSource + PointOps,
{
    /// Build a backend over the given store with the JSON codec.
    pub fn new(store: Arc<S>) -> Self {
        KvBackend {
            store,
            codec: JsonCodec,
        }
    }
}

impl<S, C> KvBackend<S, C>
where
    S: ScanSource + PointOps,
    C: RecordCodec,
{
    /// Build a backend with a caller-supplied record codec.
    pub fn with_codec(store: Arc<S>, codec: C) -> Self {
        KvBackend { store, codec }
    }

    /// Scan for every record whose field satisfies one predicate.
    ///
    /// Records come back in scan (key) order; the scan is single-pass and
    /// restarted per call.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperator` before the scan starts for operators outside
    /// the evaluator set; decode failures abort the whole call.
    pub fn find_where(
        &self,
        field: &str,
        value: &Value,
        operator: Operator,
    ) -> Result<Vec<FoundRecord>> {
        eval::check_operator(operator)?;
        let path: FieldPath = field.parse()?;

        let mut found = Vec::new();
        for (id, bytes) in self.store.scan()? {
            let record = self.codec.decode(&bytes)?;
            if eval::matches(&record, &path, value, operator)? {
                found.push(FoundRecord { id, record });
            }
        }
        Ok(found)
    }

    /// Store a batch of records, one by one.
    ///
    /// # Errors
    ///
    /// Aborts on the first failing record.
    pub fn create_many(&self, items: Vec<(String, Value)>) -> Result<Vec<FoundRecord>> {
        items
            .into_iter()
            .map(|(id, record)| self.create_one(&id, record))
            .collect()
    }

    fn create_one(&self, id: &str, record: Value) -> Result<FoundRecord> {
        let bytes = self.codec.encode(&record)?;
        self.store.put(id, bytes)?;
        Ok(FoundRecord {
            id: id.to_string(),
            record,
        })
    }

    fn matched_records(&self, predicates: &[Predicate]) -> Result<Vec<FoundRecord>> {
        // Fail fast on unsupported operators before touching the scan
        for predicate in predicates {
            eval::check_operator(predicate.effective_operator())?;
        }

        let mut matched = Vec::new();
        for (id, bytes) in self.store.scan()? {
            let record = self.codec.decode(&bytes)?;
            let mut all = true;
            for predicate in predicates {
                if !eval::matches(
                    &record,
                    predicate.field(),
                    predicate.value(),
                    predicate.effective_operator(),
                )? {
                    all = false;
                    break;
                }
            }
            if all {
                matched.push(FoundRecord { id, record });
            }
        }
        Ok(matched)
    }
}

impl<S, C> Backend for KvBackend<S, C>
where
    S: ScanSource + PointOps,
    C: RecordCodec,
{
    fn get(&self, id: &str) -> Result<FoundRecord> {
        let bytes = self.store.get(id)?.ok_or_else(|| Error::NotFound {
            key: id.to_string(),
        })?;
        Ok(FoundRecord {
            id: id.to_string(),
            record: self.codec.decode(&bytes)?,
        })
    }

    fn create(&self, id: &str, record: Value) -> Result<FoundRecord> {
        self.create_one(id, record)
    }

    fn replace(&self, id: &str, record: Value) -> Result<FoundRecord> {
        self.create_one(id, record)
    }

    fn update(&self, id: &str, patch: Value) -> Result<()> {
        let bytes = self.codec.encode(&patch)?;
        self.store.merge(id, bytes)
    }

    fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete(id)? {
            return Err(Error::NotFound {
                key: id.to_string(),
            });
        }
        Ok(())
    }

    fn find(&self, query: &FindQuery) -> Result<FindResult> {
        let mut params = query.exact.clone();
        params.extend(query.filters.clone());
        let predicates = collect_predicates(&params)?;
        debug!(predicates = predicates.len(), "evaluating scan-side find");

        let matched = self.matched_records(&predicates)?;
        let facets = facet_counts(&matched, &query.facets)?;
        let total = matched.len() as u64;

        let offset = query.common.offset() as usize;
        let limit = query.common.limit() as usize;
        let results = matched.into_iter().skip(offset).take(limit).collect();

        Ok(FindResult {
            facets,
            total,
            results,
        })
    }
}

/// Count distinct values of the facet fields over the matched records.
///
/// List-classified fields are unwound (each element counted); scalar
/// fields count their value directly. Absent fields contribute nothing.
/// Buckets come back ordered by descending count, ties broken by the
/// value rendering for determinism.
fn facet_counts(
    matched: &[FoundRecord],
    spec: &FacetSpec,
) -> Result<BTreeMap<String, Vec<FacetBucket>>> {
    let mut facets = BTreeMap::new();
    for field in spec.fields() {
        let path: FieldPath = field.parse()?;
        let mut counts: BTreeMap<String, (Value, u64)> = BTreeMap::new();

        let mut bump = |value: &Value| {
            let rendered = serde_json::Value::from(value.clone()).to_string();
            counts
                .entry(rendered)
                .or_insert_with(|| (value.clone(), 0))
                .1 += 1;
        };

        for found in matched {
            let Some(value) = found.record.get_path(&path) else {
                continue;
            };
            if spec.is_list_field(field) {
                for element in value.as_array().unwrap_or_default() {
                    bump(element);
                }
            } else {
                bump(value);
            }
        }

        let mut buckets: Vec<(String, (Value, u64))> = counts.into_iter().collect();
        buckets.sort_by(|(ka, (_, ca)), (kb, (_, cb))| cb.cmp(ca).then_with(|| ka.cmp(kb)));
        facets.insert(
            field.to_string(),
            buckets
                .into_iter()
                .map(|(_, (value, count))| FacetBucket { value, count })
                .collect(),
        );
    }
    Ok(facets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KvConfig;
    use crate::memory::MemoryKv;
    use crate::merge::merge_patch;
    use sift_query::{CommonParams, RawParams};

    fn record(json: serde_json::Value) -> Value {
        json.into()
    }

    fn backend() -> KvBackend<MemoryKv> {
        KvBackend::new(Arc::new(MemoryKv::new(KvConfig::default(), merge_patch)))
    }

    fn seed(backend: &KvBackend<MemoryKv>) {
        backend
            .create_many(vec![
                (
                    "1".to_string(),
                    record(serde_json::json!({"type": "x", "age": 30, "tags": ["red", "blue"]})),
                ),
                (
                    "2".to_string(),
                    record(serde_json::json!({"type": "x", "age": 40, "tags": ["red"]})),
                ),
                (
                    "3".to_string(),
                    record(serde_json::json!({"type": "y", "age": 50, "tags": []})),
                ),
            ])
            .unwrap();
    }

    #[test]
    fn test_get_not_found() {
        let backend = backend();
        let err = backend.get("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_create_then_get() {
        let backend = backend();
        let created = backend
            .create("1", record(serde_json::json!({"name": "bob"})))
            .unwrap();
        assert_eq!(created.id, "1");
        let fetched = backend.get("1").unwrap();
        assert_eq!(fetched.record, created.record);
    }

    #[test]
    fn test_update_merges_through_store() {
        let backend = backend();
        backend
            .create("1", record(serde_json::json!({"tags": ["a"], "n": 1})))
            .unwrap();
        backend
            .update("1", record(serde_json::json!({"tags": ["b"], "n": 2})))
            .unwrap();
        let fetched = backend.get("1").unwrap();
        let json: serde_json::Value = fetched.record.into();
        assert_eq!(json, serde_json::json!({"tags": ["a", "b"], "n": 2}));
    }

    #[test]
    fn test_delete_not_found() {
        let backend = backend();
        assert!(matches!(
            backend.delete("nope").unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn test_find_where_contains_on_tags() {
        let backend = backend();
        seed(&backend);
        let found = backend
            .find_where("tags", &Value::String("red".into()), Operator::Contains)
            .unwrap();
        assert_eq!(found.len(), 2);
        let none = backend
            .find_where("tags", &Value::String("green".into()), Operator::Contains)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_find_where_unsupported_operator_fails_before_scan() {
        let backend = backend();
        let err = backend
            .find_where("tags", &Value::String("red".into()), Operator::In)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_find_filters_and_facets() {
        let backend = backend();
        seed(&backend);

        let mut filters = RawParams::new();
        filters.insert("age__gte".to_string(), Some(Value::Int(30)));
        let query = FindQuery {
            common: CommonParams::new(2, 0, None).unwrap(),
            exact: RawParams::new(),
            filters,
            facets: FacetSpec {
                list_fields: vec!["tags".to_string()],
                scalar_fields: vec!["type".to_string()],
            },
        };

        let result = backend.find(&query).unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.results.len(), 2);
        assert_eq!(
            result.facet_count("type", &Value::String("x".into())),
            Some(2)
        );
        assert_eq!(
            result.facet_count("type", &Value::String("y".into())),
            Some(1)
        );
        assert_eq!(
            result.facet_count("tags", &Value::String("red".into())),
            Some(2)
        );
        assert_eq!(
            result.facet_count("tags", &Value::String("blue".into())),
            Some(1)
        );
    }

    #[test]
    fn test_find_offset_windowing() {
        let backend = backend();
        seed(&backend);
        let query = FindQuery {
            common: CommonParams::new(2, 2, None).unwrap(),
            ..FindQuery::default()
        };
        let result = backend.find(&query).unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].id, "3");
    }

    #[test]
    fn test_find_with_suffix_list_operator_is_unsupported_here() {
        let backend = backend();
        seed(&backend);
        let mut filters = RawParams::new();
        filters.insert("type__in".to_string(), Some(Value::String("x,y".into())));
        let query = FindQuery {
            filters,
            ..FindQuery::default()
        };
        let err = backend.find(&query).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator { .. }));
    }

    /// Store double whose every operation reports a backend failure.
    struct OfflineStore;

    impl PointOps for OfflineStore {
        fn get(&self, key: &str) -> sift_core::Result<Option<Vec<u8>>> {
            Err(Error::backend(format!("get {key}"), "store offline"))
        }

        fn put(&self, key: &str, _bytes: Vec<u8>) -> sift_core::Result<()> {
            Err(Error::backend(format!("put {key}"), "store offline"))
        }

        fn merge(&self, key: &str, _patch: Vec<u8>) -> sift_core::Result<()> {
            Err(Error::backend(format!("merge {key}"), "store offline"))
        }

        fn delete(&self, key: &str) -> sift_core::Result<bool> {
            Err(Error::backend(format!("delete {key}"), "store offline"))
        }
    }

    impl ScanSource for OfflineStore {
        fn scan(&self) -> sift_core::Result<Vec<(String, Vec<u8>)>> {
            Err(Error::backend("scan", "store offline"))
        }
    }

    #[test]
    fn test_store_failures_propagate_as_backend_errors() {
        let backend = KvBackend::new(Arc::new(OfflineStore));

        let err = backend.get("1").unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));
        assert!(err.to_string().contains("get 1"));

        let err = backend
            .create("1", record(serde_json::json!({"a": 1})))
            .unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));

        let err = backend.find(&FindQuery::default()).unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));
        assert!(err.to_string().contains("scan"));
    }

    #[test]
    fn test_find_results_in_scan_order() {
        let backend = backend();
        seed(&backend);
        let result = backend.find(&FindQuery::default()).unwrap();
        let ids: Vec<&str> = result.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
