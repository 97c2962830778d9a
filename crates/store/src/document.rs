//! Document-store execution backend
//!
//! Translates find requests into aggregation pipelines and hands the
//! rendered stages to an external executor. This backend never manages
//! connections or retries; store failures propagate as backend errors
//! with the offending operation named.

use std::sync::Arc;

use tracing::debug;

use sift_core::{DocumentExecutor, Error, FindResult, FoundRecord, Result, Value};
use sift_query::{compile, render};

use crate::backend::{Backend, FindQuery};
use crate::merge::merge_records;

/// Document storage backend over an external pipeline executor.
#[derive(Clone)]
pub struct DocumentBackend {
    executor: Arc<dyn DocumentExecutor>,
    collection: String,
    lookup_fields: Vec<String>,
}

impl DocumentBackend {
    /// Build a backend for one collection.
    pub fn new(executor: Arc<dyn DocumentExecutor>, collection: impl Into<String>) -> Self {
        DocumentBackend {
            executor,
            collection: collection.into(),
            lookup_fields: Vec::new(),
        }
    }

    /// Declare join fields; each one becomes a `Lookup` stage ahead of
    /// filtering. Join fields are schema knowledge, independent of any
    /// single request.
    pub fn with_lookup_fields(mut self, fields: Vec<String>) -> Self {
        self.lookup_fields = fields;
        self
    }

    /// The collection this backend addresses.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl Backend for DocumentBackend {
    fn get(&self, id: &str) -> Result<FoundRecord> {
        let record = self
            .executor
            .find_one(&self.collection, id)?
            .ok_or_else(|| Error::NotFound {
                key: id.to_string(),
            })?;
        Ok(FoundRecord {
            id: id.to_string(),
            record,
        })
    }

    fn create(&self, id: &str, record: Value) -> Result<FoundRecord> {
        self.executor.insert_one(&self.collection, id, &record)?;
        Ok(FoundRecord {
            id: id.to_string(),
            record,
        })
    }

    fn replace(&self, id: &str, record: Value) -> Result<FoundRecord> {
        self.executor.replace_one(&self.collection, id, &record)?;
        Ok(FoundRecord {
            id: id.to_string(),
            record,
        })
    }

    fn update(&self, id: &str, patch: Value) -> Result<()> {
        let existing = self
            .executor
            .find_one(&self.collection, id)?
            .ok_or_else(|| Error::NotFound {
                key: id.to_string(),
            })?;
        let merged = merge_records(&existing, &patch)?;
        self.executor.replace_one(&self.collection, id, &merged)
    }

    fn delete(&self, id: &str) -> Result<()> {
        if !self.executor.delete_one(&self.collection, id)? {
            return Err(Error::NotFound {
                key: id.to_string(),
            });
        }
        Ok(())
    }

    fn find(&self, query: &FindQuery) -> Result<FindResult> {
        let stages = compile(
            &query.common,
            &query.exact,
            &query.filters,
            &query.facets,
            &self.lookup_fields,
        )?;
        let documents = render(&stages);
        debug!(
            collection = %self.collection,
            stages = documents.len(),
            "handing pipeline to executor"
        );
        self.executor.run_pipeline(&self.collection, &documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use sift_query::{CommonParams, FacetSpec, RawParams};
    use std::collections::BTreeMap;

    /// Executor double recording the pipelines it receives.
    #[derive(Default)]
    struct RecordingExecutor {
        pipelines: Mutex<Vec<Vec<serde_json::Value>>>,
        documents: Mutex<BTreeMap<String, Value>>,
    }

    impl DocumentExecutor for RecordingExecutor {
        fn run_pipeline(
            &self,
            _collection: &str,
            stages: &[serde_json::Value],
        ) -> Result<FindResult> {
            self.pipelines.lock().push(stages.to_vec());
            Ok(FindResult::default())
        }

        fn find_one(&self, _collection: &str, id: &str) -> Result<Option<Value>> {
            Ok(self.documents.lock().get(id).cloned())
        }

        fn insert_one(&self, _collection: &str, id: &str, record: &Value) -> Result<()> {
            self.documents.lock().insert(id.to_string(), record.clone());
            Ok(())
        }

        fn replace_one(&self, _collection: &str, id: &str, record: &Value) -> Result<()> {
            self.documents.lock().insert(id.to_string(), record.clone());
            Ok(())
        }

        fn delete_one(&self, _collection: &str, id: &str) -> Result<bool> {
            Ok(self.documents.lock().remove(id).is_some())
        }
    }

    fn backend() -> (Arc<RecordingExecutor>, DocumentBackend) {
        let executor = Arc::new(RecordingExecutor::default());
        let backend = DocumentBackend::new(executor.clone(), "items");
        (executor, backend)
    }

    #[test]
    fn test_find_hands_rendered_stages_to_executor() {
        let (executor, backend) = backend();
        let mut filters = RawParams::new();
        filters.insert("name".to_string(), Some(Value::String("bob".into())));
        let query = FindQuery {
            common: CommonParams::new(5, 0, Some("-age".to_string())).unwrap(),
            filters,
            facets: FacetSpec {
                list_fields: vec![],
                scalar_fields: vec!["type".to_string()],
            },
            ..FindQuery::default()
        };
        backend.find(&query).unwrap();

        let pipelines = executor.pipelines.lock();
        let stages = &pipelines[0];
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0], json!({"$match": {"$and": [{"name": "bob"}]}}));
        assert_eq!(stages[1], json!({"$sort": {"age": -1}}));
        assert!(stages[2].get("$facet").is_some());
    }

    #[test]
    fn test_lookup_fields_lead_rendered_pipeline() {
        let executor = Arc::new(RecordingExecutor::default());
        let backend = DocumentBackend::new(executor.clone(), "items")
            .with_lookup_fields(vec!["owner".to_string()]);
        backend.find(&FindQuery::default()).unwrap();
        let pipelines = executor.pipelines.lock();
        assert!(pipelines[0][0].get("$lookup").is_some());
    }

    #[test]
    fn test_get_not_found() {
        let (_, backend) = backend();
        assert!(matches!(
            backend.get("missing").unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn test_create_get_delete_roundtrip() {
        let (_, backend) = backend();
        backend
            .create("1", json!({"name": "bob"}).into())
            .unwrap();
        assert_eq!(backend.get("1").unwrap().id, "1");
        backend.delete("1").unwrap();
        assert!(matches!(
            backend.delete("1").unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn test_update_merges_sequences_and_overwrites_scalars() {
        let (_, backend) = backend();
        backend
            .create("1", json!({"tags": ["a"], "n": 1}).into())
            .unwrap();
        backend
            .update("1", json!({"tags": ["b"], "n": 2}).into())
            .unwrap();
        let fetched = backend.get("1").unwrap();
        let json: serde_json::Value = fetched.record.into();
        assert_eq!(json, json!({"tags": ["a", "b"], "n": 2}));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (_, backend) = backend();
        assert!(matches!(
            backend.update("none", json!({}).into()).unwrap_err(),
            Error::NotFound { .. }
        ));
    }
}
