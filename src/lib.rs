//! SiftDB - a filtering query language over plain key/value parameters
//!
//! SiftDB turns HTTP-style query parameters (`age__gte=30`, `tags__contains=red`)
//! into storage-level queries: aggregation pipelines for a document store, or
//! in-process predicate evaluation plus an associative merge rule for an
//! embedded key-value store. Both storage backends answer a find through one
//! trait and one result shape, so callers never branch on the store.
//!
//! # Quick Start
//!
//! ```ignore
//! use siftdb::{Backend, FindQuery, KvBackend, KvConfig, MemoryKv, Value, merge_patch};
//! use std::sync::Arc;
//!
//! // Create an in-memory store with the merge rule registered
//! let store = Arc::new(MemoryKv::new(KvConfig::default(), merge_patch));
//! let backend = KvBackend::new(store);
//!
//! backend.create("1", serde_json::json!({"type": "x", "age": 30}).into())?;
//!
//! // Filter with suffixed parameters
//! let mut query = FindQuery::default();
//! query.filters.insert("age__gte".into(), Some(Value::Int(18)));
//! let found = backend.find(&query)?;
//! ```
//!
//! # Architecture
//!
//! Queries flow through three layers: `sift-query` normalizes parameters and
//! compiles them into predicates and pipeline stages, `sift-store` executes
//! them against a backend, and `sift-core` carries the value model, errors
//! and collaborator traits shared by both. This facade re-exports the public
//! surface of all three.

pub use sift_core::{
    DocumentExecutor, Error, FacetBucket, FieldPath, FindResult, FoundRecord, JsonCodec, MergeFn,
    PointOps, RecordCodec, Result, ScanSource, Value,
};
pub use sift_query::{
    build_parameter_predicates, collect_predicates, compile, normalize_parameter, normalize_value,
    parse_ordering, render, CommonParams, FacetSpec, Operator, PipelineStage, Predicate, RawParams,
    DEFAULT_LIMIT, MAX_LIMIT, PARAM_DELIMITER,
};
pub use sift_store::{
    merge_documents, merge_patch, merge_records, Backend, DocumentBackend, FindQuery, KvBackend,
    KvConfig, MemoryKv,
};
