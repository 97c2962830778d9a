//! Unified backend capability set
//!
//! Both storage backends expose the same operations behind one trait;
//! what varies is the translation underneath: pipeline stages for the
//! document store, predicate evaluation for the key-value store. Callers
//! pick an implementation at construction and program against the trait.

use sift_core::{FindResult, FoundRecord, Result, Value};
use sift_query::{CommonParams, FacetSpec, RawParams};

/// One faceted, paginated find request.
///
/// `exact` holds the structured exact-match parameters, `filters` the free
/// suffixed filter parameters; on key collision the free filters win.
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    /// Pagination and ordering
    pub common: CommonParams,
    /// Structured exact-match parameters
    pub exact: RawParams,
    /// Free suffixed filter parameters
    pub filters: RawParams,
    /// Facet field classification
    pub facets: FacetSpec,
}

/// Capability set shared by the storage backends.
///
/// Implementations are stateless with respect to concurrency: safe to
/// invoke from multiple request-handling threads without locking.
pub trait Backend: Send + Sync {
    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id has no record; backend failures propagate.
    fn get(&self, id: &str) -> Result<FoundRecord>;

    /// Store a new record under the given id.
    ///
    /// Id generation belongs to the caller; this layer never invents one.
    ///
    /// # Errors
    ///
    /// Backend failures propagate.
    fn create(&self, id: &str, record: Value) -> Result<FoundRecord>;

    /// Replace the record stored under the given id.
    ///
    /// # Errors
    ///
    /// Backend failures propagate.
    fn replace(&self, id: &str, record: Value) -> Result<FoundRecord>;

    /// Apply a partial update to the record stored under the given id.
    ///
    /// Sequence-typed fields union with the stored value; other fields
    /// overwrite (see the merge resolver).
    ///
    /// # Errors
    ///
    /// Backend failures propagate.
    fn update(&self, id: &str, patch: Value) -> Result<()>;

    /// Delete the record stored under the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id has no record.
    fn delete(&self, id: &str) -> Result<()>;

    /// Run a faceted, paginated find.
    ///
    /// # Errors
    ///
    /// Validation errors for malformed parameters; backend failures
    /// propagate. All-or-nothing: partial results are never returned.
    fn find(&self, query: &FindQuery) -> Result<FindResult>;
}
