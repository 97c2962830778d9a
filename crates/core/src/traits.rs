//! Collaborator traits at the storage boundary
//!
//! The query core never talks to a store directly; it prepares data for,
//! and interprets data scanned from, external collaborators behind these
//! traits. Suspension points, retries and connection lifecycle all live on
//! the collaborator side.

use crate::error::Result;
use crate::find::FindResult;
use crate::value::Value;

/// Document store executor: accepts an ordered stage sequence and runs it.
///
/// Stages arrive pre-rendered as JSON documents; the executor owns
/// connections, retries and backpressure. The core only builds the stage
/// description.
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple request-handling threads (requires Send + Sync).
pub trait DocumentExecutor: Send + Sync {
    /// Execute an aggregation pipeline against a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure; the core propagates
    /// it without retrying.
    fn run_pipeline(&self, collection: &str, stages: &[serde_json::Value]) -> Result<FindResult>;

    /// Fetch a single document by id. `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn find_one(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Insert a document under the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn insert_one(&self, collection: &str, id: &str, record: &Value) -> Result<()>;

    /// Replace the document stored under the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn replace_one(&self, collection: &str, id: &str, record: &Value) -> Result<()>;

    /// Delete a document by id. Returns whether a document was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn delete_one(&self, collection: &str, id: &str) -> Result<bool>;
}

/// Forward scan over the encoded records of one logical collection.
///
/// A call to `scan` is one seek-to-first pass in key order. The returned
/// snapshot is finite and single-use; re-issuing the scan is the way to
/// restart it.
pub trait ScanSource: Send + Sync {
    /// Produce the encoded records in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn scan(&self) -> Result<Vec<(String, Vec<u8>)>>;
}

/// Point operations of the key-value collaborator.
///
/// The store guarantees a merge is atomic with respect to other merges and
/// reads on the same key; it does not guarantee *when* pending merges are
/// folded, so the registered merge function must tolerate any accumulation
/// order.
pub trait PointOps: Send + Sync {
    /// Fetch the current value for a key, folding pending merges.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value, discarding pending merges for the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Queue a partial-update payload for merge-on-read/compaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn merge(&self, key: &str, patch: Vec<u8>) -> Result<()>;

    /// Delete a key. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure.
    fn delete(&self, key: &str) -> Result<bool>;
}

/// Stateless merge hook registered with the key-value store.
///
/// Must be associative and total: it is invoked during background
/// compaction, possibly several times for the same logical update, in any
/// grouping order, and has no way to surface an error mid-compaction.
pub type MergeFn = fn(Option<&[u8]>, &[u8]) -> Vec<u8>;

/// Record codec supplied by the surrounding model layer.
pub trait RecordCodec: Send + Sync {
    /// Encode a record to its stored byte form.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded.
    fn encode(&self, record: &Value) -> Result<Vec<u8>>;

    /// Decode stored bytes back into a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid record.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// JSON record codec: the wire format both backends share.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn encode(&self, record: &Value) -> Result<Vec<u8>> {
        let json: serde_json::Value = record.clone().into();
        Ok(serde_json::to_vec(&json)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(json.into())
    }
}
