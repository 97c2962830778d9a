//! Core types and traits for siftdb
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: unified value enum for parameters, predicates and records
//! - FieldPath: dot-separated addressing of nested record attributes
//! - Error: error type hierarchy (validation / not-found / backend)
//! - Traits: collaborator boundaries (DocumentExecutor, ScanSource,
//!   PointOps, RecordCodec) and the MergeFn hook type
//! - FindResult: the result contract shared by both execution backends

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod find;
pub mod path;
pub mod traits;
pub mod value;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use find::{FacetBucket, FindResult, FoundRecord};
pub use path::FieldPath;
pub use traits::{DocumentExecutor, JsonCodec, MergeFn, PointOps, RecordCodec, ScanSource};
pub use value::Value;
