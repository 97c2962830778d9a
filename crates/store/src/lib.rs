//! Storage backends for the filtering query language
//!
//! Two backends implement the shared [`Backend`] trait: a document-store
//! backend that compiles find requests into aggregation pipelines and
//! hands them to an external executor, and a key-value backend that
//! evaluates the same filters in-process over a forward scan. Both return
//! the same [`FindResult`](sift_core::FindResult) shape, so callers swap
//! stores without touching query code.
//!
//! The key-value side also carries the merge resolver ([`merge_patch`])
//! for partial updates and [`MemoryKv`], an in-memory store modelling a
//! merge-operator embedded store.

#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod document;
pub mod eval;
pub mod kv;
pub mod memory;
pub mod merge;

pub use backend::{Backend, FindQuery};
pub use config::KvConfig;
pub use document::DocumentBackend;
pub use kv::KvBackend;
pub use memory::MemoryKv;
pub use merge::{merge_documents, merge_patch, merge_records};
