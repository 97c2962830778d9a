//! Filter-query language: normalization, predicates, pipeline compilation
//!
//! This crate turns a flat mapping of suffixed string keys
//! (`age__gte=21`, `name__icontains=bo`) into normalized predicates and
//! compiles them, together with ordering/pagination/facet requests, into
//! an ordered aggregation-stage sequence for a document-store executor.
//!
//! Everything here is pure and stateless: safe to invoke concurrently,
//! no I/O, no retained references past a single call.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod normalize;
pub mod operator;
pub mod pipeline;
pub mod predicate;

pub use normalize::{normalize_parameter, normalize_value, PARAM_DELIMITER};
pub use operator::Operator;
pub use pipeline::{
    compile, parse_ordering, render, CommonParams, FacetSpec, PipelineStage, DEFAULT_LIMIT,
    MAX_LIMIT,
};
pub use predicate::{
    build_parameter_predicates, collect_predicates, escape_pattern, Predicate, RawParams,
};
