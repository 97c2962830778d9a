//! Pipeline compilation for the document-store backend
//!
//! Composes predicates plus ordering/pagination/facet requests into an
//! ordered stage sequence. Stage order is fixed and semantically
//! significant: `[Lookup*, Match?, Sort?, Facet]`, with lookups before
//! match, match before sort, sort before facet. The compiled stages are a pure
//! description; execution belongs to the external store.

use serde_json::json;
use tracing::debug;

use sift_core::{Error, Result};

use crate::predicate::{collect_predicates, Predicate, RawParams};

/// Default page size when the request does not specify one.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on the page size.
pub const MAX_LIMIT: u32 = 100;

/// Common pagination and ordering parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonParams {
    limit: u32,
    offset: u64,
    ordering: Option<String>,
}

impl Default for CommonParams {
    fn default() -> Self {
        CommonParams {
            limit: DEFAULT_LIMIT,
            offset: 0,
            ordering: None,
        }
    }
}

impl CommonParams {
    /// Build common parameters, validating the limit bounds.
    ///
    /// # Errors
    ///
    /// Returns a validation error for `limit = 0` or `limit > 100`.
    pub fn new(limit: u32, offset: u64, ordering: Option<String>) -> Result<Self> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(Error::validation(
                "limit",
                format!("limit must be within 1..={MAX_LIMIT}, got {limit}"),
            ));
        }
        Ok(CommonParams {
            limit,
            offset,
            ordering,
        })
    }

    /// Page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of matched records to skip.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Raw ordering parameter, if supplied.
    pub fn ordering(&self) -> Option<&str> {
        self.ordering.as_deref()
    }
}

/// Caller-supplied facet field classification.
///
/// Whether a field is list-valued cannot be inferred here; the caller
/// declares it, and list-valued fields are unwound before counting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSpec {
    /// Fields whose values are sequences (unwound before counting)
    pub list_fields: Vec<String>,
    /// Fields whose values are scalars (counted directly)
    pub scalar_fields: Vec<String>,
}

impl FacetSpec {
    /// Iterate all facet fields, list-valued first.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.list_fields
            .iter()
            .chain(self.scalar_fields.iter())
            .map(String::as_str)
    }

    /// Whether the given field was declared list-valued.
    pub fn is_list_field(&self, field: &str) -> bool {
        self.list_fields.iter().any(|f| f == field)
    }
}

/// One step of a compiled aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    /// Join a referenced collection by field name, ahead of filtering
    Lookup {
        /// Field naming the referenced collection
        field: String,
    },
    /// AND-combined predicate filter
    Match {
        /// The AND-list of predicates
        predicates: Vec<Predicate>,
    },
    /// Ordered field -> direction mapping (1 ascending, -1 descending)
    Sort {
        /// Sort keys in application order
        fields: Vec<(String, i8)>,
    },
    /// Terminal stage: per-field count buckets, total count, result page
    Facet {
        /// Facet field classification
        spec: FacetSpec,
        /// Page size for the results bucket
        limit: u32,
        /// Skip count for the results bucket
        offset: u64,
    },
}

impl PipelineStage {
    /// Render the stage as a document for the executor boundary.
    pub fn to_document(&self) -> serde_json::Value {
        match self {
            PipelineStage::Lookup { field } => json!({
                "$lookup": {
                    "from": field,
                    "localField": field,
                    "foreignField": "_id",
                    "as": field,
                }
            }),
            PipelineStage::Match { predicates } => {
                let and_list: Vec<serde_json::Value> =
                    predicates.iter().map(Predicate::to_document).collect();
                json!({ "$match": { "$and": and_list } })
            }
            PipelineStage::Sort { fields } => {
                let mut sort_doc = serde_json::Map::new();
                for (field, direction) in fields {
                    sort_doc.insert(field.clone(), json!(direction));
                }
                json!({ "$sort": sort_doc })
            }
            PipelineStage::Facet {
                spec,
                limit,
                offset,
            } => {
                let mut facet_doc = serde_json::Map::new();
                for field in spec.fields() {
                    let mut bucket = Vec::new();
                    if spec.is_list_field(field) {
                        // Sequence-valued fields are unwound before counting
                        bucket.push(json!({ "$unwind": format!("${field}") }));
                    }
                    bucket.push(json!({ "$sortByCount": format!("${field}") }));
                    facet_doc.insert(field.to_string(), serde_json::Value::Array(bucket));
                }
                facet_doc.insert("metadata".to_string(), json!([{ "$count": "count" }]));
                facet_doc.insert(
                    "results".to_string(),
                    json!([{ "$skip": offset }, { "$limit": limit }]),
                );
                json!({ "$facet": facet_doc })
            }
        }
    }
}

/// Render a compiled stage sequence for the executor boundary.
pub fn render(stages: &[PipelineStage]) -> Vec<serde_json::Value> {
    stages.iter().map(PipelineStage::to_document).collect()
}

/// Compile a request into an ordered stage sequence.
///
/// Exact-match parameters and free filters merge into one parameter set
/// (free filters win on key collision); absent values are dropped; each
/// remaining parameter normalizes into predicates. A `Match` stage is
/// emitted only when predicates resulted, a `Sort` stage only when an
/// ordering was supplied, and exactly one `Facet` stage terminates the
/// pipeline. `Lookup` stages for the declared join fields lead it.
///
/// # Errors
///
/// An operator/value arity mismatch or malformed ordering token aborts
/// compilation, identifying the offending parameter.
pub fn compile(
    common: &CommonParams,
    exact_match_params: &RawParams,
    free_filters: &RawParams,
    facets: &FacetSpec,
    lookup_fields: &[String],
) -> Result<Vec<PipelineStage>> {
    let mut stages: Vec<PipelineStage> = lookup_fields
        .iter()
        .map(|field| PipelineStage::Lookup {
            field: field.clone(),
        })
        .collect();

    let mut params = exact_match_params.clone();
    params.extend(free_filters.clone());

    let predicates = collect_predicates(&params)?;
    if !predicates.is_empty() {
        debug!(count = predicates.len(), "adding match stage");
        stages.push(PipelineStage::Match { predicates });
    }

    if let Some(ordering) = common.ordering() {
        let fields = parse_ordering(ordering)?;
        debug!(?fields, "adding sort stage");
        stages.push(PipelineStage::Sort { fields });
    }

    stages.push(PipelineStage::Facet {
        spec: facets.clone(),
        limit: common.limit(),
        offset: common.offset(),
    });

    Ok(stages)
}

/// Parse the comma-separated ordering grammar into sort keys.
///
/// A leading `-` marks descending. Later duplicate fields overwrite the
/// direction of earlier ones but keep the original position (mapping
/// semantics, not list semantics).
///
/// # Errors
///
/// Returns a validation error for an empty token (`"a,,b"` or a bare `-`).
pub fn parse_ordering(ordering: &str) -> Result<Vec<(String, i8)>> {
    let mut fields: Vec<(String, i8)> = Vec::new();
    for token in ordering.split(',') {
        let (field, direction) = match token.strip_prefix('-') {
            Some(rest) => (rest, -1),
            None => (token, 1),
        };
        if field.is_empty() {
            return Err(Error::validation(
                "ordering",
                format!("empty ordering token in '{ordering}'"),
            ));
        }
        match fields.iter_mut().find(|(existing, _)| existing == field) {
            Some(entry) => entry.1 = direction,
            None => fields.push((field.to_string(), direction)),
        }
    }
    Ok(fields)
}
