//! Merge resolver: the key-value store's associative merge rule
//!
//! Combines a partial-update payload with a previously stored record at
//! write/compaction time. The store may apply pending merges out of strict
//! program order, in any grouping, and more than once for the same logical
//! update; the rule is therefore associative and total, and sequence-field
//! union is idempotent under re-application.

use tracing::warn;

use sift_core::{Result, Value};

/// Merge a patch into an existing stored value at the byte level.
///
/// `MergeFn`-compatible: total, stateless, safe to register with a store
/// that invokes it during background compaction.
///
/// - no existing value: the patch becomes the stored value verbatim
/// - both values decode as field mappings: each patch field either unions
///   with the existing field (both sequence-typed, duplicates removed,
///   existing order first) or overwrites it
/// - undecodable existing bytes: the patch wins (a compaction hook has no
///   error channel)
pub fn merge_patch(existing: Option<&[u8]>, patch: &[u8]) -> Vec<u8> {
    let Some(existing) = existing else {
        return patch.to_vec();
    };

    let existing_doc: serde_json::Value = match serde_json::from_slice(existing) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(%err, "existing value is not decodable, patch wins");
            return patch.to_vec();
        }
    };
    let patch_doc: serde_json::Value = match serde_json::from_slice(patch) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(%err, "patch is not decodable, stored verbatim");
            return patch.to_vec();
        }
    };

    let merged = merge_documents(existing_doc, patch_doc);
    // Object keys are map-ordered, so re-encoding is deterministic
    serde_json::to_vec(&merged).unwrap_or_else(|_| patch.to_vec())
}

/// Merge two decoded field mappings, patch fields winning.
///
/// When both sides of a field are sequences the result is their set union:
/// existing elements in order, then patch elements not already present.
/// Non-object inputs resolve to the patch.
pub fn merge_documents(existing: serde_json::Value, patch: serde_json::Value) -> serde_json::Value {
    let (existing_map, patch_map) = match (existing, patch) {
        (serde_json::Value::Object(existing_map), serde_json::Value::Object(patch_map)) => {
            (existing_map, patch_map)
        }
        // Only field mappings merge field-wise
        (_, patch) => return patch,
    };
    let mut existing_map = existing_map;

    for (field, patch_value) in patch_map {
        match (existing_map.remove(&field), patch_value) {
            (Some(serde_json::Value::Array(existing_items)), serde_json::Value::Array(new_items)) => {
                existing_map.insert(
                    field,
                    serde_json::Value::Array(union(existing_items, new_items)),
                );
            }
            (_, patch_value) => {
                existing_map.insert(field, patch_value);
            }
        }
    }
    serde_json::Value::Object(existing_map)
}

fn union(existing: Vec<serde_json::Value>, new: Vec<serde_json::Value>) -> Vec<serde_json::Value> {
    let mut merged = existing;
    for item in new {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}

/// Value-level convenience used by the document backend's patch path.
pub fn merge_records(existing: &Value, patch: &Value) -> Result<Value> {
    let merged = merge_documents(existing.clone().into(), patch.clone().into());
    Ok(merged.into())
}
