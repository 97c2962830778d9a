//! Error types for siftdb
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! # Categories
//!
//! | Category   | Variants                              | Contract                          |
//! |------------|---------------------------------------|-----------------------------------|
//! | Validation | `Validation`, `UnsupportedOperator`   | surfaced synchronously, no retry  |
//! | Not found  | `NotFound`                            | point lookup miss                 |
//! | Backend    | `Backend`                             | wraps store failures, no retry    |
//! | System     | `Serialization`                       | codec failures                    |

use thiserror::Error;

/// Result type alias for siftdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the query compiler and storage backends
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed parameter: operator/value arity mismatch, bad bounds,
    /// bad ordering token. Never silently corrected.
    #[error("invalid parameter '{parameter}': {reason}")]
    Validation {
        /// The offending parameter key
        parameter: String,
        /// Why it was rejected
        reason: String,
    },

    /// Operator token not supported by the invoked evaluator.
    /// Signaled before any record is inspected, not per-record.
    #[error("unsupported operator: {operator}")]
    UnsupportedOperator {
        /// The rejected operator token
        operator: String,
    },

    /// Point lookup on a missing key
    #[error("key not found: {key}")]
    NotFound {
        /// The missing key
        key: String,
    },

    /// Failure reported by the external store; propagated with context,
    /// never retried here.
    #[error("backend error during {context}: {reason}")]
    Backend {
        /// Offending key or operation
        context: String,
        /// Store-reported failure
        reason: String,
    },

    /// Record encode/decode failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a validation error for a named parameter.
    pub fn validation(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Build a backend error with operation context.
    pub fn backend(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Backend {
            context: context.into(),
            reason: reason.into(),
        }
    }
}
