//! Filter operator enumeration
//!
//! The operator set is closed. Only a subset of it is reachable through the
//! parameter-key suffix grammar (`gt, gte, lt, lte, in, nin, contains,
//! icontains`); the rest (`eq, ne, exists`) is reachable through the typed
//! evaluator API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use sift_core::Error;

/// A filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Exact equality
    Eq,
    /// Inequality
    Ne,
    /// Strictly less than
    Lt,
    /// Less than or equal
    Lte,
    /// Strictly greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Membership in a sequence of candidates
    In,
    /// Non-membership in a sequence of candidates
    Nin,
    /// Substring / element containment
    Contains,
    /// Case-insensitive substring containment
    IContains,
    /// Truthy presence of the field
    Exists,
}

impl Operator {
    /// Parse a trailing parameter-key token.
    ///
    /// Returns `None` for anything outside the suffix grammar; the caller
    /// then treats the token as a nested field segment.
    pub fn from_suffix(token: &str) -> Option<Operator> {
        match token {
            "gt" => Some(Operator::Gt),
            "gte" => Some(Operator::Gte),
            "lt" => Some(Operator::Lt),
            "lte" => Some(Operator::Lte),
            "in" => Some(Operator::In),
            "nin" => Some(Operator::Nin),
            "contains" => Some(Operator::Contains),
            "icontains" => Some(Operator::IContains),
            _ => None,
        }
    }

    /// List-arity operators expect a sequence value.
    pub fn is_list(&self) -> bool {
        matches!(self, Operator::In | Operator::Nin)
    }

    /// Containment operators render as substring-match expressions.
    pub fn is_contains(&self) -> bool {
        matches!(self, Operator::Contains | Operator::IContains)
    }

    /// The canonical token, as it appears in parameter keys and errors.
    pub fn as_token(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::In => "in",
            Operator::Nin => "nin",
            Operator::Contains => "contains",
            Operator::IContains => "icontains",
            Operator::Exists => "exists",
        }
    }

    /// The document-store comparison tag (`$`-prefixed internal form).
    ///
    /// `Contains`/`IContains` have no single tag; the predicate builder
    /// renders them as regex expressions instead.
    pub fn render_tag(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Exists => "$exists",
            Operator::Contains | Operator::IContains => "$regex",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    /// Parse an operator token from the evaluator API.
    ///
    /// Accepts the suffix-grammar spellings plus the short comparison forms
    /// (`le`, `ge`) and the evaluator-only tokens (`eq`, `ne`, `exists`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "lt" => Ok(Operator::Lt),
            "le" | "lte" => Ok(Operator::Lte),
            "gt" => Ok(Operator::Gt),
            "ge" | "gte" => Ok(Operator::Gte),
            "in" => Ok(Operator::In),
            "nin" => Ok(Operator::Nin),
            "contains" => Ok(Operator::Contains),
            "icontains" => Ok(Operator::IContains),
            "exists" => Ok(Operator::Exists),
            other => Err(Error::UnsupportedOperator {
                operator: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}
