//! Filter type definitions
//!
//! Defines the operator kinds encoded by filter-key suffixes and the decoded
//! form of a single filter key.

use std::fmt;

/// Caller-supplied filter parameters.
///
/// Keys encode a property path plus an optional operator suffix; values are
/// bound to the statement under the unmodified key.
pub type FilterMap = serde_json::Map<String, serde_json::Value>;

pub const CONTAINS_FILTER: &str = "_contains";
pub const FROM_FILTER: &str = "_from";
pub const TO_FILTER: &str = "_to";
pub const NOT_FILTER: &str = "_not";
pub const IN_FILTER: &str = "_in";
pub const NULL_FILTER: &str = "_null";
pub const NOT_NULL_FILTER: &str = "_notnull";
pub const MISSING_FILTER: &str = "_missing";
pub const NULL_OR_MISSING_FILTER: &str = "_nullormissing";

/// Operator encoded by a filter-key suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Equals,
    NotEquals,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    In,
    IsNull,
    IsNotNull,
    IsMissing,
    IsNullOrMissing,
}

impl OperatorKind {
    /// Whether the fragment for this operator references a bound parameter
    pub fn is_value_bearing(&self) -> bool {
        !matches!(
            self,
            Self::IsNull | Self::IsNotNull | Self::IsMissing | Self::IsNullOrMissing
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::LessOrEqual => "less_or_equal",
            Self::Contains => "contains",
            Self::In => "in",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::IsMissing => "is_missing",
            Self::IsNullOrMissing => "is_null_or_missing",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suffix dispatch table, tested top to bottom; the first match wins.
///
/// `_nullormissing` and `_notnull` must precede `_null`.
pub const FILTER_SUFFIXES: &[(&str, OperatorKind)] = &[
    (CONTAINS_FILTER, OperatorKind::Contains),
    (FROM_FILTER, OperatorKind::GreaterOrEqual),
    (TO_FILTER, OperatorKind::LessOrEqual),
    (NOT_FILTER, OperatorKind::NotEquals),
    (IN_FILTER, OperatorKind::In),
    (NULL_OR_MISSING_FILTER, OperatorKind::IsNullOrMissing),
    (NOT_NULL_FILTER, OperatorKind::IsNotNull),
    (MISSING_FILTER, OperatorKind::IsMissing),
    (NULL_FILTER, OperatorKind::IsNull),
];

/// A filter key split into its property path and operator.
///
/// `key` is kept verbatim because it doubles as the placeholder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKey<'a> {
    pub key: &'a str,
    pub path: &'a str,
    pub operator: OperatorKind,
}
