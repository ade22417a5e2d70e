//! Predicate builder
//!
//! Compiles decoded filter keys into N1QL fragments and folds them into the
//! WHERE predicate shared by every statement shape.

use crate::data::n1ql::{CompareOp, Expression, IsCheck};

use super::parser::parse_key;
use super::types::{FilterKey, FilterMap, OperatorKind};

/// Document id prefix reserved for Sync Gateway metadata documents
pub const SYNC_METADATA_PATTERN: &str = "_sync:%";

/// Compile one decoded filter key into a predicate fragment
///
/// Value-bearing fragments bind the original key, so the filter map itself
/// is the parameter source.
pub fn compile_fragment(filter: &FilterKey<'_>) -> Expression {
    let path = || Expression::path(filter.path);
    let param = || Expression::param(filter.key);

    match filter.operator {
        OperatorKind::Equals => path().compare(CompareOp::Eq, param()),
        OperatorKind::NotEquals => path().compare(CompareOp::Ne, param()),
        OperatorKind::GreaterOrEqual => path().compare(CompareOp::Gte, param()),
        OperatorKind::LessOrEqual => path().compare(CompareOp::Lte, param()),
        OperatorKind::In => path().compare(CompareOp::In, param()),
        OperatorKind::Contains => path().lower().contains(param().lower()),
        OperatorKind::IsNull => path().is(IsCheck::Null),
        OperatorKind::IsNotNull => path().is(IsCheck::NotNull),
        OperatorKind::IsMissing => path().is(IsCheck::Missing),
        OperatorKind::IsNullOrMissing => path()
            .is(IsCheck::Null)
            .or(path().is(IsCheck::Missing)),
    }
}

/// Fragment hiding Sync Gateway metadata documents from every query
pub fn exclusion_fragment(bucket: &str) -> Expression {
    Expression::meta_id(bucket).compare(
        CompareOp::NotLike,
        Expression::string(SYNC_METADATA_PATTERN),
    )
}

/// Compose the WHERE predicate for a filter map
///
/// Fragments follow the filter map's key order, joined with AND, and the
/// exclusion fragment is always the last conjunct. The fold runs from the
/// last key back, seeded with the exclusion fragment.
pub fn compose_where(bucket: &str, filters: &FilterMap) -> Expression {
    filters
        .keys()
        .rev()
        .map(|key| compile_fragment(&parse_key(key)))
        .fold(exclusion_fragment(bucket), |rest, fragment| fragment.and(rest))
}
