//! Filter key parsing
//!
//! Decodes a filter key into a property path and operator by suffix.

use super::types::{FILTER_SUFFIXES, FilterKey, OperatorKind};

/// Parse a filter key
///
/// Suffixes are matched against [`FILTER_SUFFIXES`] in order. A key without
/// a reserved suffix is an equality filter on the whole key. Every key
/// parses; a key consisting only of a suffix yields an empty path.
pub fn parse_key(key: &str) -> FilterKey<'_> {
    FILTER_SUFFIXES
        .iter()
        .find_map(|(suffix, operator)| {
            key.strip_suffix(suffix).map(|path| FilterKey {
                key,
                path,
                operator: *operator,
            })
        })
        .unwrap_or(FilterKey {
            key,
            path: key,
            operator: OperatorKind::Equals,
        })
}
