//! Filter-map predicate system
//!
//! Decodes suffixed filter keys into operators and composes them into the
//! WHERE predicate used by every statement shape.
//!
//! ## Usage
//!
//! ```
//! use couchquery::data::filters::{FilterMap, compose_where};
//!
//! let filters: FilterMap = serde_json::from_str(r#"{"age_from": 18}"#).unwrap();
//! let predicate = compose_where("people", &filters);
//! assert_eq!(
//!     predicate.to_string(),
//!     r#"age >= $age_from AND META(`people`).id NOT LIKE "_sync:%""#
//! );
//! ```

mod builder;
mod parser;
mod types;

pub use builder::{SYNC_METADATA_PATTERN, compile_fragment, compose_where, exclusion_fragment};
pub use parser::parse_key;
pub use types::{
    CONTAINS_FILTER, FILTER_SUFFIXES, FROM_FILTER, FilterKey, FilterMap, IN_FILTER,
    MISSING_FILTER, NOT_FILTER, NOT_NULL_FILTER, NULL_FILTER, NULL_OR_MISSING_FILTER,
    OperatorKind, TO_FILTER,
};
