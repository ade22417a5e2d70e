//! Filter-map driven N1QL query executor
//!
//! Callers describe what they want as a flat JSON object whose keys carry
//! operator suffixes (`age_from`, `name_contains`, `owner_nullormissing`,
//! ...). The executor composes those into one parameterized predicate and
//! runs list, paged list, count and sum statements against a Couchbase
//! bucket.

pub mod app;
pub mod core;
pub mod data;
pub mod utils;
