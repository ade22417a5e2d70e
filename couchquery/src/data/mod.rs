//! Query layer
//!
//! Turns a flat filter map into N1QL statements, runs them and converts the
//! returned rows:
//! - `filters` - Filter-key grammar and predicate composition
//! - `n1ql` - Expression tree, sort/page model and statement shapes
//! - `convert` - Row-to-record conversion strategies
//! - `transport` - Statement execution (HTTP query service, in-memory)
//! - `executor` - Public find/count/sum surface
//! - `types` - Page results
//! - `error` - Error types

pub mod convert;
pub mod error;
pub mod executor;
pub mod filters;
pub mod n1ql;
pub mod transport;
pub mod types;

pub use convert::{DataConverter, Record, select_converter};
pub use error::{ConversionError, QueryError, TransportError};
pub use executor::QueryExecutor;
pub use filters::FilterMap;
pub use n1ql::{Order, PageRequest, Statement};
pub use transport::{HttpTransport, MemoryTransport, QueryTransport};
pub use types::{Page, PageMeta};
