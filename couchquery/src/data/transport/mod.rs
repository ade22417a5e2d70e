//! Statement execution transports
//!
//! A transport runs one parameterized statement and returns its raw rows.
//! The same contract serves every statement shape; only the row layout
//! differs.
//!
//! - `http` - Couchbase query service over its REST endpoint
//! - `memory` - In-process bucket evaluating statements directly

mod http;
mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::data::error::TransportError;
use crate::data::n1ql::Query;

pub use http::{HttpTransport, QUERY_SERVICE_PATH};
pub use memory::MemoryTransport;

/// Executes parameterized statements against a document store
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Run the query once and return its rows in result order
    async fn execute(&self, query: &Query) -> Result<Vec<Value>, TransportError>;

    fn name(&self) -> &'static str;
}
