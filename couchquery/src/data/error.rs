//! Error types for the query layer
//!
//! Transport and conversion failures are wrapped unchanged; the only error
//! the executor originates itself is a non-unique single result.

use serde_json::Value;
use thiserror::Error;

use crate::data::filters::FilterMap;

/// Failure reported by a query transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network or protocol failure talking to the query service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The query service rejected or failed the statement
    #[error("Query failed ({status}): {message}")]
    Query { status: String, message: String },

    /// The response body did not have the expected shape
    #[error("Malformed query response: {0}")]
    Response(String),

    /// Transport could not be set up
    #[error("Transport configuration error: {0}")]
    Config(String),
}

impl TransportError {
    pub fn query(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            status: status.into(),
            message: message.into(),
        }
    }

    pub fn response(message: impl Into<String>) -> Self {
        Self::Response(message.into())
    }
}

/// Failure converting a raw row into a record
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Failed to deserialize record: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl ConversionError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRow(message.into())
    }
}

/// Error type for executor operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// More than one document matched a single-result lookup
    #[error("Query returned more than one result for filters {}", render_filters(.filters))]
    NonUniqueResult { filters: FilterMap },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// An aggregate row carried a value that is not an integer
    #[error("Unexpected {field} value in aggregate row: {value}")]
    UnexpectedAggregate { field: &'static str, value: Value },
}

impl QueryError {
    pub fn non_unique(filters: &FilterMap) -> Self {
        Self::NonUniqueResult {
            filters: filters.clone(),
        }
    }

    pub fn unexpected_aggregate(field: &'static str, value: Value) -> Self {
        Self::UnexpectedAggregate { field, value }
    }

    /// Filter map of a non-unique result
    pub fn filters(&self) -> Option<&FilterMap> {
        match self {
            Self::NonUniqueResult { filters } => Some(filters),
            _ => None,
        }
    }
}

fn render_filters(filters: &FilterMap) -> String {
    Value::Object(filters.clone()).to_string()
}
