//! Row conversion strategies
//!
//! A query row is `{"data": <document>, "id": <META id>}`. A converter turns
//! it into the JSON document a record deserializes from, injecting the
//! document id. Four strategies exist:
//!
//! |                     | default id field   | record-declared id field      |
//! |---------------------|--------------------|-------------------------------|
//! | Couchbase bucket    | `CouchbaseConverter` | `CouchbaseIdFieldConverter` |
//! | Sync Gateway bucket | `SyncGatewayConverter` | `SyncGatewayIdFieldConverter` |
//!
//! One is chosen at startup with [`select_converter`] and never replaced.

mod couchbase;
mod sync_gateway;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::data::error::ConversionError;
use crate::data::n1ql::{DATA_FIELD, ID_FIELD};

pub use couchbase::{CouchbaseConverter, CouchbaseIdFieldConverter};
pub use sync_gateway::{SyncGatewayConverter, SyncGatewayIdFieldConverter};

/// Untyped row returned by the query service
pub type RawRow = Map<String, Value>;

/// JSON document a record deserializes from
pub type Document = Map<String, Value>;

/// A type query rows convert into
///
/// `ID_FIELD` names the field receiving the document id when a converter
/// honors record-declared id fields.
pub trait Record: DeserializeOwned {
    const ID_FIELD: &'static str = "id";
}

/// Untyped records, as printed by the CLI
impl Record for Value {}

/// Strategy shaping a raw row into a record document
pub trait DataConverter: Send + Sync + fmt::Debug {
    /// Convert a row, given the target record's declared id field
    fn convert(&self, row: RawRow, id_field: &'static str) -> Result<Document, ConversionError>;

    fn name(&self) -> &'static str;
}

/// Convert a row into a record of type `T`
pub fn convert_row<T: Record>(
    converter: &dyn DataConverter,
    row: RawRow,
) -> Result<T, ConversionError> {
    let document = converter.convert(row, T::ID_FIELD)?;
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Conversion strategy identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    Couchbase,
    CouchbaseIdField,
    SyncGateway,
    SyncGatewayIdField,
}

impl ConverterKind {
    pub fn from_flags(with_sync_gateway: bool, use_default_id_fields: bool) -> Self {
        match (with_sync_gateway, use_default_id_fields) {
            (false, true) => Self::Couchbase,
            (false, false) => Self::CouchbaseIdField,
            (true, true) => Self::SyncGateway,
            (true, false) => Self::SyncGatewayIdField,
        }
    }

    pub fn build(self) -> Arc<dyn DataConverter> {
        match self {
            Self::Couchbase => Arc::new(CouchbaseConverter),
            Self::CouchbaseIdField => Arc::new(CouchbaseIdFieldConverter),
            Self::SyncGateway => Arc::new(SyncGatewayConverter),
            Self::SyncGatewayIdField => Arc::new(SyncGatewayIdFieldConverter),
        }
    }
}

/// Pick the conversion strategy for the configured bucket flavor
pub fn select_converter(
    with_sync_gateway: bool,
    use_default_id_fields: bool,
) -> Arc<dyn DataConverter> {
    let kind = ConverterKind::from_flags(with_sync_gateway, use_default_id_fields);
    tracing::debug!(converter = ?kind, "Selected row converter");
    kind.build()
}

/// Split a row into its document body and id
fn split_row(mut row: RawRow) -> Result<(Document, Value), ConversionError> {
    let id = match row.remove(ID_FIELD) {
        Some(id @ Value::String(_)) => id,
        Some(other) => {
            return Err(ConversionError::malformed(format!(
                "row id must be a string, got {}",
                other
            )));
        }
        None => return Err(ConversionError::malformed("row has no id field")),
    };

    match row.remove(DATA_FIELD) {
        Some(Value::Object(data)) => Ok((data, id)),
        Some(other) => Err(ConversionError::malformed(format!(
            "row data must be an object, got {}",
            other
        ))),
        None => Err(ConversionError::malformed("row has no data field")),
    }
}
