//! Converters for documents stored directly in a Couchbase bucket

use crate::data::error::ConversionError;

use super::{DataConverter, Document, RawRow, split_row};

/// Id field used when records do not declare their own
pub const COUCHBASE_ID_FIELD: &str = "id";

/// Injects the document id as `id`
#[derive(Debug, Clone, Copy, Default)]
pub struct CouchbaseConverter;

impl DataConverter for CouchbaseConverter {
    fn convert(&self, row: RawRow, _id_field: &'static str) -> Result<Document, ConversionError> {
        let (mut data, id) = split_row(row)?;
        data.insert(COUCHBASE_ID_FIELD.to_string(), id);
        Ok(data)
    }

    fn name(&self) -> &'static str {
        "couchbase"
    }
}

/// Injects the document id into the record's declared id field
#[derive(Debug, Clone, Copy, Default)]
pub struct CouchbaseIdFieldConverter;

impl DataConverter for CouchbaseIdFieldConverter {
    fn convert(&self, row: RawRow, id_field: &'static str) -> Result<Document, ConversionError> {
        let (mut data, id) = split_row(row)?;
        data.insert(id_field.to_string(), id);
        Ok(data)
    }

    fn name(&self) -> &'static str {
        "couchbase-id-field"
    }
}
