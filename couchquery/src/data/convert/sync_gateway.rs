//! Converters for documents written through Sync Gateway
//!
//! Gateway documents carry replication metadata under `_sync` and expose
//! their id and revision as `_id` and `_rev`.

use serde_json::Value;

use crate::data::error::ConversionError;

use super::{DataConverter, Document, RawRow, split_row};

pub const SYNC_METADATA_FIELD: &str = "_sync";
pub const SYNC_GATEWAY_ID_FIELD: &str = "_id";
pub const SYNC_GATEWAY_REV_FIELD: &str = "_rev";

/// Drop `_sync` metadata, carrying its revision over as `_rev`
fn strip_metadata(data: &mut Document) {
    let rev = data
        .remove(SYNC_METADATA_FIELD)
        .and_then(|sync| sync.get("rev").and_then(Value::as_str).map(str::to_string));

    if let Some(rev) = rev {
        data.insert(SYNC_GATEWAY_REV_FIELD.to_string(), Value::String(rev));
    }
}

/// Injects the document id as `_id`
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncGatewayConverter;

impl DataConverter for SyncGatewayConverter {
    fn convert(&self, row: RawRow, _id_field: &'static str) -> Result<Document, ConversionError> {
        let (mut data, id) = split_row(row)?;
        strip_metadata(&mut data);
        data.insert(SYNC_GATEWAY_ID_FIELD.to_string(), id);
        Ok(data)
    }

    fn name(&self) -> &'static str {
        "sync-gateway"
    }
}

/// Injects the document id into the record's declared id field
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncGatewayIdFieldConverter;

impl DataConverter for SyncGatewayIdFieldConverter {
    fn convert(&self, row: RawRow, id_field: &'static str) -> Result<Document, ConversionError> {
        let (mut data, id) = split_row(row)?;
        strip_metadata(&mut data);
        data.insert(id_field.to_string(), id);
        Ok(data)
    }

    fn name(&self) -> &'static str {
        "sync-gateway-id-field"
    }
}
