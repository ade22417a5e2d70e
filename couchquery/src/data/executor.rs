//! Filter-map query executor
//!
//! Each call builds its statement from scratch, runs it once through the
//! transport and converts the rows. The executor holds no mutable state, so
//! a single instance can be shared across tasks.

use std::sync::Arc;

use serde_json::Value;

use crate::data::convert::{DataConverter, RawRow, Record, convert_row, select_converter};
use crate::data::error::{ConversionError, QueryError};
use crate::data::filters::FilterMap;
use crate::data::n1ql::{COUNT_FIELD, PageRequest, Query, SUM_FIELD, Statement};
use crate::data::transport::QueryTransport;
use crate::data::types::Page;

#[derive(Clone)]
pub struct QueryExecutor {
    bucket: String,
    transport: Arc<dyn QueryTransport>,
    converter: Arc<dyn DataConverter>,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("bucket", &self.bucket)
            .field("transport", &self.transport.name())
            .field("converter", &self.converter.name())
            .finish()
    }
}

impl QueryExecutor {
    pub fn new(
        bucket: impl Into<String>,
        transport: Arc<dyn QueryTransport>,
        converter: Arc<dyn DataConverter>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            transport,
            converter,
        }
    }

    /// Build an executor whose converter is chosen by the bucket flags
    pub fn with_flags(
        bucket: impl Into<String>,
        transport: Arc<dyn QueryTransport>,
        with_sync_gateway: bool,
        use_default_id_fields: bool,
    ) -> Self {
        let converter = select_converter(with_sync_gateway, use_default_id_fields);
        Self::new(bucket, transport, converter)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn converter(&self) -> &dyn DataConverter {
        self.converter.as_ref()
    }

    /// Find at most one record
    ///
    /// Fails with [`QueryError::NonUniqueResult`] when several documents
    /// match.
    pub async fn find_one<T: Record>(&self, filters: &FilterMap) -> Result<Option<T>, QueryError> {
        let mut records = self.find::<T>(filters).await?;
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            n => {
                tracing::debug!(matches = n, "Single-result lookup matched several documents");
                Err(QueryError::non_unique(filters))
            }
        }
    }

    /// Find every matching record, unordered
    pub async fn find<T: Record>(&self, filters: &FilterMap) -> Result<Vec<T>, QueryError> {
        let rows = self.run(Statement::list(&self.bucket, filters), filters).await?;
        self.convert_rows(rows)
    }

    /// Find one page of records together with the total match count
    pub async fn find_page<T: Record>(
        &self,
        filters: &FilterMap,
        page: &PageRequest,
    ) -> Result<Page<T>, QueryError> {
        let statement = Statement::paged(&self.bucket, filters, page);
        let (rows, total) = tokio::try_join!(self.run(statement, filters), self.count(filters))?;
        Ok(Page::new(self.convert_rows(rows)?, page, total))
    }

    /// Number of distinct matching documents
    pub async fn count(&self, filters: &FilterMap) -> Result<u64, QueryError> {
        let rows = self.run(Statement::count(&self.bucket, filters), filters).await?;
        for row in &rows {
            if row.get(COUNT_FIELD).is_none() {
                return Err(ConversionError::malformed("count row has no count field").into());
            }
        }
        Ok(rows.len() as u64)
    }

    /// Sum of a numeric field over the matching documents
    ///
    /// Documents where the field is absent or null contribute nothing.
    pub async fn sum(&self, filters: &FilterMap, field: &str) -> Result<i64, QueryError> {
        let rows = self
            .run(Statement::sum(&self.bucket, filters, field), filters)
            .await?;
        rows.iter().try_fold(0i64, |total, row| -> Result<i64, QueryError> {
            let value = row.get(SUM_FIELD).unwrap_or(&Value::Null);
            let part = integer_value(value)
                .ok_or_else(|| QueryError::unexpected_aggregate(SUM_FIELD, value.clone()))?;
            total
                .checked_add(part)
                .ok_or_else(|| QueryError::unexpected_aggregate(SUM_FIELD, value.clone()))
        })
    }

    async fn run(&self, statement: Statement, filters: &FilterMap) -> Result<Vec<Value>, QueryError> {
        tracing::debug!(
            kind = statement.kind(),
            bucket = %self.bucket,
            transport = self.transport.name(),
            filters = filters.len(),
            "Executing statement"
        );
        tracing::trace!(statement = %statement, params = ?filters.keys().collect::<Vec<_>>(), "Statement text");

        let query = Query::new(statement, filters);
        let rows = self.transport.execute(&query).await?;

        tracing::debug!(kind = query.statement.kind(), rows = rows.len(), "Statement completed");
        Ok(rows)
    }

    fn convert_rows<T: Record>(&self, rows: Vec<Value>) -> Result<Vec<T>, QueryError> {
        rows.into_iter()
            .map(|row| -> Result<T, QueryError> {
                let row = into_raw_row(row)?;
                Ok(convert_row::<T>(self.converter.as_ref(), row)?)
            })
            .collect()
    }
}

fn into_raw_row(row: Value) -> Result<RawRow, ConversionError> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(ConversionError::malformed(format!(
            "row must be an object, got {}",
            other
        ))),
    }
}

/// Aggregate value as an integer; null counts as zero
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Null => Some(0),
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}
