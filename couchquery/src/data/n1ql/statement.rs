//! Statement shapes
//!
//! Every shape is built from the same composed predicate, so list, paged
//! list, count and sum agree on which documents match a filter map.

use std::fmt;

use crate::data::filters::{FilterMap, compose_where};

use super::expression::{Expression, QuotedIdent};
use super::sort::{OrderClause, PageRequest, compile_sort};

/// Row field holding the document body
pub const DATA_FIELD: &str = "data";
/// Row field holding the document id
pub const ID_FIELD: &str = "id";
/// Row field holding a count aggregate
pub const COUNT_FIELD: &str = "count";
/// Row field holding a sum aggregate
pub const SUM_FIELD: &str = "sum";

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `bucket AS data, META(bucket).id AS id`
    Documents,
    /// `COUNT(*) AS count, META(bucket).id AS id`
    Count,
    /// `SUM(field) AS sum, META(bucket).id AS id`
    Sum(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub bucket: String,
    pub projection: Projection,
    pub predicate: Expression,
    pub order_by: Vec<OrderClause>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

impl Statement {
    fn select(bucket: &str, projection: Projection, filters: &FilterMap) -> Self {
        Self {
            bucket: bucket.to_string(),
            projection,
            predicate: compose_where(bucket, filters),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Unordered, unbounded document select
    pub fn list(bucket: &str, filters: &FilterMap) -> Self {
        Self::select(bucket, Projection::Documents, filters)
    }

    /// Ordered document select bounded by the page
    pub fn paged(bucket: &str, filters: &FilterMap, page: &PageRequest) -> Self {
        Self {
            order_by: compile_sort(&page.sort),
            limit: Some(page.size),
            offset: Some(page.offset),
            ..Self::select(bucket, Projection::Documents, filters)
        }
    }

    /// Matching documents grouped by id, one count row per document
    pub fn count(bucket: &str, filters: &FilterMap) -> Self {
        Self::select(bucket, Projection::Count, filters)
    }

    /// Sum of `field` grouped by id, one sum row per document
    pub fn sum(bucket: &str, filters: &FilterMap, field: &str) -> Self {
        Self::select(bucket, Projection::Sum(field.to_string()), filters)
    }

    /// Aggregate shapes always group by document id
    pub fn group_by_id(&self) -> bool {
        !matches!(self.projection, Projection::Documents)
    }

    pub fn conjuncts(&self) -> Vec<&Expression> {
        self.predicate.conjuncts()
    }

    pub fn kind(&self) -> &'static str {
        match self.projection {
            Projection::Documents if self.limit.is_some() => "paged",
            Projection::Documents => "list",
            Projection::Count => "count",
            Projection::Sum(_) => "sum",
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bucket = QuotedIdent(&self.bucket);
        let meta_id = Expression::meta_id(self.bucket.as_str());

        f.write_str("SELECT ")?;
        match &self.projection {
            Projection::Documents => write!(f, "{} AS {}", bucket, DATA_FIELD)?,
            Projection::Count => write!(f, "COUNT(*) AS {}", COUNT_FIELD)?,
            Projection::Sum(field) => {
                write!(f, "SUM({}) AS {}", Expression::path(field.as_str()), SUM_FIELD)?
            }
        }
        write!(f, ", {} AS {}", meta_id, ID_FIELD)?;
        write!(f, " FROM {} WHERE {}", bucket, self.predicate)?;

        if self.group_by_id() {
            write!(f, " GROUP BY {}", meta_id)?;
        }
        if !self.order_by.is_empty() {
            let clauses: Vec<String> = self.order_by.iter().map(|c| c.to_string()).collect();
            write!(f, " ORDER BY {}", clauses.join(", "))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        Ok(())
    }
}

/// A statement together with the parameters its placeholders bind to
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub statement: Statement,
    pub params: FilterMap,
}

impl Query {
    pub fn new(statement: Statement, params: &FilterMap) -> Self {
        Self {
            statement,
            params: params.clone(),
        }
    }
}
