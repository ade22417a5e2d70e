use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::data::error::TransportError;
use crate::data::filters::FilterMap;
use crate::data::n1ql::{
    COUNT_FIELD, CompareOp, DATA_FIELD, Direction, Expression, ID_FIELD, IsCheck, Projection,
    Query, SUM_FIELD, Statement,
};
use crate::utils::json::{collate, lookup_path};
use crate::utils::sql::like_matches;

use super::QueryTransport;

/// In-process bucket that evaluates statements with N1QL semantics
///
/// Documents are keyed by id and scanned in id order. The bucket is fixed at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    bucket: String,
    documents: BTreeMap<String, Value>,
}

/// Result of evaluating an expression; MISSING is distinct from NULL
#[derive(Debug, Clone, PartialEq)]
enum Eval {
    Missing,
    Value(Value),
}

impl Eval {
    fn is_true(&self) -> bool {
        matches!(self, Self::Value(Value::Bool(true)))
    }

    fn bool(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }

    fn null() -> Self {
        Self::Value(Value::Null)
    }
}

/// MISSING sorts before every value
fn collate_eval(a: &Eval, b: &Eval) -> Ordering {
    match (a, b) {
        (Eval::Missing, Eval::Missing) => Ordering::Equal,
        (Eval::Missing, _) => Ordering::Less,
        (_, Eval::Missing) => Ordering::Greater,
        (Eval::Value(x), Eval::Value(y)) => collate(x, y),
    }
}

struct Scope<'a> {
    id: &'a str,
    doc: &'a Value,
    params: &'a FilterMap,
}

impl Scope<'_> {
    fn eval(&self, expr: &Expression) -> Eval {
        match expr {
            Expression::Path(path) => lookup_path(self.doc, path)
                .cloned()
                .map_or(Eval::Missing, Eval::Value),
            Expression::Param(name) => self
                .params
                .get(name)
                .cloned()
                .map_or(Eval::Missing, Eval::Value),
            Expression::Str(s) => Eval::Value(Value::String(s.clone())),
            Expression::MetaId(_) => Eval::Value(Value::String(self.id.to_string())),
            Expression::Lower(inner) => match self.eval(inner) {
                Eval::Missing => Eval::Missing,
                Eval::Value(Value::String(s)) => Eval::Value(Value::String(s.to_lowercase())),
                Eval::Value(_) => Eval::null(),
            },
            Expression::Contains(haystack, needle) => {
                match (self.eval(haystack), self.eval(needle)) {
                    (Eval::Missing, _) | (_, Eval::Missing) => Eval::Missing,
                    (Eval::Value(Value::String(h)), Eval::Value(Value::String(n))) => {
                        Eval::bool(h.contains(n.as_str()))
                    }
                    _ => Eval::null(),
                }
            }
            Expression::Compare { left, op, right } => {
                compare(*op, self.eval(left), self.eval(right))
            }
            Expression::Is { operand, check } => match (self.eval(operand), check) {
                (Eval::Missing, IsCheck::Missing) => Eval::bool(true),
                (_, IsCheck::Missing) => Eval::bool(false),
                (Eval::Missing, _) => Eval::Missing,
                (Eval::Value(v), IsCheck::Null) => Eval::bool(v.is_null()),
                (Eval::Value(v), IsCheck::NotNull) => Eval::bool(!v.is_null()),
            },
            Expression::And(left, right) => {
                Eval::bool(self.eval(left).is_true() && self.eval(right).is_true())
            }
            Expression::Or(left, right) => {
                Eval::bool(self.eval(left).is_true() || self.eval(right).is_true())
            }
        }
    }
}

fn compare(op: CompareOp, left: Eval, right: Eval) -> Eval {
    let (left, right) = match (left, right) {
        (Eval::Missing, _) | (_, Eval::Missing) => return Eval::Missing,
        (Eval::Value(Value::Null), _) | (_, Eval::Value(Value::Null)) => return Eval::null(),
        (Eval::Value(l), Eval::Value(r)) => (l, r),
    };

    match op {
        CompareOp::Eq => Eval::bool(collate(&left, &right).is_eq()),
        CompareOp::Ne => Eval::bool(collate(&left, &right).is_ne()),
        CompareOp::Gte => Eval::bool(collate(&left, &right).is_ge()),
        CompareOp::Lte => Eval::bool(collate(&left, &right).is_le()),
        CompareOp::In => match right {
            Value::Array(items) => Eval::bool(items.iter().any(|v| collate(&left, v).is_eq())),
            _ => Eval::null(),
        },
        CompareOp::NotLike => match (left, right) {
            (Value::String(text), Value::String(pattern)) => like_matches(&text, &pattern)
                .map_or_else(|_| Eval::null(), |matched| Eval::bool(!matched)),
            _ => Eval::null(),
        },
    }
}

impl MemoryTransport {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            documents: BTreeMap::new(),
        }
    }

    pub fn with_document(mut self, id: impl Into<String>, document: Value) -> Self {
        self.documents.insert(id.into(), document);
        self
    }

    /// Build a bucket from an `{ "<id>": <document>, ... }` object
    pub fn from_documents(bucket: impl Into<String>, documents: Map<String, Value>) -> Self {
        Self {
            bucket: bucket.into(),
            documents: documents.into_iter().collect(),
        }
    }

    /// Load a bucket from a JSON file holding an id-to-document object
    pub fn load(bucket: impl Into<String>, path: &Path) -> Result<Self, TransportError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TransportError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let documents: Map<String, Value> = serde_json::from_str(&content).map_err(|e| {
            TransportError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), documents = documents.len(), "Loaded in-memory bucket");
        Ok(Self::from_documents(bucket, documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn run(&self, statement: &Statement, params: &FilterMap) -> Result<Vec<Value>, TransportError> {
        if statement.bucket != self.bucket {
            return Err(TransportError::query(
                "fatal",
                format!("Keyspace not found: {}", statement.bucket),
            ));
        }

        let mut matches: Vec<(&str, &Value)> = self
            .documents
            .iter()
            .filter(|(id, doc)| {
                let scope = Scope {
                    id: id.as_str(),
                    doc,
                    params,
                };
                scope.eval(&statement.predicate).is_true()
            })
            .map(|(id, doc)| (id.as_str(), doc))
            .collect();

        if !statement.order_by.is_empty() {
            let keys = |id: &str, doc: &Value| -> Vec<Eval> {
                let scope = Scope { id, doc, params };
                statement
                    .order_by
                    .iter()
                    .map(|clause| scope.eval(&clause.expression))
                    .collect()
            };
            matches.sort_by(|(a_id, a_doc), (b_id, b_doc)| {
                let (a_keys, b_keys) = (keys(*a_id, *a_doc), keys(*b_id, *b_doc));
                statement
                    .order_by
                    .iter()
                    .zip(a_keys.iter().zip(b_keys.iter()))
                    .map(|(clause, (a, b))| match clause.direction {
                        Direction::Asc => collate_eval(a, b),
                        Direction::Desc => collate_eval(b, a),
                    })
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let offset = usize::try_from(statement.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = statement.limit.map_or(usize::MAX, |l| l as usize);
        let window = matches.into_iter().skip(offset).take(limit);

        let rows = match &statement.projection {
            Projection::Documents => window
                .map(|(id, doc)| json!({ DATA_FIELD: doc, ID_FIELD: id }))
                .collect(),
            Projection::Count => window
                .map(|(id, _)| json!({ COUNT_FIELD: 1, ID_FIELD: id }))
                .collect(),
            Projection::Sum(field) => window
                .map(|(id, doc)| json!({ SUM_FIELD: numeric_field(doc, field), ID_FIELD: id }))
                .collect(),
        };

        Ok(rows)
    }
}

/// SUM over one document: the field when numeric, otherwise null
fn numeric_field(doc: &Value, field: &str) -> Value {
    match lookup_path(doc, field) {
        Some(v @ Value::Number(_)) => v.clone(),
        _ => Value::Null,
    }
}

#[async_trait]
impl QueryTransport for MemoryTransport {
    async fn execute(&self, query: &Query) -> Result<Vec<Value>, TransportError> {
        let rows = self.run(&query.statement, &query.params)?;
        tracing::trace!(bucket = %self.bucket, rows = rows.len(), "In-memory statement evaluated");
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
