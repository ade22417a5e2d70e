//! N1QL statement model
//!
//! Expression trees, sort compilation and the four statement shapes
//! (list, paged list, count, sum), rendered to N1QL text via `Display`.

mod expression;
mod sort;
mod statement;

pub use expression::{CompareOp, Expression, IsCheck, QuotedIdent};
pub use sort::{
    Direction, IGNORE_CASE_ORDER, InvalidOrder, Order, OrderClause, PageRequest, compile_sort,
};
pub use statement::{
    COUNT_FIELD, DATA_FIELD, ID_FIELD, Projection, Query, SUM_FIELD, Statement,
};
