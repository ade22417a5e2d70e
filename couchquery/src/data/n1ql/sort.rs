//! Sorting and paging
//!
//! Sort entries compile to ORDER BY clauses in input order. A property
//! carrying the `_ignorecase` suffix orders on its lower-cased value.

use std::fmt;
use std::str::FromStr;

use super::expression::Expression;

/// Sort property suffix requesting case-insensitive ordering
pub const IGNORE_CASE_ORDER: &str = "_ignorecase";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One sort entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
    pub ignore_case: bool,
}

impl Order {
    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Desc)
    }

    /// Build an order, decoding a trailing `_ignorecase` on the property
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        let property = property.into();
        match property.strip_suffix(IGNORE_CASE_ORDER) {
            Some(stripped) => Self {
                property: stripped.to_string(),
                direction,
                ignore_case: true,
            },
            None => Self {
                property,
                direction,
                ignore_case: false,
            },
        }
    }

    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// The expression this entry orders on
    pub fn expression(&self) -> Expression {
        let path = Expression::path(self.property.as_str());
        if self.ignore_case { path.lower() } else { path }
    }
}

/// Error parsing an order string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid sort '{0}'. Use 'property', 'property:asc' or 'property:desc'")]
pub struct InvalidOrder(pub String);

/// Parses `property`, `property:asc` or `property:desc`
impl FromStr for Order {
    type Err = InvalidOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [property] => Ok(Self::asc(*property)),
            [property, "asc"] => Ok(Self::asc(*property)),
            [property, "desc"] => Ok(Self::desc(*property)),
            _ => Err(InvalidOrder(s.to_string())),
        }
    }
}

/// Rendered ORDER BY term
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub expression: Expression,
    pub direction: Direction,
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expression, self.direction.as_str())
    }
}

/// Compile sort entries into ORDER BY clauses, preserving input order
pub fn compile_sort(orders: &[Order]) -> Vec<OrderClause> {
    orders
        .iter()
        .map(|order| OrderClause {
            expression: order.expression(),
            direction: order.direction,
        })
        .collect()
}

/// Page bounds plus sort for a paged list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub size: u32,
    pub offset: u64,
    pub sort: Vec<Order>,
}

impl PageRequest {
    /// Page by 0-based index; the offset is `size * page`
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            size,
            offset: u64::from(size) * u64::from(page),
            sort: Vec::new(),
        }
    }

    /// Page starting at an explicit row offset
    pub fn at_offset(offset: u64, size: u32) -> Self {
        Self {
            size,
            offset,
            sort: Vec::new(),
        }
    }

    pub fn with_sort(mut self, sort: Vec<Order>) -> Self {
        self.sort = sort;
        self
    }

    /// 0-based page index containing the offset
    pub fn page_number(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.offset / u64::from(self.size)
        }
    }
}
