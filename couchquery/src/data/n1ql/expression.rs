//! N1QL expression tree
//!
//! Expressions are built as values and rendered with `Display`. Bound values
//! never appear in rendered text, only `$name` placeholders; identifiers and
//! placeholder names are escaped so a filter key cannot alter the statement.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gte,
    Lte,
    In,
    NotLike,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::In => "IN",
            Self::NotLike => "NOT LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsCheck {
    Null,
    NotNull,
    Missing,
}

impl IsCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "IS NULL",
            Self::NotNull => "IS NOT NULL",
            Self::Missing => "IS MISSING",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Dot-separated document property path
    Path(String),
    /// Named placeholder, rendered as `$name`
    Param(String),
    /// String literal
    Str(String),
    /// `META(bucket).id`
    MetaId(String),
    Lower(Box<Expression>),
    Contains(Box<Expression>, Box<Expression>),
    Compare {
        left: Box<Expression>,
        op: CompareOp,
        right: Box<Expression>,
    },
    Is {
        operand: Box<Expression>,
        check: IsCheck,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn meta_id(bucket: impl Into<String>) -> Self {
        Self::MetaId(bucket.into())
    }

    pub fn lower(self) -> Self {
        Self::Lower(Box::new(self))
    }

    pub fn contains(self, needle: Expression) -> Self {
        Self::Contains(Box::new(self), Box::new(needle))
    }

    pub fn compare(self, op: CompareOp, right: Expression) -> Self {
        Self::Compare {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn is(self, check: IsCheck) -> Self {
        Self::Is {
            operand: Box::new(self),
            check,
        }
    }

    pub fn and(self, other: Expression) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expression) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Flatten a tree of `AND` nodes into its conjuncts, left to right
    pub fn conjuncts(&self) -> Vec<&Expression> {
        match self {
            Self::And(left, right) => {
                let mut out = left.conjuncts();
                out.extend(right.conjuncts());
                out
            }
            other => vec![other],
        }
    }

    /// Placeholder names referenced anywhere in this expression
    pub fn params(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Param(name) => out.push(name),
            Self::Path(_) | Self::Str(_) | Self::MetaId(_) => {}
            Self::Lower(inner) | Self::Is { operand: inner, .. } => inner.collect_params(out),
            Self::Contains(left, right)
            | Self::And(left, right)
            | Self::Or(left, right)
            | Self::Compare { left, right, .. } => {
                left.collect_params(out);
                right.collect_params(out);
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write_path(f, path),
            Self::Param(name) => {
                f.write_str("$")?;
                write_segment(f, name)
            }
            Self::Str(value) => {
                let literal = serde_json::Value::String(value.clone());
                write!(f, "{}", literal)
            }
            Self::MetaId(bucket) => write!(f, "META({}).id", QuotedIdent(bucket)),
            Self::Lower(inner) => write!(f, "LOWER({})", inner),
            Self::Contains(haystack, needle) => write!(f, "CONTAINS({}, {})", haystack, needle),
            Self::Compare { left, op, right } => write!(f, "{} {} {}", left, op.as_str(), right),
            Self::Is { operand, check } => write!(f, "{} {}", operand, check.as_str()),
            Self::And(left, right) => write!(f, "{} AND {}", left, right),
            Self::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}

/// Identifier rendered in back-quotes, with embedded back-quotes doubled
pub struct QuotedIdent<'a>(pub &'a str);

impl fmt::Display for QuotedIdent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.0.replace('`', "``"))
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_segment(f: &mut fmt::Formatter<'_>, segment: &str) -> fmt::Result {
    if is_plain_identifier(segment) {
        f.write_str(segment)
    } else {
        write!(f, "{}", QuotedIdent(segment))
    }
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &str) -> fmt::Result {
    for (i, segment) in path.split('.').enumerate() {
        if i > 0 {
            f.write_str(".")?;
        }
        write_segment(f, segment)?;
    }
    Ok(())
}
