//! Structured constraints extracted from decision expressions.
//!
//! A decision's `correctAnswer` string is reduced, where possible, to a small
//! normal form (comparison, divisibility or boolean literal). Constraints whose
//! left side is a single field and right side a literal become field filters the
//! example generator can apply before drawing values.

use crate::ast::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

mod filter;
mod parsing;

pub use filter::{FieldFilter, FilterTest, constraint_to_field_filter};
pub use parsing::{negate_constraint, parse_constraint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    Comparison,
    Divisibility,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl CompareOp {
    /// Search order when splitting a comparison. Two-character operators must
    /// come before their one-character prefixes.
    pub const SEARCH_ORDER: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::NotEq,
        CompareOp::GtEq,
        CompareOp::LtEq,
        CompareOp::Gt,
        CompareOp::Lt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::GtEq => ">=",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }

    pub fn negate(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::NotEq,
            CompareOp::NotEq => CompareOp::Eq,
            CompareOp::Gt => CompareOp::LtEq,
            CompareOp::LtEq => CompareOp::Gt,
            CompareOp::Lt => CompareOp::GtEq,
            CompareOp::GtEq => CompareOp::Lt,
        }
    }

    pub fn holds(self, left: &Value, right: &Value) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::NotEq => left != right,
            CompareOp::GtEq => left.to_number() >= right.to_number(),
            CompareOp::LtEq => left.to_number() <= right.to_number(),
            CompareOp::Gt => left.to_number() > right.to_number(),
            CompareOp::Lt => left.to_number() < right.to_number(),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Normal form of a single comparison-shaped expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConstraint {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub left: String,
    pub op: CompareOp,
    pub right: String,
    pub right_is_literal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal_value: Option<Value>,
    /// Right operand of `%` for divisibility constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisor: Option<String>,
}

impl fmt::Display for ParsedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.divisor) {
            (ConstraintKind::Boolean, _) => write!(f, "{}", self.right),
            (ConstraintKind::Divisibility, Some(d)) => {
                write!(f, "{} % {} {} {}", self.left, d, self.op, self.right)
            }
            _ => write!(f, "{} {} {}", self.left, self.op, self.right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintParseResult {
    pub constraints: Vec<ParsedConstraint>,
    /// True only when every part of the expression was understood and the
    /// constraints are a conjunction.
    pub fully_parsed: bool,
}
