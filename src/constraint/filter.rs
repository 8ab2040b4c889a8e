use super::{CompareOp, ConstraintKind, ParsedConstraint};
use crate::ast::Value;
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

#[derive(Debug, Clone, PartialEq)]
pub enum FilterTest {
    Compare { op: CompareOp, literal: Value },
    Divisible { divisor: f64, divisible: bool },
}

/// A predicate over the value of a single input field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub test: FilterTest,
}

impl FieldFilter {
    pub fn accepts(&self, value: &Value) -> bool {
        match &self.test {
            FilterTest::Compare { op, literal } => op.holds(value, literal),
            FilterTest::Divisible { divisor, divisible } => {
                let remainder = value.to_number() % divisor;
                !remainder.is_nan() && (remainder == 0.0) == *divisible
            }
        }
    }
}

/// Turns an atomic-field constraint with a literal right side into a filter.
///
/// Anything with an operator, call or field access on the left is rejected.
pub fn constraint_to_field_filter(constraint: &ParsedConstraint) -> Option<FieldFilter> {
    if constraint.kind == ConstraintKind::Boolean || !constraint.right_is_literal {
        return None;
    }
    if !IDENTIFIER.is_match(&constraint.left) {
        return None;
    }
    let test = match constraint.kind {
        ConstraintKind::Divisibility => {
            let divisor = constraint.divisor.as_deref()?.parse::<f64>().ok()?;
            if divisor == 0.0 {
                return None;
            }
            FilterTest::Divisible {
                divisor,
                divisible: constraint.op == CompareOp::Eq,
            }
        }
        _ => FilterTest::Compare {
            op: constraint.op,
            literal: constraint.literal_value.clone()?,
        },
    };
    Some(FieldFilter {
        field: constraint.left.clone(),
        test,
    })
}
