use super::{CompareOp, ConstraintKind, ConstraintParseResult, ParsedConstraint};
use crate::ast::Value;
use regex::Regex;
use std::sync::LazyLock;

static DIVISIBILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*%\s*(.+?)\s*(==|!=)\s*0$").expect("divisibility pattern is valid")
});

/// Parses a boolean decision expression into structured constraints.
///
/// Unparsable expressions yield an empty list with `fully_parsed == false`;
/// that is an expected outcome, not an error. Disjunctions are recorded but
/// never marked fully parsed since no single branch can be chosen for them.
pub fn parse_constraint(expr: &str) -> ConstraintParseResult {
    let expr = strip_outer_parens(expr.trim());

    if let Some(constraint) = parse_boolean_literal(expr) {
        return ConstraintParseResult {
            constraints: vec![constraint],
            fully_parsed: true,
        };
    }

    if let Some(constraint) = parse_single_comparison(expr) {
        return ConstraintParseResult {
            constraints: vec![constraint],
            fully_parsed: true,
        };
    }

    let conjuncts = split_top_level(expr, "&&");
    if conjuncts.len() > 1 {
        let mut result = ConstraintParseResult {
            constraints: Vec::new(),
            fully_parsed: true,
        };
        for part in conjuncts {
            let parsed = parse_constraint(part);
            result.fully_parsed &= parsed.fully_parsed;
            result.constraints.extend(parsed.constraints);
        }
        return result;
    }

    let disjuncts = split_top_level(expr, "||");
    if disjuncts.len() > 1 {
        let constraints = disjuncts
            .into_iter()
            .flat_map(|part| parse_constraint(part).constraints)
            .collect();
        return ConstraintParseResult {
            constraints,
            fully_parsed: false,
        };
    }

    ConstraintParseResult::default()
}

/// Flips the comparison so the constraint describes the decision being false.
pub fn negate_constraint(constraint: &ParsedConstraint) -> ParsedConstraint {
    let mut negated = constraint.clone();
    match constraint.kind {
        ConstraintKind::Boolean => {
            let flipped = !matches!(constraint.literal_value, Some(Value::Bool(true)));
            negated.right = flipped.to_string();
            negated.left = flipped.to_string();
            negated.literal_value = Some(Value::Bool(flipped));
        }
        ConstraintKind::Comparison | ConstraintKind::Divisibility => {
            negated.op = constraint.op.negate();
        }
    }
    negated
}

fn parse_boolean_literal(expr: &str) -> Option<ParsedConstraint> {
    let value = match expr {
        "true" => true,
        "false" => false,
        _ => return None,
    };
    Some(ParsedConstraint {
        kind: ConstraintKind::Boolean,
        left: expr.to_string(),
        op: CompareOp::Eq,
        right: expr.to_string(),
        right_is_literal: true,
        literal_value: Some(Value::Bool(value)),
        divisor: None,
    })
}

fn parse_single_comparison(expr: &str) -> Option<ParsedConstraint> {
    if split_top_level(expr, "&&").len() > 1 || split_top_level(expr, "||").len() > 1 {
        return None;
    }

    if let Some(caps) = DIVISIBILITY.captures(expr) {
        let left = caps[1].trim();
        let divisor = caps[2].trim();
        if !left.is_empty() && !divisor.is_empty() && find_top_level_comparison(left).is_none() {
            let op = if &caps[3] == "==" {
                CompareOp::Eq
            } else {
                CompareOp::NotEq
            };
            return Some(ParsedConstraint {
                kind: ConstraintKind::Divisibility,
                left: left.to_string(),
                op,
                right: "0".to_string(),
                right_is_literal: true,
                literal_value: Some(Value::Number(0.0)),
                divisor: Some(divisor.to_string()),
            });
        }
    }

    let (op, index) = find_top_level_comparison(expr)?;
    let left = expr[..index].trim();
    let right = expr[index + op.symbol().len()..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let literal_value = parse_literal(right);
    Some(ParsedConstraint {
        kind: ConstraintKind::Comparison,
        left: strip_outer_parens(left).to_string(),
        op,
        right: right.to_string(),
        right_is_literal: literal_value.is_some(),
        literal_value,
        divisor: None,
    })
}

/// Finds the first operator, in `CompareOp::SEARCH_ORDER`, occurring outside
/// parentheses and quotes.
fn find_top_level_comparison(expr: &str) -> Option<(CompareOp, usize)> {
    CompareOp::SEARCH_ORDER
        .iter()
        .find_map(|op| find_top_level(expr, op.symbol()).map(|index| (*op, index)))
}

fn parse_literal(text: &str) -> Option<Value> {
    match text {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }
    if let Ok(n) = text.parse::<f64>() {
        return Some(Value::Number(n));
    }
    let mut chars = text.chars();
    let first = chars.next()?;
    if (first == '\'' || first == '"') && text.len() >= 2 && text.ends_with(first) {
        let inner = &text[1..text.len() - 1];
        if !inner.contains(first) {
            return Some(Value::Str(inner.to_string()));
        }
    }
    None
}

/// Byte offsets of every character that sits at parenthesis depth zero and
/// outside string literals.
fn top_level_offsets(expr: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (i, c) in expr.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                continue;
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    continue;
                }
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            },
        }
        if depth == 0 && c != ')' {
            offsets.push(i);
        }
    }
    offsets
}

fn find_top_level(expr: &str, needle: &str) -> Option<usize> {
    top_level_offsets(expr)
        .into_iter()
        .find(|&i| expr[i..].starts_with(needle))
}

fn split_top_level<'a>(expr: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for i in top_level_offsets(expr) {
        if i >= start && expr[i..].starts_with(separator) {
            parts.push(expr[start..i].trim());
            start = i + separator.len();
        }
    }
    parts.push(expr[start..].trim());
    parts
}

fn strip_outer_parens(mut expr: &str) -> &str {
    while expr.starts_with('(') && expr.ends_with(')') && closes_at_end(expr) {
        expr = expr[1..expr.len() - 1].trim();
    }
    expr
}

/// Whether the opening parenthesis at index 0 is closed by the final character.
fn closes_at_end(expr: &str) -> bool {
    let mut depth = 0i32;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i == expr.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}
