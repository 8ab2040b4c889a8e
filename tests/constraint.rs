//! Constraint parser tests: normal forms, conjunctions, negation and field filters.
use tejun::constraint::{CompareOp, ConstraintKind, FilterTest};
use tejun::prelude::*;

#[test]
fn test_single_comparison() {
    let result = parse_constraint("top >= 40");
    assert!(result.fully_parsed);
    assert_eq!(result.constraints.len(), 1);

    let c = &result.constraints[0];
    assert_eq!(c.kind, ConstraintKind::Comparison);
    assert_eq!(c.left, "top");
    assert_eq!(c.op, CompareOp::GtEq);
    assert_eq!(c.right, "40");
    assert!(c.right_is_literal);
    assert_eq!(c.literal_value, Some(Value::Number(40.0)));
}

#[test]
fn test_two_character_operators_are_not_split() {
    for (expr, op) in [
        ("a >= 1", CompareOp::GtEq),
        ("a <= 1", CompareOp::LtEq),
        ("a != 1", CompareOp::NotEq),
        ("a == 1", CompareOp::Eq),
        ("a > 1", CompareOp::Gt),
        ("a < 1", CompareOp::Lt),
    ] {
        let c = &parse_constraint(expr).constraints[0];
        assert_eq!(c.op, op, "for {}", expr);
        assert_eq!(c.right, "1", "for {}", expr);
    }
}

#[test]
fn test_divisibility_shape() {
    let result = parse_constraint("total % 3 == 0");
    let c = &result.constraints[0];
    assert_eq!(c.kind, ConstraintKind::Divisibility);
    assert_eq!(c.left, "total");
    assert_eq!(c.divisor.as_deref(), Some("3"));
    assert_eq!(c.op, CompareOp::Eq);

    let not_divisible = &parse_constraint("total % 3 != 0").constraints[0];
    assert_eq!(not_divisible.op, CompareOp::NotEq);
}

#[test]
fn test_boolean_literals() {
    let c = &parse_constraint("true").constraints[0];
    assert_eq!(c.kind, ConstraintKind::Boolean);
    assert_eq!(c.literal_value, Some(Value::Bool(true)));

    let negated = negate_constraint(c);
    assert_eq!(negated.literal_value, Some(Value::Bool(false)));
}

#[test]
fn test_string_literal_right_side() {
    let c = &parse_constraint("kind == 'proper'").constraints[0];
    assert!(c.right_is_literal);
    assert_eq!(c.literal_value, Some(Value::Str("proper".into())));
}

#[test]
fn test_conjunctions_respect_parentheses() {
    let result = parse_constraint("(a > 1) && (b < 5 && c == 2)");
    assert!(result.fully_parsed);
    let lefts: Vec<&str> = result.constraints.iter().map(|c| c.left.as_str()).collect();
    assert_eq!(lefts, ["a", "b", "c"]);
}

#[test]
fn test_partial_conjunction_is_not_fully_parsed() {
    let result = parse_constraint("a > 1 && isProper");
    assert!(!result.fully_parsed);
    assert_eq!(result.constraints.len(), 1);
}

#[test]
fn test_disjunctions_are_recorded_but_not_fully_parsed() {
    let result = parse_constraint("a > 1 || b > 1");
    assert!(!result.fully_parsed);
    assert_eq!(result.constraints.len(), 2);
}

#[test]
fn test_unparsable_expressions_yield_empty_results() {
    for expr in ["lcm(a, b)", "needsBorrow", "x ? 1 : 2", ""] {
        let result = parse_constraint(expr);
        assert!(!result.fully_parsed, "for {:?}", expr);
        assert!(result.constraints.is_empty(), "for {:?}", expr);
    }
}

#[test]
fn test_negation_table() {
    let pairs = [
        ("a == 1", CompareOp::NotEq),
        ("a != 1", CompareOp::Eq),
        ("a > 1", CompareOp::LtEq),
        ("a <= 1", CompareOp::Gt),
        ("a < 1", CompareOp::GtEq),
        ("a >= 1", CompareOp::Lt),
    ];
    for (expr, negated) in pairs {
        let c = &parse_constraint(expr).constraints[0];
        assert_eq!(negate_constraint(c).op, negated, "for {}", expr);
        assert_eq!(negate_constraint(&negate_constraint(c)), *c);
    }
}

#[test]
fn test_only_atomic_fields_become_filters() {
    let filter = constraint_to_field_filter(&parse_constraint("bottom < 50").constraints[0])
        .expect("atomic comparison converts");
    assert_eq!(filter.field, "bottom");
    assert!(filter.accepts(&Value::Number(14.0)));
    assert!(!filter.accepts(&Value::Number(50.0)));

    for expr in ["a + b == 5", "left.denom > 2", "a > b", "lcm(a, 2) == 4"] {
        let parsed = parse_constraint(expr);
        let converted = parsed.constraints.first().and_then(constraint_to_field_filter);
        assert!(converted.is_none(), "for {}", expr);
    }
}

#[test]
fn test_divisibility_filter() {
    let filter = constraint_to_field_filter(&parse_constraint("n % 4 == 0").constraints[0])
        .expect("divisibility converts");
    assert_eq!(
        filter.test,
        FilterTest::Divisible {
            divisor: 4.0,
            divisible: true
        }
    );
    assert!(filter.accepts(&Value::Number(12.0)));
    assert!(!filter.accepts(&Value::Number(13.0)));

    let negated = negate_constraint(&parse_constraint("n % 4 == 0").constraints[0]);
    let filter = constraint_to_field_filter(&negated).expect("negated divisibility converts");
    assert!(filter.accepts(&Value::Number(13.0)));
}
