//! Evaluator tests: precedence, scopes, library functions and error classes.
mod common;
use common::*;
use tejun::error::EvalErrorClass;
use tejun::prelude::*;

fn eval(expr: &str) -> Value {
    evaluate(expr, &EvalContext::empty()).expect("expression evaluates")
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(eval("2 + 3 * 4"), Value::Number(14.0));
    assert_eq!(eval("(2+3)*4"), Value::Number(20.0));
    assert_eq!(eval("10 - 4 - 3"), Value::Number(3.0));
    assert_eq!(eval("17 % 5 * 2"), Value::Number(4.0));
    assert_eq!(eval("-3 + 5"), Value::Number(2.0));
}

#[test]
fn test_ternary_and_logic() {
    assert_eq!(eval("true ? 1 : 2"), Value::Number(1.0));
    assert_eq!(eval("1 > 2 ? 'a' : 'b'"), Value::Str("b".into()));
    assert_eq!(eval("1 < 2 && 2 < 3"), Value::Bool(true));
    assert_eq!(eval("!(1 == 1) || 0"), Value::Bool(false));
}

#[test]
fn test_library_functions() {
    assert_eq!(eval("lcm(4,6)"), Value::Number(12.0));
    assert_eq!(eval("gcd(12,8)"), Value::Number(4.0));
    assert_eq!(eval("min(7, 3, 5)"), Value::Number(3.0));
    assert_eq!(eval("max(7, 3, 5)"), Value::Number(7.0));
    assert_eq!(eval("abs(-2.5)"), Value::Number(2.5));
    assert_eq!(eval("floor(2.7) + ceil(2.2)"), Value::Number(5.0));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("'x = ' + 3"), Value::Str("x = 3".into()));
    assert_eq!(eval("1 + 2 + 'px'"), Value::Str("3px".into()));
}

#[test]
fn test_mixed_number_field_access() {
    let problem = scope([("left", Value::mixed(3.0, 1.0, 4.0))]);
    let ctx = EvalContext::with_problem(&problem);
    assert_eq!(evaluate("left.denom", &ctx).unwrap(), Value::Number(4.0));
    assert_eq!(
        evaluate("left.whole * left.denom + left.num", &ctx).unwrap(),
        Value::Number(13.0)
    );
}

#[test]
fn test_field_access_on_scalar_is_an_error() {
    let problem = scope([("n", 5.0)]);
    let err = evaluate("n.denom", &EvalContext::with_problem(&problem)).unwrap_err();
    assert_eq!(err.class(), EvalErrorClass::Field);
}

#[test]
fn test_scope_resolution_order() {
    let problem = scope([("a", 1.0)]);
    let computed = scope([("a", 2.0), ("b", 3.0)]);
    let state = scope([("b", 4.0), ("c", 5.0)]);
    let ctx = EvalContext::with_problem(&problem)
        .computed(&computed)
        .user_state(&state);

    assert_eq!(evaluate("a", &ctx).unwrap(), Value::Number(1.0));
    assert_eq!(evaluate("b", &ctx).unwrap(), Value::Number(3.0));
    assert_eq!(evaluate("c", &ctx).unwrap(), Value::Number(5.0));
    assert_eq!(evaluate("$b", &ctx).unwrap(), Value::Number(4.0));
    assert_eq!(evaluate("$a", &ctx).unwrap(), Value::Number(2.0));
}

#[test]
fn test_unknown_names_raise_name_errors() {
    let ctx = EvalContext::empty();
    let cases = [
        ("unknownVar", EvalError::UnknownIdentifier("unknownVar".into())),
        ("$missing", EvalError::UnknownStateVariable("missing".into())),
        ("frobnicate(1)", EvalError::UnknownFunction("frobnicate".into())),
    ];
    for (expr, expected) in cases {
        let err = evaluate(expr, &ctx).unwrap_err();
        assert_eq!(err, expected, "for {}", expr);
        assert_eq!(err.class(), EvalErrorClass::Name);
    }
}

#[test]
fn test_arity_and_syntax_errors() {
    let ctx = EvalContext::empty();
    assert_eq!(
        evaluate("lcm(4)", &ctx).unwrap_err().class(),
        EvalErrorClass::Arity
    );
    assert_eq!(
        evaluate("min(1)", &ctx).unwrap_err().class(),
        EvalErrorClass::Arity
    );
    for bad in ["", "2 +", "(1", "1 ? 2", "'open"] {
        assert_eq!(
            evaluate(bad, &ctx).unwrap_err().class(),
            EvalErrorClass::Syntax,
            "for {:?}",
            bad
        );
    }
}

#[test]
fn test_evaluation_is_pure() {
    let problem: Scope = scope([("x", 7.0)]);
    let ctx = EvalContext::with_problem(&problem);
    for expr in ["x * 3 - lcm(x, 4)", "x > 3 ? 'big' : 'small'", "1 / 0"] {
        let first = evaluate(expr, &ctx);
        for _ in 0..5 {
            assert_eq!(evaluate(expr, &ctx), first);
        }
    }
    assert_eq!(evaluate("undefinedName", &ctx), evaluate("undefinedName", &ctx));
}

#[test]
fn test_evaluate_bool_uses_truthiness() {
    let ctx = EvalContext::empty();
    assert!(evaluate_bool("'text'", &ctx).unwrap());
    assert!(!evaluate_bool("''", &ctx).unwrap());
    assert!(!evaluate_bool("0", &ctx).unwrap());
    assert!(!evaluate_bool("null", &ctx).unwrap());
}
