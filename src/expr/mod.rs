//! The flowchart expression language.
//!
//! Expressions are tokenized and then evaluated directly by a recursive-descent
//! parser; no syntax tree is kept. Precedence from loosest to tightest:
//! `?:`, `||`, `&&`, `== !=`, `< > <= >=`, `+ -`, `* / %`, unary `! -`, primary.

use crate::ast::{EvalContext, Value};
use crate::error::EvalError;

pub mod functions;
pub mod lexer;
mod parser;

pub use functions::{FUNCTION_NAMES, call_function};
pub use lexer::{Spanned, Token, tokenize};

use parser::Parser;

/// Evaluates an expression against the given scopes.
///
/// # Errors
///
/// * `EvalError::Syntax` for malformed input, annotated with the byte offset.
/// * `EvalError::UnknownIdentifier` / `UnknownStateVariable` / `UnknownFunction`
///   when a name cannot be resolved.
/// * `EvalError::Arity` when a library function receives the wrong number of arguments.
/// * `EvalError::FieldAccess` when `.field` is applied to a value without that field.
pub fn evaluate(expr: &str, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    let tokens = tokenize(expr)?;
    Parser::new(&tokens, expr.len(), ctx).parse_expression()
}

/// Evaluates an expression and reduces the result to its truthiness.
pub fn evaluate_bool(expr: &str, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
    evaluate(expr, ctx).map(|v| v.is_truthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Scope;
    use crate::error::EvalErrorClass;

    fn eval(expr: &str) -> Value {
        evaluate(expr, &EvalContext::empty()).unwrap()
    }

    #[test]
    fn ternary_is_right_associative() {
        assert_eq!(eval("false ? 1 : true ? 2 : 3"), Value::Number(2.0));
    }

    #[test]
    fn short_circuit_skips_name_resolution() {
        assert_eq!(eval("false && missing"), Value::Bool(false));
        assert_eq!(eval("true || missing(1)"), Value::Bool(true));
        assert_eq!(eval("true ? 1 : missing.field"), Value::Number(1.0));
    }

    #[test]
    fn short_circuit_still_reports_syntax() {
        let err = evaluate("false && (1 +", &EvalContext::empty()).unwrap_err();
        assert_eq!(err.class(), EvalErrorClass::Syntax);
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        match evaluate("1 2", &EvalContext::empty()) {
            Err(EvalError::Syntax { position, .. }) => assert_eq!(position, 2),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn input_binding_resolves_before_scopes() {
        let mut problem = Scope::new();
        problem.insert("input".to_string(), Value::Number(1.0));
        let answer = Value::Number(7.0);
        let ctx = EvalContext::with_problem(&problem).input(&answer);
        assert_eq!(evaluate("input == 7", &ctx), Ok(Value::Bool(true)));
    }
}
