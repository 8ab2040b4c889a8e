use crate::ast::Value;
use crate::error::EvalError;

#[derive(Debug, Clone, Copy)]
enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }

    fn describe(self) -> String {
        match self {
            Arity::Exact(n) => n.to_string(),
            Arity::AtLeast(n) => format!("at least {}", n),
        }
    }
}

type Builtin = fn(&[f64]) -> f64;

/// Master macro to define the fixed function library and its lookup.
macro_rules! define_functions {
    ( $( ($name:literal, $arity:expr, $body:expr) ),* $(,)? ) => {
        fn lookup(name: &str) -> Option<(Arity, Builtin)> {
            match name {
                $( $name => Some(($arity, $body as Builtin)), )*
                _ => None,
            }
        }

        /// Names of every function the evaluator understands.
        pub const FUNCTION_NAMES: &[&str] = &[ $( $name ),* ];
    };
}

define_functions! {
    ("lcm", Arity::Exact(2), |a: &[f64]| lcm(a[0], a[1])),
    ("gcd", Arity::Exact(2), |a: &[f64]| gcd(a[0], a[1])),
    ("min", Arity::AtLeast(2), |a: &[f64]| a.iter().copied().fold(f64::INFINITY, js_min)),
    ("max", Arity::AtLeast(2), |a: &[f64]| a.iter().copied().fold(f64::NEG_INFINITY, js_max)),
    ("abs", Arity::Exact(1), |a: &[f64]| a[0].abs()),
    ("floor", Arity::Exact(1), |a: &[f64]| a[0].floor()),
    ("ceil", Arity::Exact(1), |a: &[f64]| a[0].ceil()),
    ("mod", Arity::Exact(2), |a: &[f64]| a[0] % a[1]),
}

/// Calls a library function. Arguments are cast to numbers first.
pub fn call_function(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let (arity, body) = lookup(name).ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
    if !arity.accepts(args.len()) {
        return Err(EvalError::Arity {
            function: name.to_string(),
            expected: arity.describe(),
            found: args.len(),
        });
    }
    let numbers: Vec<f64> = args.iter().map(Value::to_number).collect();
    Ok(Value::Number(body(&numbers)))
}

/// Euclidean loop; `gcd(0, 0)` is 0.
fn gcd(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    let mut a = a.trunc().abs();
    let mut b = b.trunc().abs();
    while b != 0.0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn lcm(a: f64, b: f64) -> f64 {
    let divisor = gcd(a, b);
    if divisor == 0.0 {
        return 0.0;
    }
    (a.trunc() * b.trunc()).abs() / divisor
}

// NaN-propagating like the host semantics of min/max.
fn js_min(acc: f64, x: f64) -> f64 {
    if acc.is_nan() || x.is_nan() { f64::NAN } else { acc.min(x) }
}

fn js_max(acc: f64, x: f64) -> f64 {
    if acc.is_nan() || x.is_nan() { f64::NAN } else { acc.max(x) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[f64]) -> Result<Value, EvalError> {
        let args: Vec<Value> = args.iter().map(|n| Value::Number(*n)).collect();
        call_function(name, &args)
    }

    #[test]
    fn gcd_and_lcm() {
        assert_eq!(call("gcd", &[12.0, 8.0]), Ok(Value::Number(4.0)));
        assert_eq!(call("gcd", &[0.0, 0.0]), Ok(Value::Number(0.0)));
        assert_eq!(call("lcm", &[4.0, 6.0]), Ok(Value::Number(12.0)));
        assert_eq!(call("lcm", &[0.0, 0.0]), Ok(Value::Number(0.0)));
    }

    #[test]
    fn variadic_min_max_require_two_arguments() {
        assert_eq!(call("min", &[3.0, 1.0, 2.0]), Ok(Value::Number(1.0)));
        assert_eq!(call("max", &[3.0, 1.0]), Ok(Value::Number(3.0)));
        assert!(matches!(call("max", &[3.0]), Err(EvalError::Arity { .. })));
    }

    #[test]
    fn mod_matches_remainder_operator() {
        assert_eq!(call("mod", &[-7.0, 3.0]), Ok(Value::Number(-1.0)));
    }

    #[test]
    fn unknown_function_is_name_error() {
        assert_eq!(
            call("sqrt", &[4.0]),
            Err(EvalError::UnknownFunction("sqrt".to_string()))
        );
        assert!(FUNCTION_NAMES.contains(&"lcm"));
    }
}
