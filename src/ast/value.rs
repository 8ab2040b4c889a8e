use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime value flowing through problem inputs, computed variables and evaluation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Mixed { whole: f64, num: f64, denom: f64 },
}

// Manual implementation to handle f64
impl Eq for Value {}

// Manual implementation to handle f64 by hashing its bits
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Number(n) => n.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Mixed { whole, num, denom } => {
                whole.to_bits().hash(state);
                num.to_bits().hash(state);
                denom.to_bits().hash(state);
            }
            Value::Null => {}
        }
    }
}

impl Value {
    pub fn mixed(whole: f64, num: f64, denom: f64) -> Self {
        Value::Mixed { whole, num, denom }
    }

    /// Numeric cast used by arithmetic and relational operators.
    ///
    /// Non-numeric strings and records become `NaN` rather than failing.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Null => 0.0,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::Mixed { .. } => f64::NAN,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Mixed { .. } => true,
        }
    }

    /// Magnitude used when ranking examples by how readable their numbers are.
    ///
    /// Mixed numbers count as their decimal value; strings, booleans and nulls count as zero.
    pub fn magnitude(&self) -> f64 {
        let n = match self {
            Value::Number(n) => *n,
            Value::Mixed { whole, num, denom } if *denom != 0.0 => whole + num / denom,
            Value::Mixed { whole, .. } => *whole,
            _ => 0.0,
        };
        if n.is_finite() { n } else { 0.0 }
    }

    /// Reads a named field from a record-shaped value.
    pub fn field(&self, name: &str) -> Option<Value> {
        match (self, name) {
            (Value::Mixed { whole, .. }, "whole") => Some(Value::Number(*whole)),
            (Value::Mixed { num, .. }, "num") => Some(Value::Number(*num)),
            (Value::Mixed { denom, .. }, "denom") => Some(Value::Number(*denom)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Mixed { .. } => "mixed number",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Mixed { whole, num, denom } => write!(
                f,
                "{} {}/{}",
                format_number(*whole),
                format_number(*num),
                format_number(*denom)
            ),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
