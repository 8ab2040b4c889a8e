use super::functions::call_function;
use super::lexer::{Spanned, Token};
use crate::ast::{EvalContext, Value};
use crate::error::EvalError;

// Generates a left-associative precedence level over a set of operator tokens.
macro_rules! binary_level {
    ($fn_name:ident, $next:ident, [$($tok:path),+]) => {
        fn $fn_name(&mut self, live: bool) -> Result<Value, EvalError> {
            let mut left = self.$next(live)?;
            while let Some(op) = self.peek().cloned() {
                if !matches!(op, $($tok)|+) {
                    break;
                }
                self.pos += 1;
                let right = self.$next(live)?;
                left = if live { apply_binary(&op, left, right) } else { Value::Null };
            }
            Ok(left)
        }
    };
}

/// Recursive-descent parser that evaluates while it parses.
///
/// `live` is false inside short-circuited operands: those are still parsed so
/// syntax errors surface, but never looked up or called.
pub(super) struct Parser<'t, 'c> {
    tokens: &'t [Spanned],
    pos: usize,
    source_len: usize,
    ctx: &'t EvalContext<'c>,
}

impl<'t, 'c> Parser<'t, 'c> {
    pub(super) fn new(tokens: &'t [Spanned], source_len: usize, ctx: &'t EvalContext<'c>) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
            ctx,
        }
    }

    pub(super) fn parse_expression(&mut self) -> Result<Value, EvalError> {
        if self.tokens.is_empty() {
            return Err(EvalError::syntax(0, "empty expression"));
        }
        let value = self.ternary(true)?;
        if let Some(extra) = self.tokens.get(self.pos) {
            return Err(EvalError::syntax(
                extra.position,
                format!("unexpected {}", extra.token.describe()),
            ));
        }
        Ok(value)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source_len, |s| s.position)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), EvalError> {
        if self.eat(&expected) {
            return Ok(());
        }
        let found = self
            .peek()
            .map_or_else(|| "end of expression".to_string(), Token::describe);
        Err(EvalError::syntax(
            self.position(),
            format!("expected {} but found {}", what, found),
        ))
    }

    /// `cond ? a : b`, right-associative.
    fn ternary(&mut self, live: bool) -> Result<Value, EvalError> {
        let condition = self.logical_or(live)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let taken = condition.is_truthy();
        let when_true = self.ternary(live && taken)?;
        self.expect(Token::Colon, "':'")?;
        let when_false = self.ternary(live && !taken)?;
        Ok(match (live, taken) {
            (false, _) => Value::Null,
            (true, true) => when_true,
            (true, false) => when_false,
        })
    }

    fn logical_or(&mut self, live: bool) -> Result<Value, EvalError> {
        let mut left = self.logical_and(live)?;
        while self.eat(&Token::OrOr) {
            let decided = left.is_truthy();
            let right = self.logical_and(live && !decided)?;
            left = Value::Bool(decided || right.is_truthy());
        }
        Ok(left)
    }

    fn logical_and(&mut self, live: bool) -> Result<Value, EvalError> {
        let mut left = self.equality(live)?;
        while self.eat(&Token::AndAnd) {
            let decided = !left.is_truthy();
            let right = self.equality(live && !decided)?;
            left = Value::Bool(!decided && right.is_truthy());
        }
        Ok(left)
    }

    binary_level!(equality, relational, [Token::EqEq, Token::NotEq]);
    binary_level!(relational, additive, [Token::Lt, Token::Gt, Token::LtEq, Token::GtEq]);
    binary_level!(additive, multiplicative, [Token::Plus, Token::Minus]);
    binary_level!(multiplicative, unary, [Token::Star, Token::Slash, Token::Percent]);

    fn unary(&mut self, live: bool) -> Result<Value, EvalError> {
        if self.eat(&Token::Bang) {
            let operand = self.unary(live)?;
            return Ok(Value::Bool(!operand.is_truthy()));
        }
        if self.eat(&Token::Minus) {
            let operand = self.unary(live)?;
            return Ok(Value::Number(-operand.to_number()));
        }
        self.postfix(live)
    }

    fn postfix(&mut self, live: bool) -> Result<Value, EvalError> {
        let mut value = self.primary(live)?;
        while self.eat(&Token::Dot) {
            let position = self.position();
            let field = match self.peek() {
                Some(Token::Ident(name)) => name.clone(),
                _ => return Err(EvalError::syntax(position, "expected a field name after '.'")),
            };
            self.pos += 1;
            if live {
                value = value.field(&field).ok_or_else(|| EvalError::FieldAccess {
                    field: field.clone(),
                    target: value.type_name().to_string(),
                })?;
            }
        }
        Ok(value)
    }

    fn primary(&mut self, live: bool) -> Result<Value, EvalError> {
        let position = self.position();
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| EvalError::syntax(position, "unexpected end of expression"))?;
        self.pos += 1;

        match token {
            Token::Number(n) => Ok(Value::Number(n)),
            Token::Str(s) => Ok(Value::Str(s)),
            Token::StateVar(name) => {
                if !live {
                    return Ok(Value::Null);
                }
                self.ctx
                    .lookup_state(&name)
                    .cloned()
                    .ok_or(EvalError::UnknownStateVariable(name))
            }
            Token::Ident(name) => {
                if let Some(keyword) = keyword_value(&name) {
                    return Ok(keyword);
                }
                if self.peek() == Some(&Token::LParen) {
                    return self.call(name, live);
                }
                if !live {
                    return Ok(Value::Null);
                }
                self.ctx
                    .lookup(&name)
                    .cloned()
                    .ok_or(EvalError::UnknownIdentifier(name))
            }
            Token::LParen => {
                let inner = self.ternary(live)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(EvalError::syntax(
                position,
                format!("unexpected {}", other.describe()),
            )),
        }
    }

    fn call(&mut self, name: String, live: bool) -> Result<Value, EvalError> {
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.ternary(live)?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(Token::RParen, "')' or ','")?;
                break;
            }
        }
        if live {
            call_function(&name, &args)
        } else {
            Ok(Value::Null)
        }
    }
}

fn keyword_value(name: &str) -> Option<Value> {
    match name {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" => Some(Value::Null),
        _ => None,
    }
}

fn apply_binary(op: &Token, left: Value, right: Value) -> Value {
    match op {
        Token::EqEq => Value::Bool(left == right),
        Token::NotEq => Value::Bool(left != right),
        Token::Lt => Value::Bool(left.to_number() < right.to_number()),
        Token::Gt => Value::Bool(left.to_number() > right.to_number()),
        Token::LtEq => Value::Bool(left.to_number() <= right.to_number()),
        Token::GtEq => Value::Bool(left.to_number() >= right.to_number()),
        Token::Plus => match (&left, &right) {
            (Value::Str(_), _) | (_, Value::Str(_)) => Value::Str(format!("{}{}", left, right)),
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        Token::Minus => Value::Number(left.to_number() - right.to_number()),
        Token::Star => Value::Number(left.to_number() * right.to_number()),
        Token::Slash => Value::Number(left.to_number() / right.to_number()),
        Token::Percent => Value::Number(left.to_number() % right.to_number()),
        _ => Value::Null,
    }
}
