use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    /// `$name` reference into the user-state scope.
    StateVar(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    Question,
    Colon,
    LParen,
    RParen,
    Comma,
    Dot,
}

impl Token {
    /// Whether a `-` following this token starts a negative literal.
    fn allows_negative_literal(&self) -> bool {
        !matches!(
            self,
            Token::Number(_)
                | Token::Str(_)
                | Token::Ident(_)
                | Token::StateVar(_)
                | Token::RParen
                | Token::Dot
        )
    }

    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Str(s) => format!("string '{}'", s),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::StateVar(name) => format!("state variable '${}'", name),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Bang => "!",
            Token::Question => "?",
            Token::Colon => ":",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Dot => ".",
            _ => "",
        }
    }
}

/// A token together with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Splits an expression into tokens.
///
/// A `-` directly followed by a digit becomes part of a negative number literal
/// only when the previous token is absent, an operator, `(` or `,`.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, EvalError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens: Vec<Spanned> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let (number, next) = lex_number(source, &chars, i)?;
            tokens.push(Spanned {
                token: Token::Number(number),
                position,
            });
            i = next;
            continue;
        }

        if c == '-' {
            let negative_literal = chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit())
                && tokens
                    .last()
                    .is_none_or(|prev| prev.token.allows_negative_literal());
            if negative_literal {
                let (number, next) = lex_number(source, &chars, i + 1)?;
                tokens.push(Spanned {
                    token: Token::Number(-number),
                    position,
                });
                i = next;
                continue;
            }
        }

        if c.is_alphabetic() || c == '_' {
            let end = scan_ident(&chars, i);
            let name: String = chars[i..end].iter().map(|(_, ch)| ch).collect();
            tokens.push(Spanned {
                token: Token::Ident(name),
                position,
            });
            i = end;
            continue;
        }

        if c == '$' {
            let end = scan_ident(&chars, i + 1);
            if end == i + 1 {
                return Err(EvalError::syntax(position, "expected a name after '$'"));
            }
            let name: String = chars[i + 1..end].iter().map(|(_, ch)| ch).collect();
            tokens.push(Spanned {
                token: Token::StateVar(name),
                position,
            });
            i = end;
            continue;
        }

        if c == '\'' || c == '"' {
            let (text, next) = lex_string(&chars, i)?;
            tokens.push(Spanned {
                token: Token::Str(text),
                position,
            });
            i = next;
            continue;
        }

        let next_char = chars.get(i + 1).map(|(_, ch)| *ch);
        let (token, width) = match (c, next_char) {
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::LtEq, 2),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('!', _) => (Token::Bang, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('?', _) => (Token::Question, 1),
            (':', _) => (Token::Colon, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            _ => {
                return Err(EvalError::syntax(
                    position,
                    format!("unexpected character '{}'", c),
                ));
            }
        };
        tokens.push(Spanned { token, position });
        i += width;
    }

    Ok(tokens)
}

fn scan_ident(chars: &[(usize, char)], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && (chars[end].1.is_alphanumeric() || chars[end].1 == '_') {
        end += 1;
    }
    end
}

fn lex_number(
    source: &str,
    chars: &[(usize, char)],
    start: usize,
) -> Result<(f64, usize), EvalError> {
    let mut end = start;
    while end < chars.len() && chars[end].1.is_ascii_digit() {
        end += 1;
    }
    // A fractional part needs a digit after the dot, otherwise the dot is field access.
    if end + 1 < chars.len() && chars[end].1 == '.' && chars[end + 1].1.is_ascii_digit() {
        end += 1;
        while end < chars.len() && chars[end].1.is_ascii_digit() {
            end += 1;
        }
    }
    let from = chars[start].0;
    let to = chars.get(end).map_or(source.len(), |(offset, _)| *offset);
    let text = &source[from..to];
    text.parse::<f64>()
        .map(|n| (n, end))
        .map_err(|_| EvalError::syntax(from, format!("invalid number '{}'", text)))
}

fn lex_string(chars: &[(usize, char)], start: usize) -> Result<(String, usize), EvalError> {
    let (position, quote) = chars[start];
    let mut text = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i].1 {
            '\\' if i + 1 < chars.len() => {
                text.push(chars[i + 1].1);
                i += 2;
            }
            c if c == quote => return Ok((text, i + 1)),
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    Err(EvalError::syntax(position, "unterminated string literal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn minus_after_operand_is_subtraction() {
        assert_eq!(
            kinds("a -3"),
            vec![Token::Ident("a".into()), Token::Minus, Token::Number(3.0)]
        );
        assert_eq!(
            kinds("(2)-3"),
            vec![
                Token::LParen,
                Token::Number(2.0),
                Token::RParen,
                Token::Minus,
                Token::Number(3.0)
            ]
        );
    }

    #[test]
    fn minus_after_operator_is_negative_literal() {
        assert_eq!(kinds("-3"), vec![Token::Number(-3.0)]);
        assert_eq!(
            kinds("2 * -3"),
            vec![Token::Number(2.0), Token::Star, Token::Number(-3.0)]
        );
        assert_eq!(
            kinds("max(1,-2)"),
            vec![
                Token::Ident("max".into()),
                Token::LParen,
                Token::Number(1.0),
                Token::Comma,
                Token::Number(-2.0),
                Token::RParen
            ]
        );
    }

    #[test]
    fn decimal_and_field_access_are_distinct() {
        assert_eq!(kinds("1.5"), vec![Token::Number(1.5)]);
        assert_eq!(
            kinds("left.denom"),
            vec![
                Token::Ident("left".into()),
                Token::Dot,
                Token::Ident("denom".into())
            ]
        );
    }

    #[test]
    fn reports_position_of_bad_character() {
        match tokenize("a # b") {
            Err(EvalError::Syntax { position, .. }) => assert_eq!(position, 2),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_is_syntax_error() {
        assert!(matches!(
            tokenize("'abc"),
            Err(EvalError::Syntax { position: 0, .. })
        ));
    }
}
