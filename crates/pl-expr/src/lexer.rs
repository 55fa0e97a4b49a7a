use crate::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{name}`"),
            Self::Int(v) => format!("integer `{v}`"),
            Self::Float(v) => format!("float `{v:?}`"),
            Self::Str(s) => format!("string '{s}'"),
            Self::Plus => "`+`".to_owned(),
            Self::Minus => "`-`".to_owned(),
            Self::Star => "`*`".to_owned(),
            Self::Slash => "`/`".to_owned(),
            Self::LParen => "`(`".to_owned(),
            Self::RParen => "`)`".to_owned(),
            Self::Comma => "`,`".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub start: usize,
}

/// Splits `input` into tokens. Every `+`/`-` is its own token; signs are
/// never folded into numeric literals.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let kind = match c {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b'\'' => {
                let (value, end) = read_string(input, start)?;
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    start,
                });
                i = end;
                continue;
            }
            _ if c.is_ascii_digit() => {
                let (kind, end) = read_number(input, start)?;
                tokens.push(Token { kind, start });
                i = end;
                continue;
            }
            _ if c.is_ascii_alphabetic() || c == b'_' => {
                let mut end = start + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(input[start..end].to_owned()),
                    start,
                });
                i = end;
                continue;
            }
            _ => {
                let found = input[start..].chars().next().unwrap_or_default();
                return Err(ExprError::parse(
                    start,
                    format!("unexpected character '{found}'"),
                ));
            }
        };
        tokens.push(Token { kind, start });
        i += 1;
    }
    Ok(tokens)
}

fn read_string(input: &str, start: usize) -> Result<(String, usize), ExprError> {
    let body = start + 1;
    match input[body..].find('\'') {
        Some(offset) => {
            let end = body + offset;
            Ok((input[body..end].to_owned(), end + 1))
        }
        None => Err(ExprError::parse(start, "unterminated string literal")),
    }
}

/// Digits alone form an integer. A following `.` (with or without
/// fractional digits) or an exponent turns the whole run into a float.
fn read_number(input: &str, start: usize) -> Result<(TokenKind, usize), ExprError> {
    let bytes = input.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = digits_from(start);
    let mut is_float = false;
    if end < bytes.len() && bytes[end] == b'.' {
        is_float = true;
        end = digits_from(end + 1);
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            is_float = true;
            end = digits_from(exp);
        }
    }

    let text = &input[start..end];
    let kind = if is_float {
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => TokenKind::Float(value),
            _ => {
                return Err(ExprError::InvalidLiteral {
                    position: start,
                    literal: text.to_owned(),
                    reason: "float literal is not representable as f64",
                });
            }
        }
    } else {
        TokenKind::Int(text.parse::<i64>().map_err(|_| ExprError::InvalidLiteral {
            position: start,
            literal: text.to_owned(),
            reason: "integer literal does not fit in i64",
        })?)
    };
    Ok((kind, end))
}
