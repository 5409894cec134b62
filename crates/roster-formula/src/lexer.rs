//! Tokenizer for formula expressions.
//!
//! Input must already use `.` as decimal separator (see
//! [`normalize_input`](crate::parser::normalize_input)).

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::FormulaError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(Decimal),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
        }
    }
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Splits `input` into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, FormulaError> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        let start = i;

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let token = match b {
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, start)?;
                let text = &input[start..i];
                let n = Decimal::from_str(text)
                    .map_err(|e| FormulaError::syntax(start, format!("invalid number '{}': {}", text, e)))?;
                tokens.push(Spanned {
                    token: Token::Number(n),
                    position: start,
                });
                continue;
            }
            _ if is_ident_start(b) => {
                i += 1;
                while i < len && is_ident_cont(bytes[i]) {
                    i += 1;
                }
                tokens.push(Spanned {
                    token: Token::Ident(input[start..i].to_string()),
                    position: start,
                });
                continue;
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(FormulaError::syntax(start, format!("unexpected character '{}'", ch)));
            }
        };

        tokens.push(Spanned { token, position: start });
        i += 1;
    }

    Ok(tokens)
}

/// Scans `digits[.digits]` starting at `start`; returns the end offset.
fn scan_number(bytes: &[u8], start: usize) -> Result<usize, FormulaError> {
    let len = bytes.len();
    let mut i = start;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - start;

    if i < len && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if int_digits == 0 || i == frac_start {
            return Err(FormulaError::syntax(start, "malformed decimal number"));
        }
        if i < len && bytes[i] == b'.' {
            return Err(FormulaError::syntax(i, "second decimal separator in number"));
        }
    }

    if i < len && is_ident_start(bytes[i]) {
        return Err(FormulaError::syntax(i, "identifier cannot start with a digit"));
    }
    Ok(i)
}

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub(crate) fn is_ident_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Returns `true` if `name` is a valid formula identifier.
pub fn is_identifier(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty() && is_ident_start(bytes[0]) && bytes[1..].iter().all(|b| is_ident_cont(*b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn tokenizes_arithmetic() {
        assert_eq!(
            kinds("base * 2 + (bonus - 1.5)"),
            vec![
                Token::Ident("base".into()),
                Token::Star,
                Token::Number(Decimal::from(2)),
                Token::Plus,
                Token::LParen,
                Token::Ident("bonus".into()),
                Token::Minus,
                Token::Number(Decimal::from_str("1.5").unwrap()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn positions_are_byte_offsets() {
        let toks = tokenize("a  +b").unwrap();
        let positions: Vec<_> = toks.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 3, 4]);
    }

    #[test]
    fn rejects_comma() {
        match tokenize("10,5") {
            Err(FormulaError::Syntax { position, .. }) => assert_eq!(position, 2),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(tokenize("1.").is_err());
        assert!(tokenize(".5").is_err());
        assert!(tokenize("1.2.3").is_err());
        assert!(tokenize("2x").is_err());
    }

    #[test]
    fn identifier_check() {
        assert!(is_identifier("nights_2"));
        assert!(is_identifier("_x"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }
}
