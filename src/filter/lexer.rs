//! Tokenizer for the filter language.

use crate::filter::{CompareOp, FilterError};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    Decimal(f64),
    Op(CompareOp),
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, for error messages.
    pub text: String,
    /// Byte offset of the token start.
    pub position: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
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
            b'\'' => {
                let (s, end) = read_string(input, start)?;
                i = end;
                TokenKind::Str(s)
            }
            b'=' => {
                i += 1;
                TokenKind::Op(CompareOp::Eq)
            }
            b'!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    TokenKind::Op(CompareOp::Ne)
                } else {
                    return Err(FilterError::new("expected '!='", "!", start));
                }
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    TokenKind::Op(CompareOp::Le)
                } else {
                    i += 1;
                    TokenKind::Op(CompareOp::Lt)
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    TokenKind::Op(CompareOp::Ge)
                } else {
                    i += 1;
                    TokenKind::Op(CompareOp::Gt)
                }
            }
            b'-' | b'0'..=b'9' | b'.' => {
                let (kind, end) = read_number(input, start)?;
                i = end;
                kind
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let word = &input[start..i];
                if word.eq_ignore_ascii_case("and") {
                    TokenKind::And
                } else if word.eq_ignore_ascii_case("or") {
                    TokenKind::Or
                } else {
                    TokenKind::Ident(word.to_string())
                }
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(FilterError::new("unexpected character", ch.to_string(), start));
            }
        };
        tokens.push(Token {
            kind,
            text: input[start..i].to_string(),
            position: start,
        });
    }
    Ok(tokens)
}

/// Reads a single-quoted literal starting at `start`. A doubled quote ('') is an escaped quote.
fn read_string(input: &str, start: usize) -> Result<(String, usize), FilterError> {
    let bytes = input.as_bytes();
    let mut out = String::new();
    let mut i = start + 1;
    let mut run = i;
    loop {
        match bytes.get(i) {
            None => {
                return Err(FilterError::new("unterminated string literal", &input[start..], start));
            }
            Some(b'\'') => {
                out.push_str(&input[run..i]);
                if bytes.get(i + 1) == Some(&b'\'') {
                    out.push('\'');
                    i += 2;
                    run = i;
                } else {
                    return Ok((out, i + 1));
                }
            }
            Some(_) => i += 1,
        }
    }
}

fn read_number(input: &str, start: usize) -> Result<(TokenKind, usize), FilterError> {
    let bytes = input.as_bytes();
    let mut i = start;
    if bytes[i] == b'-' {
        i += 1;
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.' || bytes[i] == b'_') {
        i += 1;
    }
    let text = &input[start..i];
    if let Ok(n) = text.parse::<i64>() {
        return Ok((TokenKind::Int(n), i));
    }
    let decimal_shape = text
        .trim_start_matches('-')
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.');
    match text.parse::<f64>() {
        Ok(f) if decimal_shape && f.is_finite() => Ok((TokenKind::Decimal(f), i)),
        _ => Err(FilterError::new("malformed numeric literal", text, start)),
    }
}
