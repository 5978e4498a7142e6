//! Filter language: `column op literal` terms joined by `and` / `or`.
//!
//! ```text
//! expr := term (("and" | "or") term)*
//! term := column op literal
//! op   := = | != | < | <= | > | >=
//! ```
//!
//! `and` binds tighter than `or`; there are no parentheses. Keywords are
//! case-insensitive. Literals are single-quoted strings, integers or decimals.

mod lexer;
mod parser;
mod predicate;

pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse;
pub use predicate::{Literal, Predicate};

use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter that failed to compile. `token` is the offending source text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("filter: {message} at position {position}: '{token}'")]
pub struct FilterError {
    pub message: String,
    pub token: String,
    pub position: usize,
}

impl FilterError {
    pub fn new(message: impl Into<String>, token: impl Into<String>, position: usize) -> Self {
        FilterError {
            message: message.into(),
            token: token.into(),
            position,
        }
    }
}
