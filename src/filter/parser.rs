//! Recursive-descent parser producing a [`Predicate`] checked against an entity's columns.

use crate::filter::lexer::{tokenize, Token, TokenKind};
use crate::filter::{FilterError, Literal, Predicate};
use crate::model::{canonical_timestamp, canonical_uuid, parse_timestamp, EntityDescriptor, FieldType, FieldVisibility};

/// Compiles `input` against the readable columns of `entity`.
/// Hidden columns are treated as unknown.
pub fn parse(
    input: &str,
    entity: &EntityDescriptor,
    visibility: &FieldVisibility,
) -> Result<Predicate, FilterError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        entity,
        visibility,
        end: input.len(),
    };
    parser.expr()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    entity: &'a EntityDescriptor,
    visibility: &'a FieldVisibility,
    end: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eof(&self, expected: &str) -> FilterError {
        FilterError::new(format!("expected {}", expected), "", self.end)
    }

    /// `or` groups of `and` chains: a or b and c == a or (b and c).
    fn expr(&mut self) -> Result<Predicate, FilterError> {
        let mut groups: Vec<Vec<Predicate>> = vec![vec![self.term()?]];
        while let Some(tok) = self.next() {
            match tok.kind {
                TokenKind::And => {
                    let term = self.term()?;
                    if let Some(last) = groups.last_mut() {
                        last.push(term);
                    }
                }
                TokenKind::Or => groups.push(vec![self.term()?]),
                _ => {
                    return Err(FilterError::new("expected 'and' or 'or'", &tok.text, tok.position));
                }
            }
        }
        let mut ors: Vec<Predicate> = groups
            .into_iter()
            .map(|mut g| if g.len() == 1 { g.remove(0) } else { Predicate::And(g) })
            .collect();
        Ok(if ors.len() == 1 { ors.remove(0) } else { Predicate::Or(ors) })
    }

    fn term(&mut self) -> Result<Predicate, FilterError> {
        let col = self.next().ok_or_else(|| self.eof("a column name"))?;
        let TokenKind::Ident(name) = &col.kind else {
            return Err(FilterError::new("expected a column name", &col.text, col.position));
        };
        let field = self
            .entity
            .field(name)
            .filter(|f| self.visibility.is_readable(&f.name))
            .ok_or_else(|| FilterError::new("unknown column", &col.text, col.position))?;

        let op_tok = self.next().ok_or_else(|| self.eof("a comparison operator"))?;
        let TokenKind::Op(op) = op_tok.kind else {
            return Err(FilterError::new("expected a comparison operator", &op_tok.text, op_tok.position));
        };

        let lit_tok = self.next().ok_or_else(|| self.eof("a literal"))?;
        let literal = typed_literal(field.field_type, lit_tok)?;
        Ok(Predicate::Compare {
            field: field.name.clone(),
            op,
            literal,
        })
    }
}

fn typed_literal(field_type: FieldType, tok: &Token) -> Result<Literal, FilterError> {
    let mismatch = |what: &str| FilterError::new(format!("expected {} literal", what), &tok.text, tok.position);
    match (field_type, &tok.kind) {
        (FieldType::Integer | FieldType::Float, TokenKind::Int(n)) => Ok(Literal::Integer(*n)),
        (FieldType::Integer | FieldType::Float, TokenKind::Decimal(f)) => Ok(Literal::Decimal(*f)),
        (FieldType::Integer | FieldType::Float, _) => Err(mismatch("a numeric")),
        (FieldType::String, TokenKind::Str(s)) => Ok(Literal::String(s.clone())),
        (FieldType::String, _) => Err(mismatch("a quoted string")),
        (FieldType::Uuid, TokenKind::Str(s)) => canonical_uuid(s)
            .map(Literal::String)
            .ok_or_else(|| mismatch("a uuid")),
        (FieldType::Timestamp, TokenKind::Str(s)) => parse_timestamp(s)
            .map(|t| Literal::String(canonical_timestamp(&t)))
            .ok_or_else(|| mismatch("an RFC 3339 timestamp")),
        (FieldType::Uuid, _) => Err(mismatch("a uuid")),
        (FieldType::Timestamp, _) => Err(mismatch("an RFC 3339 timestamp")),
        (FieldType::Boolean, TokenKind::Str(s)) if s.eq_ignore_ascii_case("true") => Ok(Literal::Boolean(true)),
        (FieldType::Boolean, TokenKind::Str(s)) if s.eq_ignore_ascii_case("false") => Ok(Literal::Boolean(false)),
        (FieldType::Boolean, TokenKind::Int(1)) => Ok(Literal::Boolean(true)),
        (FieldType::Boolean, TokenKind::Int(0)) => Ok(Literal::Boolean(false)),
        (FieldType::Boolean, _) => Err(mismatch("a boolean")),
    }
}
