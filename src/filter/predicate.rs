//! Compiled predicate tree and its evaluation against one record.

use crate::filter::CompareOp;
use crate::model::{compare_values, Record};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Integer(n) => Value::from(*n),
            Literal::Decimal(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::Boolean(b) => Value::Bool(*b),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Compare {
        field: String,
        op: CompareOp,
        literal: Literal,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Compare { field, op, literal } => {
                compare(record.get(field).unwrap_or(&Value::Null), *op, literal)
            }
            Predicate::And(terms) => terms.iter().all(|t| t.matches(record)),
            Predicate::Or(terms) => terms.iter().any(|t| t.matches(record)),
        }
    }

    /// Field names referenced by the predicate, in source order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { field, .. } => out.push(field),
            Predicate::And(terms) | Predicate::Or(terms) => {
                for t in terms {
                    t.collect_fields(out);
                }
            }
        }
    }
}

/// Null (or a value of another kind) never equals a literal: `=` and the
/// orderings are false, `!=` is true.
fn compare(value: &Value, op: CompareOp, literal: &Literal) -> bool {
    let lit = literal.to_value();
    let comparable = matches!(
        (value, &lit),
        (Value::String(_), Value::String(_)) | (Value::Number(_), Value::Number(_)) | (Value::Bool(_), Value::Bool(_))
    );
    if !comparable {
        return op == CompareOp::Ne;
    }
    let ord = compare_values(value, &lit);
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cmp(field: &str, op: CompareOp, literal: Literal) -> Predicate {
        Predicate::Compare {
            field: field.into(),
            op,
            literal,
        }
    }

    #[test]
    fn null_is_distinct_from_every_literal() {
        let rec = json!({"status": null}).as_object().unwrap().clone();
        let s = || Literal::String("x".into());
        assert!(!cmp("status", CompareOp::Eq, s()).matches(&rec));
        assert!(cmp("status", CompareOp::Ne, s()).matches(&rec));
        assert!(!cmp("status", CompareOp::Lt, s()).matches(&rec));
        assert!(cmp("missing", CompareOp::Ne, s()).matches(&rec));
    }

    #[test]
    fn numeric_and_lexicographic() {
        let rec = json!({"id": 2, "title": "before", "score": 1.5}).as_object().unwrap().clone();
        assert!(cmp("id", CompareOp::Le, Literal::Integer(2)).matches(&rec));
        assert!(cmp("id", CompareOp::Gt, Literal::Decimal(1.5)).matches(&rec));
        assert!(cmp("score", CompareOp::Lt, Literal::Integer(2)).matches(&rec));
        assert!(cmp("title", CompareOp::Gt, Literal::String("after".into())).matches(&rec));
        assert!(!cmp("title", CompareOp::Ge, Literal::String("c".into())).matches(&rec));
    }

    #[test]
    fn combinators() {
        let rec = json!({"a": 1, "b": 2}).as_object().unwrap().clone();
        let yes = cmp("a", CompareOp::Eq, Literal::Integer(1));
        let no = cmp("b", CompareOp::Eq, Literal::Integer(1));
        assert!(!Predicate::And(vec![yes.clone(), no.clone()]).matches(&rec));
        assert!(Predicate::Or(vec![no, yes]).matches(&rec));
    }
}
