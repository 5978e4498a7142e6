//! Convert serde_json::Value to types that sqlx can bind.

use crate::filter::Literal;
use crate::model::FieldType;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A value that can be bound to a PostgreSQL query. Placeholders carry an
/// explicit cast, so text stands in for uuid and timestamp values.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
}

impl PgBindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PgBindValue::I64(i),
                None => n.as_f64().map(PgBindValue::F64).unwrap_or(PgBindValue::Null),
            },
            Value::String(s) => PgBindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => PgBindValue::Text(v.to_string()),
        }
    }

    pub fn from_literal(lit: &Literal) -> Self {
        match lit {
            Literal::String(s) => PgBindValue::Text(s.clone()),
            Literal::Integer(n) => PgBindValue::I64(*n),
            Literal::Decimal(f) => PgBindValue::F64(*f),
            Literal::Boolean(b) => PgBindValue::Bool(*b),
        }
    }

    pub fn bind<'q>(self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            PgBindValue::Null => query.bind(None::<String>),
            PgBindValue::Bool(b) => query.bind(b),
            PgBindValue::I64(n) => query.bind(n),
            PgBindValue::F64(f) => query.bind(f),
            PgBindValue::Text(s) => query.bind(s),
        }
    }
}

/// Cast applied to a placeholder bound for a column of this type.
pub fn pg_cast(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "text",
        FieldType::Integer => "bigint",
        FieldType::Float => "double precision",
        FieldType::Boolean => "boolean",
        FieldType::Uuid => "uuid",
        FieldType::Timestamp => "timestamptz",
    }
}

/// Column type used in generated DDL.
pub fn pg_column_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "TEXT",
        FieldType::Integer => "BIGINT",
        FieldType::Float => "DOUBLE PRECISION",
        FieldType::Boolean => "BOOLEAN",
        FieldType::Uuid => "UUID",
        FieldType::Timestamp => "TIMESTAMPTZ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_keep_their_kind() {
        assert_eq!(PgBindValue::from_json(&json!(7)), PgBindValue::I64(7));
        assert_eq!(PgBindValue::from_json(&json!(0.5)), PgBindValue::F64(0.5));
        assert_eq!(PgBindValue::from_json(&json!(null)), PgBindValue::Null);
        assert_eq!(PgBindValue::from_json(&json!("x")), PgBindValue::Text("x".into()));
    }
}
