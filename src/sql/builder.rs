//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from an entity descriptor.

use crate::filter::{CompareOp, Literal, Predicate};
use crate::model::{EntityDescriptor, FieldType, KeyTuple, Record};
use crate::query::{Direction, QuerySpec};
use crate::sql::params::{pg_cast, PgBindValue};

/// Quote identifier for PostgreSQL (safe: only from descriptors).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Pushes a bind value and returns its `$n::cast` placeholder.
    fn placeholder(&mut self, v: PgBindValue, cast: &str) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), cast)
    }
}

/// SELECT list: every field cast to the type the row decoder expects.
fn select_column_list(entity: &EntityDescriptor) -> String {
    entity
        .fields()
        .iter()
        .map(|f| {
            let q = quoted(&f.name);
            format!("{}::{} AS {}", q, pg_cast(f.field_type), q)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_clause(entity: &EntityDescriptor, key: &KeyTuple, q: &mut QueryBuf) -> String {
    key.parts()
        .iter()
        .map(|(name, value)| {
            let cast = entity.field(name).map(|f| pg_cast(f.field_type)).unwrap_or("text");
            let ph = q.placeholder(PgBindValue::from_json(value), cast);
            format!("{} = {}", quoted(name), ph)
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn literal_cast(field_type: FieldType, literal: &Literal) -> &'static str {
    match (field_type, literal) {
        (FieldType::Uuid | FieldType::Timestamp, Literal::String(_)) => pg_cast(field_type),
        (_, Literal::String(_)) => "text",
        (_, Literal::Integer(_)) => "bigint",
        (_, Literal::Decimal(_)) => "double precision",
        (_, Literal::Boolean(_)) => "boolean",
    }
}

/// WHERE fragment for a compiled filter. `!=` treats null as distinct.
pub fn predicate_sql(entity: &EntityDescriptor, predicate: &Predicate, q: &mut QueryBuf) -> String {
    match predicate {
        Predicate::Compare { field, op, literal } => {
            let field_type = entity.field(field).map(|f| f.field_type).unwrap_or(FieldType::String);
            let ph = q.placeholder(PgBindValue::from_literal(literal), literal_cast(field_type, literal));
            let op = match op {
                CompareOp::Ne => "IS DISTINCT FROM",
                other => other.as_str(),
            };
            format!("{} {} {}", quoted(field), op, ph)
        }
        Predicate::And(terms) => join_terms(entity, terms, " AND ", q),
        Predicate::Or(terms) => join_terms(entity, terms, " OR ", q),
    }
}

fn join_terms(entity: &EntityDescriptor, terms: &[Predicate], sep: &str, q: &mut QueryBuf) -> String {
    let parts: Vec<String> = terms.iter().map(|t| predicate_sql(entity, t, q)).collect();
    format!("({})", parts.join(sep))
}

/// SELECT with filter, requested order (primary key as tie-breaker), LIMIT/OFFSET.
/// Nulls sort lowest in both directions, matching the in-memory store.
pub fn select_list(entity: &EntityDescriptor, schema: &str, spec: &QuerySpec) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.name());
    let where_clause = spec
        .predicate
        .as_ref()
        .map(|p| format!(" WHERE {}", predicate_sql(entity, p, &mut q)))
        .unwrap_or_default();

    let mut terms: Vec<String> = spec
        .order_by
        .iter()
        .map(|o| match o.direction {
            Direction::Asc => format!("{} ASC NULLS FIRST", quoted(&o.field)),
            Direction::Desc => format!("{} DESC NULLS LAST", quoted(&o.field)),
        })
        .collect();
    terms.extend(entity.primary_key().iter().map(|pk| format!("{} ASC", quoted(pk))));
    let order_clause = format!(" ORDER BY {}", terms.join(", "));
    let limit_clause = spec.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = if spec.offset > 0 {
        format!(" OFFSET {}", spec.offset)
    } else {
        String::new()
    };

    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        select_column_list(entity),
        table,
        where_clause,
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

pub fn select_by_key(entity: &EntityDescriptor, schema: &str, key: &KeyTuple) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.name());
    let where_clause = key_clause(entity, key, &mut q);
    q.sql = format!("SELECT {} FROM {} WHERE {}", select_column_list(entity), table, where_clause);
    q
}

/// INSERT of the descriptor fields present in `values`. The autoincrement
/// field is always left to the database.
pub fn insert(entity: &EntityDescriptor, schema: &str, values: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.name());
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in entity.fields() {
        if f.autoincrement {
            continue;
        }
        let Some(v) = values.get(&f.name) else { continue };
        placeholders.push(q.placeholder(PgBindValue::from_json(v), pg_cast(f.field_type)));
        cols.push(quoted(&f.name));
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by key: SET only descriptor fields present in `values`.
/// With nothing to set, selects the row instead.
pub fn update(entity: &EntityDescriptor, schema: &str, key: &KeyTuple, values: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.name());
    let mut sets = Vec::new();
    for f in entity.fields() {
        let Some(v) = values.get(&f.name) else { continue };
        let ph = q.placeholder(PgBindValue::from_json(v), pg_cast(f.field_type));
        sets.push(format!("{} = {}", quoted(&f.name), ph));
    }
    if sets.is_empty() {
        return select_by_key(entity, schema, key);
    }
    let where_clause = key_clause(entity, key, &mut q);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        table,
        sets.join(", "),
        where_clause,
        select_column_list(entity)
    );
    q
}

/// DELETE by key.
pub fn delete(entity: &EntityDescriptor, schema: &str, key: &KeyTuple) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.name());
    let where_clause = key_clause(entity, key, &mut q);
    q.sql = format!(
        "DELETE FROM {} WHERE {} RETURNING {}",
        table,
        where_clause,
        quoted(&entity.primary_key()[0])
    );
    q
}
