//! Record to payload rendering.

use crate::model::{FieldVisibility, Record};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub type SerializeFn = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// How an endpoint renders each record.
#[derive(Clone, Default)]
pub enum Serializer {
    /// One flat object of the readable fields, in declaration order.
    #[default]
    Default,
    /// Replaces the default entirely, including its field selection.
    Custom(SerializeFn),
}

impl Serializer {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Serializer::Custom(Arc::new(f))
    }

    pub fn render(&self, record: &Record, visibility: &FieldVisibility) -> Value {
        match self {
            Serializer::Default => {
                let mut out = Map::new();
                for name in visibility.readable() {
                    out.insert(name.clone(), record.get(name).cloned().unwrap_or(Value::Null));
                }
                Value::Object(out)
            }
            Serializer::Custom(f) => f(record),
        }
    }

    pub fn render_many(&self, records: &[Record], visibility: &FieldVisibility) -> Value {
        Value::Array(records.iter().map(|r| self.render(r, visibility)).collect())
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Serializer::Default => f.write_str("Serializer::Default"),
            Serializer::Custom(_) => f.write_str("Serializer::Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityDescriptor, FieldDescriptor, FieldType};
    use serde_json::json;

    #[test]
    fn default_follows_declaration_order_and_skips_hidden() {
        let e = EntityDescriptor::builder("user")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement().hidden())
            .field(FieldDescriptor::new("name", FieldType::String))
            .field(FieldDescriptor::new("password", FieldType::String).hidden())
            .field(FieldDescriptor::new("email", FieldType::String))
            .primary_key(["id"])
            .build()
            .unwrap();
        let v = FieldVisibility::resolve(&e);
        let rec = json!({"email": "e", "password": "p", "id": 1, "name": "n"}).as_object().unwrap().clone();
        let out = Serializer::Default.render(&rec, &v);
        assert_eq!(serde_json::to_string(&out).unwrap(), r#"{"name":"n","email":"e"}"#);
    }

    #[test]
    fn custom_owns_field_selection() {
        let s = Serializer::custom(|r| json!({"key": r.get("password").cloned()}));
        let e = EntityDescriptor::builder("user")
            .field(FieldDescriptor::new("password", FieldType::String).hidden())
            .primary_key(["password"])
            .build()
            .unwrap();
        let rec = json!({"password": "p"}).as_object().unwrap().clone();
        assert_eq!(s.render(&rec, &FieldVisibility::resolve(&e)), json!({"key": "p"}));
    }
}
