//! Raw config types matching the entities.json document.

use crate::model::FieldType;
use serde::{Deserialize, Serialize};

/// Whole configuration document: `{"entities": [...]}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKeyConfig {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKeyConfig {
    pub fn columns(&self) -> Vec<String> {
        match self {
            PrimaryKeyConfig::Single(s) => vec![s.clone()],
            PrimaryKeyConfig::Composite(v) => v.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default)]
    pub plural_name: Option<String>,
    pub primary_key: PrimaryKeyConfig,
    pub fields: Vec<FieldConfig>,
    /// Multi-column unique indexes.
    #[serde(default)]
    pub unique: Vec<Vec<String>>,
    /// Verb names (`list`, `get`, `create`, `replace`, `patch`, `delete`) or `all`.
    /// Empty exposes every verb.
    #[serde(default)]
    pub operations: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub autoincrement: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub no_create: bool,
    #[serde(default)]
    pub no_update: bool,
    /// Column comment; may carry "not visible/create/update by api" flags.
    #[serde(default)]
    pub comment: Option<String>,
}
