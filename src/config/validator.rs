//! Config validation: cross-entity consistency and exposed operations.
//! Per-entity shape (fields, keys, autoincrement) is checked by the descriptor builder.

use crate::config::FullConfig;
use crate::error::ConfigError;
use crate::routes::Verb;
use std::collections::HashSet;

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for e in &config.entities {
        if !names.insert(e.name.as_str()) {
            return Err(ConfigError::DuplicateEntity(e.name.clone()));
        }
        if e.name.is_empty() {
            return Err(ConfigError::Validation("entity name must not be empty".into()));
        }
        if e.primary_key.columns().is_empty() {
            return Err(ConfigError::EmptyPrimaryKey(e.name.clone()));
        }
        for op in &e.operations {
            if !op.eq_ignore_ascii_case("all") && Verb::parse(op).is_none() {
                return Err(ConfigError::UnknownOperation {
                    entity: e.name.clone(),
                    operation: op.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Verbs exposed for an entity: empty or `all` means every verb, in canonical order.
pub fn operations(ops: &[String]) -> Vec<Verb> {
    if ops.is_empty() || ops.iter().any(|o| o.eq_ignore_ascii_case("all")) {
        return Verb::ALL.to_vec();
    }
    Verb::ALL
        .iter()
        .copied()
        .filter(|v| ops.iter().any(|o| Verb::parse(o) == Some(*v)))
        .collect()
}
