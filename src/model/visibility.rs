//! Readable / creatable / updatable field sets, computed once per entity.

use crate::model::{EntityDescriptor, Record};
use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct FieldVisibility {
    readable: Vec<String>,
    creatable: Vec<String>,
    updatable: Vec<String>,
}

impl FieldVisibility {
    /// `readable = fields - hidden`;
    /// `creatable = fields - hidden - no_create - autoincrement keys`;
    /// `updatable = fields - hidden - no_update - primary key`.
    pub fn resolve(entity: &EntityDescriptor) -> Self {
        let mut readable = Vec::new();
        let mut creatable = Vec::new();
        let mut updatable = Vec::new();
        for f in entity.fields() {
            if f.visibility.hidden {
                continue;
            }
            readable.push(f.name.clone());
            let auto_key = f.autoincrement && entity.is_primary_key(&f.name);
            if !f.visibility.no_create && !auto_key {
                creatable.push(f.name.clone());
            }
            if !f.visibility.no_update && !entity.is_primary_key(&f.name) {
                updatable.push(f.name.clone());
            }
        }
        FieldVisibility {
            readable,
            creatable,
            updatable,
        }
    }

    /// Readable fields in declaration order.
    pub fn readable(&self) -> &[String] {
        &self.readable
    }

    pub fn creatable(&self) -> &[String] {
        &self.creatable
    }

    /// Fields a full replace overwrites.
    pub fn updatable(&self) -> &[String] {
        &self.updatable
    }

    /// Updatable fields actually present in a patch payload.
    pub fn updatable_partial<'a>(&'a self, payload: &Record) -> Vec<&'a str> {
        self.updatable
            .iter()
            .filter(|f| payload.contains_key(f.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn is_readable(&self, name: &str) -> bool {
        self.readable.iter().any(|f| f == name)
    }

    /// Keeps only creatable keys; everything else is silently dropped.
    pub fn retain_creatable(&self, payload: Record) -> Record {
        retain(payload, &self.creatable)
    }

    /// Keeps only updatable keys; everything else is silently dropped.
    pub fn retain_updatable(&self, payload: Record) -> Record {
        retain(payload, &self.updatable)
    }
}

fn retain(payload: Record, allowed: &[String]) -> Record {
    let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    payload
        .into_iter()
        .filter(|(k, _)| allowed.contains(k.as_str()))
        .collect()
}
