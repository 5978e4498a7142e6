//! Resolved model: descriptors built from config, plus the verbs each entity exposes.

use crate::model::EntityDescriptor;
use crate::routes::Verb;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub descriptor: Arc<EntityDescriptor>,
    pub operations: Vec<Verb>,
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub entities: Vec<ResolvedEntity>,
}

impl ResolvedModel {
    pub fn entity(&self, name: &str) -> Option<&ResolvedEntity> {
        self.entities.iter().find(|e| e.descriptor.name() == name)
    }

    pub fn descriptors(&self) -> Vec<Arc<EntityDescriptor>> {
        self.entities.iter().map(|e| e.descriptor.clone()).collect()
    }
}
