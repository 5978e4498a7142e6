//! Process-wide context built once at startup and handed to the registrar and handlers.

use crate::config::EngineConfig;
use crate::store::RecordStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct EngineContext {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<EngineConfig>,
}

impl EngineContext {
    pub fn new(store: Arc<dyn RecordStore>, config: EngineConfig) -> Self {
        EngineContext {
            store,
            config: Arc::new(config),
        }
    }
}
