//! Entity REST: descriptor-driven CRUD endpoints over pluggable record stores.

pub mod config;
pub mod decorator;
pub mod error;
pub mod error_map;
pub mod filter;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod query;
pub mod response;
pub mod routes;
pub mod serialize;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{load_from_path, load_from_str, resolve, EngineConfig, FullConfig, ResolvedEntity, ResolvedModel};
pub use decorator::{BoxFuture, Decorator, EndpointRequest, FnDecorator, HandlerResult, Next};
pub use error::{AppError, ConfigError, StoreError};
pub use error_map::ErrorMapper;
pub use migration::ensure_tables;
pub use model::{EntityDescriptor, FieldDescriptor, FieldType, FieldVisibility, KeyTuple, Record, Visibility};
pub use query::{Direction, ListLimits, OrderBy, QuerySpec};
pub use response::Reply;
pub use routes::{
    api_router, app_router, common_routes, common_routes_with_ready, entity_routes, EndpointOptions, PathPattern,
    RegisteredEndpoint, RouteRegistrar, Verb,
};
pub use serialize::Serializer;
pub use service::CrudService;
pub use state::EngineContext;
pub use store::{MemoryStore, PgStore, RecordStore};
