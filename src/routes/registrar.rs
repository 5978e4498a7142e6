//! Setup-time endpoint table: one registered endpoint per (entity, verb).

use crate::config::ResolvedModel;
use crate::decorator::{Decorator, DecoratorChain, EndpointRequest, HandlerResult};
use crate::error::ConfigError;
use crate::error_map::ErrorMapper;
use crate::handlers::entity::CrudHandler;
use crate::model::{EntityDescriptor, FieldVisibility};
use crate::serialize::Serializer;
use crate::state::EngineContext;
use axum::http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    List,
    Get,
    Create,
    Replace,
    Patch,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 6] = [Verb::List, Verb::Get, Verb::Create, Verb::Replace, Verb::Patch, Verb::Delete];

    pub fn method(self) -> Method {
        match self {
            Verb::List | Verb::Get => Method::GET,
            Verb::Create => Method::POST,
            Verb::Replace => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }

    /// Verbs addressed by a primary-key tuple in the path.
    pub fn is_single_record(self) -> bool {
        !matches!(self, Verb::List | Verb::Create)
    }

    /// Verbs whose request body is decoded into a payload.
    pub fn has_body(self) -> bool {
        matches!(self, Verb::Create | Verb::Replace | Verb::Patch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::List => "list",
            Verb::Get => "get",
            Verb::Create => "create",
            Verb::Replace => "replace",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
        }
    }

    /// Case-insensitive verb name.
    pub fn parse(s: &str) -> Option<Verb> {
        Verb::ALL.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

/// Literal entity segment followed by one variable per primary-key field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// LIST uses the plural name; every other verb the singular name, with
    /// key variables in primary-key order for single-record verbs.
    pub fn for_endpoint(entity: &EntityDescriptor, verb: Verb) -> Self {
        let mut segments = Vec::with_capacity(1 + entity.primary_key().len());
        if verb == Verb::List {
            segments.push(Segment::Literal(entity.plural_name().to_string()));
        } else {
            segments.push(Segment::Literal(entity.name().to_string()));
        }
        if verb.is_single_record() {
            segments.extend(entity.primary_key().iter().cloned().map(Segment::Var));
        }
        PathPattern { segments }
    }

    /// axum 0.7 route syntax (`/todo/:id/:idd`).
    pub fn to_axum(&self) -> String {
        self.render(|name| format!(":{}", name))
    }

    /// Variables erased: two patterns with the same shape match the same requests.
    fn shape(&self) -> String {
        self.render(|_| "*".to_string())
    }

    pub fn variables(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Var(v) => Some(v.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    fn render(&self, var: impl Fn(&str) -> String) -> String {
        let mut out = String::new();
        for s in &self.segments {
            out.push('/');
            match s {
                Segment::Literal(l) => out.push_str(l),
                Segment::Var(v) => out.push_str(&var(v)),
            }
        }
        out
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|name| format!("{{{}}}", name)))
    }
}

/// Per-endpoint customization.
#[derive(Clone, Default)]
pub struct EndpointOptions {
    decorators: Vec<Arc<dyn Decorator>>,
    serializer: Serializer,
    error_mapper: ErrorMapper,
}

impl EndpointOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decorator; earlier decorators wrap later ones.
    pub fn decorator(self, decorator: impl Decorator) -> Self {
        self.decorator_arc(Arc::new(decorator))
    }

    pub fn decorator_arc(mut self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn error_mapper(mut self, error_mapper: ErrorMapper) -> Self {
        self.error_mapper = error_mapper;
        self
    }
}

/// Bound (verb, path, decorators, serializer, error mapper). Read-only after registration.
pub struct RegisteredEndpoint {
    pub verb: Verb,
    pub entity: Arc<EntityDescriptor>,
    pub path: PathPattern,
    chain: DecoratorChain,
}

impl RegisteredEndpoint {
    pub fn method(&self) -> Method {
        self.verb.method()
    }

    pub fn decorator_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    pub async fn call(&self, req: EndpointRequest) -> HandlerResult {
        self.chain.call(req).await
    }
}

impl fmt::Debug for RegisteredEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredEndpoint")
            .field("verb", &self.verb)
            .field("entity", &self.entity.name())
            .field("path", &self.path.to_string())
            .field("decorators", &self.chain.names())
            .finish()
    }
}

struct RegisteredEntity {
    descriptor: Arc<EntityDescriptor>,
    visibility: Arc<FieldVisibility>,
}

/// Builds the endpoint table. Every failure is a [`ConfigError`] raised here, never at request time.
pub struct RouteRegistrar {
    ctx: EngineContext,
    entities: HashMap<String, RegisteredEntity>,
    endpoints: Vec<Arc<RegisteredEndpoint>>,
    /// (method, shape) already bound.
    bound: HashMap<(Method, String), String>,
    /// shape -> axum path, so methods sharing a shape share one route.
    shapes: HashMap<String, String>,
}

impl RouteRegistrar {
    pub fn new(ctx: EngineContext) -> Self {
        RouteRegistrar {
            ctx,
            entities: HashMap::new(),
            endpoints: Vec::new(),
            bound: HashMap::new(),
            shapes: HashMap::new(),
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn endpoints(&self) -> &[Arc<RegisteredEndpoint>] {
        &self.endpoints
    }

    /// Registers one verb for `entity`. Registering a second, different
    /// descriptor under an existing entity name fails.
    pub fn add_api(
        &mut self,
        entity: Arc<EntityDescriptor>,
        verb: Verb,
        options: EndpointOptions,
    ) -> Result<Arc<RegisteredEndpoint>, ConfigError> {
        let visibility = self.visibility_for(&entity)?;
        let path = PathPattern::for_endpoint(&entity, verb);
        let method = verb.method();
        let shape = path.shape();
        let axum_path = path.to_axum();

        if self.bound.contains_key(&(method.clone(), shape.clone())) {
            return Err(ConfigError::DuplicateRoute {
                method: method.to_string(),
                path: path.to_string(),
            });
        }
        if let Some(existing) = self.shapes.get(&shape) {
            if *existing != axum_path {
                return Err(ConfigError::DuplicateRoute {
                    method: method.to_string(),
                    path: path.to_string(),
                });
            }
        }

        let handler = Arc::new(CrudHandler::new(
            verb,
            entity.clone(),
            visibility.clone(),
            options.serializer,
            options.error_mapper,
            self.ctx.clone(),
        ));
        let chain = DecoratorChain::compose(options.decorators, handler, method.as_str(), &path.to_string())?;
        let endpoint = Arc::new(RegisteredEndpoint {
            verb,
            entity: entity.clone(),
            path,
            chain,
        });

        tracing::info!(
            entity = %entity.name(),
            verb = %verb,
            method = %method,
            path = %endpoint.path,
            decorators = ?endpoint.decorator_names(),
            "endpoint registered"
        );
        self.entities
            .entry(entity.name().to_string())
            .or_insert_with(|| RegisteredEntity {
                descriptor: entity.clone(),
                visibility: visibility.clone(),
            });
        self.bound.insert((method, shape.clone()), endpoint.path.to_string());
        self.shapes.insert(shape, axum_path);
        self.endpoints.push(endpoint.clone());
        Ok(endpoint)
    }

    /// Registers each verb with a clone of `options`.
    pub fn add_all(
        &mut self,
        entity: Arc<EntityDescriptor>,
        verbs: &[Verb],
        options: EndpointOptions,
    ) -> Result<(), ConfigError> {
        for verb in verbs {
            self.add_api(entity.clone(), *verb, options.clone())?;
        }
        Ok(())
    }

    /// Registers every entity of a resolved config with default options.
    pub fn register_resolved(&mut self, model: &ResolvedModel) -> Result<(), ConfigError> {
        for e in &model.entities {
            self.add_all(e.descriptor.clone(), &e.operations, EndpointOptions::default())?;
        }
        Ok(())
    }

    pub fn visibility(&self, entity: &str) -> Option<Arc<FieldVisibility>> {
        self.entities.get(entity).map(|e| e.visibility.clone())
    }

    /// The resolved visibility for `entity`, computed fresh when the name is
    /// not registered yet. Does not record anything.
    fn visibility_for(&self, entity: &Arc<EntityDescriptor>) -> Result<Arc<FieldVisibility>, ConfigError> {
        if let Some(existing) = self.entities.get(entity.name()) {
            if !Arc::ptr_eq(&existing.descriptor, entity) {
                return Err(ConfigError::DuplicateEntity(entity.name().to_string()));
            }
            return Ok(existing.visibility.clone());
        }
        Ok(Arc::new(FieldVisibility::resolve(entity)))
    }
}
