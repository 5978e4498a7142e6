//! Endpoint middleware. The first-listed decorator is outermost: it sees the
//! request first and the reply last, and may short-circuit by not calling `next`.

use crate::error::{AppError, ConfigError};
use crate::model::Record;
use crate::response::Reply;
use crate::routes::Verb;
use axum::http::HeaderMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// `Ok` carries the (status, payload) pair; `Err` is an outcome no inner
/// layer translated.
pub type HandlerResult = Result<Reply, AppError>;

/// One decoded request as seen by decorators and the base handler.
#[derive(Clone, Debug)]
pub struct EndpointRequest {
    pub verb: Verb,
    /// Decoded path variables in route order.
    pub path_params: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Decoded body. Empty for reads.
    pub payload: Record,
    pub headers: HeaderMap,
    /// Set when the path, query string or body could not be decoded. The
    /// base handler returns it before touching the store.
    pub rejection: Option<AppError>,
}

impl EndpointRequest {
    pub fn new(verb: Verb) -> Self {
        EndpointRequest {
            verb,
            path_params: Vec::new(),
            query: Vec::new(),
            payload: Record::new(),
            headers: HeaderMap::new(),
            rejection: None,
        }
    }
}

/// Innermost layer of a chain.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, req: EndpointRequest) -> BoxFuture<'a, HandlerResult>;
}

pub trait Decorator: Send + Sync + 'static {
    /// Used in configuration errors and logs.
    fn name(&self) -> &'static str;

    fn call<'a>(&'a self, req: EndpointRequest, next: Next<'a>) -> BoxFuture<'a, HandlerResult>;
}

/// The remainder of a chain below the current decorator.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Decorator>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub fn run(self, req: EndpointRequest) -> BoxFuture<'a, HandlerResult> {
        match self.chain.split_first() {
            Some((first, rest)) => first.call(
                req,
                Next {
                    chain: rest,
                    handler: self.handler,
                },
            ),
            None => self.handler.call(req),
        }
    }
}

/// Decorator from a closure:
///
/// ```ignore
/// let d = FnDecorator::new("audit", |req, next| Box::pin(async move { next.run(req).await }));
/// ```
pub struct FnDecorator<F> {
    name: &'static str,
    f: F,
}

impl<F> FnDecorator<F>
where
    F: for<'a> Fn(EndpointRequest, Next<'a>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    pub fn new(name: &'static str, f: F) -> Self {
        FnDecorator { name, f }
    }

    pub fn shared(name: &'static str, f: F) -> Arc<dyn Decorator> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Decorator for FnDecorator<F>
where
    F: for<'a> Fn(EndpointRequest, Next<'a>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, req: EndpointRequest, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        (self.f)(req, next)
    }
}

/// A handler wrapped by its decorators, composed once at registration.
pub struct DecoratorChain {
    decorators: Vec<Arc<dyn Decorator>>,
    handler: Arc<dyn Handler>,
}

impl DecoratorChain {
    /// Fails when the same decorator instance is listed twice.
    pub fn compose(
        decorators: Vec<Arc<dyn Decorator>>,
        handler: Arc<dyn Handler>,
        method: &str,
        path: &str,
    ) -> Result<Self, ConfigError> {
        for (i, d) in decorators.iter().enumerate() {
            if decorators[..i].iter().any(|prev| Arc::ptr_eq(prev, d)) {
                return Err(ConfigError::DuplicateDecorator {
                    name: d.name(),
                    method: method.to_string(),
                    path: path.to_string(),
                });
            }
        }
        Ok(DecoratorChain { decorators, handler })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.decorators.iter().map(|d| d.name()).collect()
    }

    pub async fn call(&self, req: EndpointRequest) -> HandlerResult {
        Next {
            chain: &self.decorators,
            handler: self.handler.as_ref(),
        }
        .run(req)
        .await
    }
}
