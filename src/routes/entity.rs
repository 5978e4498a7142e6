//! Entity CRUD routes built from the registered endpoint table.
//! Endpoints sharing a path share one route; path variables reach the handler in route order.

use crate::error::AppError;
use crate::handlers::entity::dispatch;
use crate::routes::{RegisteredEndpoint, RouteRegistrar, Verb};
use axum::{
    extract::{rejection::PathRejection, DefaultBodyLimit, Path, Request},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

fn method_filter(verb: Verb) -> MethodFilter {
    match verb {
        Verb::List | Verb::Get => MethodFilter::GET,
        Verb::Create => MethodFilter::POST,
        Verb::Replace => MethodFilter::PUT,
        Verb::Patch => MethodFilter::PATCH,
        Verb::Delete => MethodFilter::DELETE,
    }
}

fn method_route(endpoint: Arc<RegisteredEndpoint>) -> MethodRouter {
    let filter = method_filter(endpoint.verb);
    if endpoint.verb.is_single_record() {
        on(
            filter,
            move |params: Result<Path<Vec<(String, String)>>, PathRejection>, req: Request| {
                let endpoint = endpoint.clone();
                let params = params
                    .map(|Path(p)| p)
                    .map_err(|e| AppError::BadRequest(e.body_text()));
                async move { dispatch(endpoint, params, req).await }
            },
        )
    } else {
        on(filter, move |req: Request| {
            let endpoint = endpoint.clone();
            async move { dispatch(endpoint, Ok(Vec::new()), req).await }
        })
    }
}

/// One route per distinct path, unprefixed.
pub fn entity_routes(registrar: &RouteRegistrar) -> Router {
    let mut by_path: BTreeMap<String, MethodRouter> = BTreeMap::new();
    for endpoint in registrar.endpoints() {
        let path = endpoint.path.to_axum();
        let route = method_route(endpoint.clone());
        let merged = match by_path.remove(&path) {
            Some(existing) => existing.merge(route),
            None => route,
        };
        by_path.insert(path, merged);
    }
    by_path
        .into_iter()
        .fold(Router::new(), |router, (path, route)| router.route(&path, route))
}

/// Entity routes nested under the configured base path, with the body size limit applied.
pub fn api_router(registrar: &RouteRegistrar) -> Router {
    let config = registrar.context().config.clone();
    let routes = entity_routes(registrar);
    let base = config.base_path.trim_matches('/');
    let router = if base.is_empty() {
        routes
    } else {
        Router::new().nest(&format!("/{}", base), routes)
    };
    router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
}
