//! Route table construction and the axum routers built from it.

pub mod common;
pub mod entity;
pub mod registrar;

pub use common::{common_routes, common_routes_with_ready};
pub use entity::{api_router, entity_routes};
pub use registrar::{EndpointOptions, PathPattern, RegisteredEndpoint, RouteRegistrar, Verb};

use axum::Router;

/// Entity API under the base path plus the common routes.
pub fn app_router(registrar: &RouteRegistrar) -> Router {
    api_router(registrar).merge(common_routes_with_ready(registrar.context().clone()))
}
