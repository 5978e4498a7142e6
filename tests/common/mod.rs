#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use entity_rest::{
    app_router, EngineConfig, EngineContext, EntityDescriptor, FieldDescriptor, FieldType, MemoryStore,
    RouteRegistrar,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// `todo(id autoincrement, title not null, description, status)`, unique (title, description).
pub fn todo_entity() -> Arc<EntityDescriptor> {
    Arc::new(
        EntityDescriptor::builder("todo")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
            .field(FieldDescriptor::new("title", FieldType::String).not_null())
            .field(FieldDescriptor::new("description", FieldType::String))
            .field(FieldDescriptor::new("status", FieldType::String))
            .primary_key(["id"])
            .unique(["title", "description"])
            .build()
            .unwrap(),
    )
}

pub fn registrar() -> RouteRegistrar {
    registrar_with(EngineConfig::default())
}

pub fn registrar_with(config: EngineConfig) -> RouteRegistrar {
    RouteRegistrar::new(EngineContext::new(Arc::new(MemoryStore::new()), config))
}

pub fn app(registrar: &RouteRegistrar) -> Router {
    app_router(registrar)
}

/// Percent-encodes the characters the filter and orderby syntax uses.
pub fn enc(s: &str) -> String {
    let mut out = String::new();
    for c in s.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '=' => out.push_str("%3D"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '!' => out.push_str("%21"),
            '\'' => out.push_str("%27"),
            '&' => out.push_str("%26"),
            '+' => out.push_str("%2B"),
            ',' => out.push_str("%2C"),
            other => out.push(other),
        }
    }
    out
}

async fn read(resp: axum::response::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    read(app.clone().oneshot(req).await.unwrap()).await
}

pub async fn send_with_header(
    app: &Router,
    method: &str,
    uri: &str,
    name: &str,
    value: &str,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap();
    read(app.clone().oneshot(req).await.unwrap()).await
}

/// Sends `body` verbatim, optionally with an `x-api-key` header.
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    content_type: &str,
    body: &str,
    api_key: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    read(app.clone().oneshot(req).await.unwrap()).await
}

pub async fn send_form(app: &Router, method: &str, uri: &str, form: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    read(app.clone().oneshot(req).await.unwrap()).await
}

pub fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}
