//! Example consumer: a separate Rust project that declares a `todo` entity in
//! code, wraps its list endpoint with a decorator and serves it from memory.
//!
//! Run from repo root: `cargo run -p example-consumer`

use axum::http::StatusCode;
use entity_rest::{
    app_router, EndpointOptions, EngineConfig, EngineContext, EntityDescriptor, ErrorMapper, FieldDescriptor,
    FieldType, FnDecorator, MemoryStore, Reply, RouteRegistrar, Serializer, Verb,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("entity_rest=info")),
        )
        .init();

    let todo = Arc::new(
        EntityDescriptor::builder("todo")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
            .field(
                FieldDescriptor::new("title", FieldType::String)
                    .not_null()
                    .on_write(|v| match v {
                        Value::String(s) => Value::String(s.trim().to_string()),
                        other => other,
                    }),
            )
            .field(FieldDescriptor::new("description", FieldType::String).on_read(|v| {
                if v.is_null() {
                    Value::String(String::new())
                } else {
                    v
                }
            }))
            .field(FieldDescriptor::new("done", FieldType::Boolean))
            .primary_key(["id"])
            .build()?,
    );

    let ctx = EngineContext::new(Arc::new(MemoryStore::new()), EngineConfig::from_env()?);
    let mut registrar = RouteRegistrar::new(ctx);

    // Marks large pages as non-authoritative.
    let page_marker = FnDecorator::shared("page_marker", |req, next| {
        Box::pin(async move {
            match next.run(req).await {
                Ok(reply) if reply.collection_len().map_or(false, |n| n > 10) => Ok(Reply {
                    status: StatusCode::NON_AUTHORITATIVE_INFORMATION,
                    ..reply
                }),
                other => other,
            }
        })
    });
    registrar.add_api(
        todo.clone(),
        Verb::List,
        EndpointOptions::new()
            .decorator_arc(page_marker)
            .serializer(Serializer::custom(|r| json!({ "id": r.get("id"), "title": r.get("title") }))),
    )?;
    registrar.add_all(
        todo,
        &[Verb::Get, Verb::Create, Verb::Replace, Verb::Patch, Verb::Delete],
        EndpointOptions::new().error_mapper(ErrorMapper::distinct_not_found()),
    )?;

    let app = app_router(&registrar);
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
