//! Example server: loads entities.json from CONFIG_PATH, picks PostgreSQL when
//! DATABASE_URL is set (creating missing tables) or the in-memory store otherwise,
//! and mounts the common and entity routes.

use entity_rest::{
    app_router, ensure_tables, load_from_path, resolve, EngineConfig, EngineContext, MemoryStore, PgStore,
    RecordStore, RouteRegistrar,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("entity_rest=info".parse()?))
        .init();

    let engine = EngineConfig::from_env()?;
    let config_source = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "sample".into());
    let model = resolve(&load_from_path(&config_source)?)?;

    let store: Arc<dyn RecordStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await?;
            let schema = std::env::var("DATABASE_SCHEMA").unwrap_or_else(|_| "public".into());
            ensure_tables(&pool, &schema, &model.descriptors()).await?;
            Arc::new(PgStore::with_schema(pool, schema))
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let mut registrar = RouteRegistrar::new(EngineContext::new(store, engine));
    registrar.register_resolved(&model)?;
    let app = app_router(&registrar).layer(TraceLayer::new_for_http());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
