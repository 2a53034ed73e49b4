use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::Method};
use erp_rust::{
    app_router,
    config::StoreKind,
    database::{MemoryStore, MysqlStore, Store},
    errors::Result,
    AppState, Config,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if let Err(e) = run().await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::read()?;
    let store: Arc<dyn Store> = match config.store() {
        StoreKind::Mysql => Arc::new(MysqlStore::new(config.mysql_addr())?),
        StoreKind::Memory => {
            info!("Using the in-memory store with demo data");
            Arc::new(MemoryStore::seeded())
        }
    };
    let port = config.port();
    let body_limit = config.body_limit();
    let router = app_router(AppState::new(store, config))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(body_limit));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Listening on 0.0.0.0:{port}");
    axum::serve(listener, router).await?;
    Ok(())
}
