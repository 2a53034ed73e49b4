pub mod config;
pub mod database;
pub mod errors;
pub mod libs;
pub mod pages;
pub mod response;

use std::sync::Arc;

use axum::Router;

pub use config::Config;
use database::Store;
pub use response::Response;

pub type ResponseResult = Result<Response, Response>;

/// Shared by every handler through `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// All routes, bound to `state`. Layers are added by the binary.
pub fn app_router(state: AppState) -> Router {
    pages::pages_router().with_state(state)
}
