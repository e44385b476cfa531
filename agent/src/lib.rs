//! etcd backup agent
//!
//! A thin JSON HTTP surface over the engine: explore an endpoint, back it
//! up into the work directory, restore a backup from it.

pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use engine::Config;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

pub fn create_router(config: Arc<Config>) -> Router {
    let state = Arc::new(AppState { config });

    Router::new()
        .route("/v1/version", get(handlers::get_version))
        .route("/v1/explorer", post(handlers::explore_endpoint))
        .route("/v1/backup", post(handlers::create_backup))
        .route("/v1/restore", post(handlers::restore_backup))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
