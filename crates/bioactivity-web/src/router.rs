//! Axum router — maps all URL paths to handlers.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    page::index,
    predict::predict,
    download::download_csv,
};
use crate::sse::sse_handler;

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let static_dir = resolve_static_dir(&state.config.server.static_dir);
    let max_upload = state.config.server.max_upload_bytes;
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Page
        .route("/",               get(index))
        .route("/predict",        post(predict))
        .route("/prediction.csv", get(download_csv))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Assets shipped with this crate, used when the configured dir is absent.
const BUNDLED_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

fn resolve_static_dir(configured: &str) -> PathBuf {
    let configured = Path::new(configured);
    if configured.is_dir() {
        return configured.to_path_buf();
    }
    warn!("Static dir {:?} not found, serving bundled assets from {}", configured, BUNDLED_STATIC_DIR);
    PathBuf::from(BUNDLED_STATIC_DIR)
}
