//! Landing page — upload form plus the state of the working directory.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::context;
use tracing::error;

use crate::handlers::view::{ExistingDescriptors, ReportView};
use crate::state::{AppState, SharedState};

pub async fn index(State(state): State<SharedState>) -> Response {
    let output = state.pipeline.output_path();
    let existing = match tokio::task::spawn_blocking(move || ExistingDescriptors::probe(&output)).await {
        Ok(existing) => Some(existing),
        Err(e) => {
            error!("Descriptor probe task failed: {}", e);
            None
        }
    };
    render_page(&state, StatusCode::OK, existing, None)
}

/// Render the single page; every handler that returns HTML goes through here.
pub fn render_page(
    state: &AppState,
    status: StatusCode,
    existing: Option<ExistingDescriptors>,
    report: Option<ReportView>,
) -> Response {
    let ctx = context! {
        target       => state.config.model.target,
        value_column => state.config.model.value_column,
        existing     => existing,
        report       => report,
    };

    match state.templates.render("index.html", ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Template rendering failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "template rendering failed").into_response()
        }
    }
}
