//! CSV download of the most recent prediction.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use bioactivity_molecules::prediction::DOWNLOAD_FILE_NAME;
use crate::state::SharedState;

pub async fn download_csv(State(state): State<SharedState>) -> Response {
    let guard = state.last_prediction.read().await;
    let Some(table) = guard.as_ref() else {
        return (StatusCode::NOT_FOUND, "No prediction has been made yet.").into_response();
    };

    match table.to_csv() {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME)),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            error!("Could not serialize predictions: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "could not serialize predictions").into_response()
        }
    }
}
