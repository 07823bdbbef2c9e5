//! Prediction run — upload handling and pipeline execution.

use axum::{
    extract::{multipart::Multipart, State},
    http::StatusCode,
    response::Response,
};
use tracing::{info, warn};

use crate::handlers::page::render_page;
use crate::handlers::view::{ErrorView, ReportView};
use crate::state::{AppEvent, SharedState};

const UPLOAD_FIELD: &str = "file";
const ACCEPTED_EXTENSION: &str = ".txt";

pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub async fn predict(State(state): State<SharedState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(message) => {
            warn!("Rejected upload: {}", message);
            let view = ReportView::error(ErrorView::new("Upload rejected", message));
            return render_page(&state, StatusCode::BAD_REQUEST, None, Some(view));
        }
    };

    info!("Prediction requested for {} ({} bytes)", upload.file_name, upload.bytes.len());

    // Serialize runs: the molecule and descriptor files are shared.
    let _running = state.run_lock.lock().await;

    let events = state.clone();
    let report = state
        .pipeline
        .run(&upload.bytes, move |stage| {
            events.publish(AppEvent::PipelineStatus { message: stage.message(), stage });
        })
        .await;

    let success = report.is_success();
    state.publish(AppEvent::RunFinished {
        success,
        message: match &report.error {
            Some(e) => e.to_string(),
            None => "Prediction complete".to_string(),
        },
    });

    let view = ReportView::from_report(&report);
    if let Some(predictions) = report.predictions {
        *state.last_prediction.write().await = Some(predictions);
    }

    let status = match &report.error {
        Some(e) if e.is_user_error() => StatusCode::UNPROCESSABLE_ENTITY,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
        None => StatusCode::OK,
    };
    render_page(&state, status, None, Some(view))
}

/// Pull the `.txt` molecule file out of the form.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("could not read upload: {}", e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.to_ascii_lowercase().ends_with(ACCEPTED_EXTENSION) {
            return Err(format!("only {} files are accepted, got '{}'", ACCEPTED_EXTENSION, file_name));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("could not read upload: {}", e.body_text()))?;
        return Ok(Upload { file_name, bytes: bytes.to_vec() });
    }

    Err("Upload input data in the sidebar to start!".to_string())
}
