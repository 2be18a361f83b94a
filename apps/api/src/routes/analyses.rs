//! Handlers for the analysis pipeline and the record read path.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::pipeline::AnalysisPipeline;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisRecord, AnalysisRequest};
use crate::records::LoadOutcome;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub id: Uuid,
    pub status: String,
}

/// POST /api/v1/analyses
///
/// Multipart form: `company-name`, `job-title`, `job-description`, `resume`.
/// Drives the full pipeline and returns the new record id.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request = read_analysis_form(multipart).await?;

    let pipeline = AnalysisPipeline::new(state.services.clone());
    let status = pipeline.subscribe();
    let id = pipeline.run(request).await?;

    let status_message = status.borrow().message();
    Ok(Json(AnalyzeResponse {
        id,
        status: status_message,
    }))
}

async fn read_analysis_form(mut multipart: Multipart) -> Result<AnalysisRequest, AppError> {
    let mut company_name = String::new();
    let mut job_title = String::new();
    let mut job_description = String::new();
    let mut file_name = String::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("company-name") => company_name = field.text().await.map_err(bad_field)?,
            Some("job-title") => job_title = field.text().await.map_err(bad_field)?,
            Some("job-description") => job_description = field.text().await.map_err(bad_field)?,
            Some("resume") => {
                file_name = field
                    .file_name()
                    .unwrap_or("resume.pdf")
                    .to_string();
                file = Some(field.bytes().await.map_err(bad_field)?);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("a resume file is required".to_string()))?;

    Ok(AnalysisRequest {
        company_name,
        job_title,
        job_description,
        file_name,
        file,
    })
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("unreadable form field: {e}"))
}

/// GET /api/v1/analyses
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalysisRecord>>, AppError> {
    Ok(Json(state.records.list().await?))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisRecord>, AppError> {
    match state.records.load(id).await? {
        LoadOutcome::Found(view) => Ok(Json(view.record)),
        LoadOutcome::NotFound => Err(AppError::NotFound(format!("no analysis stored for {id}"))),
        LoadOutcome::Corrupt { reason } => Err(AppError::CorruptRecord(reason)),
    }
}

/// GET /api/v1/analyses/:id/image
///
/// Serves the rendered first-page image. The image handle lives only for
/// the duration of this handler; building the response releases it.
pub async fn handle_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    match state.records.load(id).await? {
        LoadOutcome::Found(view) => {
            let body = view.image.bytes().clone();
            Ok(([(header::CONTENT_TYPE, "image/png")], body).into_response())
        }
        LoadOutcome::NotFound => Err(AppError::NotFound(format!("no analysis stored for {id}"))),
        LoadOutcome::Corrupt { reason } => Err(AppError::CorruptRecord(reason)),
    }
}
