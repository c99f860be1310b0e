//! Axum route handlers for the screening API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;

use crate::errors::AppError;
use crate::extraction::{MEDIA_TYPE_DOCX, MEDIA_TYPE_PDF, MEDIA_TYPE_TEXT};
use crate::models::candidate::{Candidate, PipelineProgress, UploadedDocument};
use crate::screening::pipeline;
use crate::state::AppState;

/// Per-file upload cap.
const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RunStartedResponse {
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    /// Always sorted: descending score, upload order on ties.
    pub candidates: Vec<Candidate>,
    /// Present only while a run is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<PipelineProgress>,
    /// Run-level failure from the most recent run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutreachResponse {
    pub email: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screening/run
///
/// Multipart form: `job_description` text field plus repeated `resumes` file
/// fields. Starts the batch pipeline in the background and returns 202 with
/// the document count; results stream into GET /candidates batch by batch.
pub async fn handle_start_run(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RunStartedResponse>), AppError> {
    let mut job_description = String::new();
    let mut documents: Vec<UploadedDocument> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart request: {e}")))?
    {
        match field.name().unwrap_or("") {
            "job_description" => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable job description: {e}")))?;
            }
            "resumes" => {
                let filename = field.file_name().unwrap_or("unknown").to_string();
                let declared_type = field.content_type().map(str::to_string);
                let content: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable upload '{filename}': {e}")))?;

                if content.len() > MAX_FILE_BYTES {
                    return Err(AppError::Validation(format!(
                        "'{filename}' exceeds the 10MB upload limit"
                    )));
                }

                let media_type = resolve_media_type(declared_type, &filename);
                documents.push(UploadedDocument {
                    filename,
                    content,
                    media_type,
                });
            }
            _ => {
                // Drain unknown fields so the stream stays consistent.
                let _ = field.bytes().await;
            }
        }
    }

    let total = pipeline::start_run(
        state.store.clone(),
        state.analyzer.clone(),
        job_description,
        documents,
    )?;

    Ok((StatusCode::ACCEPTED, Json(RunStartedResponse { total })))
}

/// GET /api/v1/screening/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Json<CandidateListResponse> {
    let (candidates, progress, run_error) = state.store.snapshot();
    Json(CandidateListResponse {
        candidates,
        progress,
        run_error,
    })
}

/// POST /api/v1/screening/candidates/:id/outreach
///
/// Drafts an outreach email for one candidate on demand. Not part of the
/// batch pipeline: a drafting failure surfaces directly, with no fallback
/// record.
pub async fn handle_draft_outreach(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OutreachResponse>, AppError> {
    let (candidate, job_description) = state.store.draft_context(&id)?;
    let email = state
        .analyzer
        .draft_outreach(&candidate, &job_description)
        .await?;
    Ok(Json(OutreachResponse { email }))
}

/// POST /api/v1/screening/candidates/:id/contacted
///
/// Confirms the outreach email was sent: `New → Contacted`.
pub async fn handle_mark_contacted(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Candidate>, AppError> {
    let candidate = state.store.mark_contacted(&id)?;
    Ok(Json(candidate))
}

/// POST /api/v1/screening/reset
///
/// Full pipeline reset — drops all candidates. Rejected while a run is active.
pub async fn handle_reset(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.reset()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Media type for a part: the declared content type when the client sent a
/// meaningful one, otherwise mapped from the file extension. Unknown types
/// pass through and fail per-file in the extractor with a descriptive error.
fn resolve_media_type(declared: Option<String>, filename: &str) -> String {
    if let Some(declared) = declared {
        if declared != "application/octet-stream" {
            return declared;
        }
    }
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "txt" => MEDIA_TYPE_TEXT.to_string(),
        "pdf" => MEDIA_TYPE_PDF.to_string(),
        "docx" => MEDIA_TYPE_DOCX.to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_media_type_prefers_declared() {
        assert_eq!(
            resolve_media_type(Some("application/pdf".to_string()), "cv.bin"),
            MEDIA_TYPE_PDF
        );
    }

    #[test]
    fn test_resolve_media_type_falls_back_to_extension() {
        assert_eq!(
            resolve_media_type(Some("application/octet-stream".to_string()), "cv.DOCX"),
            MEDIA_TYPE_DOCX
        );
        assert_eq!(resolve_media_type(None, "cv.txt"), MEDIA_TYPE_TEXT);
    }

    #[test]
    fn test_resolve_media_type_unknown_passes_through() {
        assert_eq!(
            resolve_media_type(None, "photo.heic"),
            "application/octet-stream"
        );
    }
}
