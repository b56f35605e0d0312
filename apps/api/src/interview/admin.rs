//! Staff-facing interview management.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::interview::token::generate_token;
use crate::models::interview::{InterviewRow, InterviewUpdate, NewInterview};
use crate::state::AppState;

#[derive(Serialize)]
pub struct TokenResponse {
    pub interview_id: i64,
    pub token: String,
}

fn interview_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Interview {id} not found"))
}

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    body: Result<Json<NewInterview>, JsonRejection>,
) -> Result<(StatusCode, Json<InterviewRow>), AppError> {
    let Json(req) = body?;
    if state.store.find_candidate(req.candidate_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Candidate {} not found",
            req.candidate_id
        )));
    }

    let interview = state.store.create_interview(&req, &generate_token()).await?;
    info!(
        interview_id = interview.id,
        candidate_id = interview.candidate_id,
        "Interview created"
    );
    Ok((StatusCode::CREATED, Json(interview)))
}

/// GET /api/v1/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
) -> Result<Json<Vec<InterviewRow>>, AppError> {
    Ok(Json(state.store.list_interviews().await?))
}

/// PUT /api/v1/interviews/:id
pub async fn handle_update_interview(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<InterviewUpdate>, JsonRejection>,
) -> Result<Json<InterviewRow>, AppError> {
    let Path(id) = path?;
    let Json(req) = body?;
    state
        .store
        .update_interview(id, &req)
        .await?
        .map(Json)
        .ok_or_else(|| interview_not_found(id))
}

/// POST /api/v1/interviews/:id/token
pub async fn handle_reissue_token(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Path(id) = path?;
    let token = generate_token();
    if !state.store.reissue_token(id, &token).await? {
        return Err(interview_not_found(id));
    }
    info!(interview_id = id, "Interview token reissued");
    Ok(Json(TokenResponse {
        interview_id: id,
        token,
    }))
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    if !state.store.delete_interview(id).await? {
        return Err(interview_not_found(id));
    }
    info!(interview_id = id, "Interview deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/interviews/:id/report
pub async fn handle_download_report(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = path?;
    if state.store.find_interview(id).await?.is_none() {
        return Err(interview_not_found(id));
    }
    let report = state
        .store
        .report_document(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report for interview {id} is not ready")))?;

    let content_type = HeaderValue::from_str(&report.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"interview_report_{id}.html\""
    ))
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.content,
    )
        .into_response())
}
