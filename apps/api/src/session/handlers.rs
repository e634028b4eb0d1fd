//! Axum route handlers for the Session API.
//!
//! Action failures (search, scoring, resume read) are part of the returned
//! snapshot, not HTTP errors. `AppError` is only for requests that never
//! reach a session.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::ResumeUpload;
use crate::session::{SearchSession, SessionSnapshot};
use crate::state::AppState;

/// Multipart field carrying the resume file.
const RESUME_FIELD: &str = "resume";

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub location: String,
}

fn find_session(state: &AppState, id: Uuid) -> Result<Arc<SearchSession>, AppError> {
    state.sessions.get(id).ok_or(AppError::SessionNotFound(id))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let session = state.sessions.create();
    (StatusCode::CREATED, Json(session.snapshot()))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(find_session(&state, id)?.snapshot()))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound(id))
    }
}

/// POST /api/v1/sessions/:id/search
///
/// Replaces the session's results with page 0 of a new search. Blank query
/// and location together leave the session untouched.
pub async fn handle_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id)?;
    Ok(Json(session.search(&request.query, &request.location).await))
}

/// POST /api/v1/sessions/:id/resume
///
/// Multipart upload; the file goes in the `resume` field.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await?;

        let upload = ResumeUpload {
            file_name,
            content_type,
            bytes,
        };
        return Ok(Json(session.upload_resume(upload).await));
    }

    Err(AppError::Validation(format!(
        "multipart field '{RESUME_FIELD}' is required"
    )))
}

/// POST /api/v1/sessions/:id/load-more
pub async fn handle_load_more(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id)?;
    Ok(Json(session.load_more().await))
}
