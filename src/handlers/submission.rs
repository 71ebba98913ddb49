// src/handlers/submission.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::submission::SubmitAnswersRequest,
    state::AppState,
    utils::jwt::Claims,
};

/// Records a batch of answers for the authenticated user.
///
/// Order of checks: visibility gate, then quota (inside the service), then
/// the writes. Returns the submission with its freshly recomputed score.
pub async fn submit_answers(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claims.user_id()?;

    let quiz = state
        .store
        .quiz_by_id(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    if !state.gate.may_attempt(user_id, &quiz) {
        return Err(AppError::Forbidden(
            "You may not attempt this quiz".to_string(),
        ));
    }

    let submission = state
        .submissions
        .submit_answers(user_id, &quiz, &payload.answers, payload.complete)
        .await?;

    Ok((StatusCode::CREATED, Json(submission)))
}

/// Remaining attempt sessions for the authenticated user on a quiz.
pub async fn remaining_attempts(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let remaining = state.submissions.remaining(user_id, quiz_id).await?;

    Ok(Json(serde_json::json!({
        "quiz_id": quiz_id,
        "remaining": remaining,
    })))
}

/// The authenticated user's submissions, newest first.
pub async fn list_my_submissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let submissions = state.store.submissions_for_user(user_id).await?;
    Ok(Json(submissions))
}

/// A single submission, visible only to its owner.
pub async fn get_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let submission = state
        .store
        .submission_by_id(submission_id)
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    Ok(Json(submission))
}
