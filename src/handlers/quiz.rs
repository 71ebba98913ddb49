// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::quiz::{AnswerOption, QuestionDetail, QuizDetail, Visibility},
    state::AppState,
};

/// Lists published, public quizzes, newest first.
pub async fn list_quizzes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quizzes = state.store.published_quizzes().await?;
    Ok(Json(quizzes))
}

/// Quiz detail with questions and answer options. Answer keys are never
/// serialized. Drafts and private quizzes are hidden on this public route.
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .store
        .quiz_by_id(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    if !quiz.is_published || quiz.visibility != Visibility::Public {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let questions = state.store.questions_for_quiz(quiz_id).await?;
    let mut details = Vec::with_capacity(questions.len());
    for question in questions {
        let answers = state.store.answers_for_question(question.id).await?;
        details.push(QuestionDetail {
            id: question.id,
            text: question.text,
            answers: answers.into_iter().map(AnswerOption::from).collect(),
        });
    }

    Ok(Json(QuizDetail {
        quiz,
        questions: details,
    }))
}

/// Cached top-10 leaderboard, the same snapshot the WebSocket pushes.
pub async fn leaderboard(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.leaderboard.top(quiz_id).await?;
    Ok(Json(entries))
}

/// Uncached top-100 view for the detail page.
pub async fn full_leaderboard(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.leaderboard.full(quiz_id).await?;
    Ok(Json(entries))
}
