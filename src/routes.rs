// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{quiz, submission},
    realtime::ws,
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public reads: quiz listing/detail and both leaderboard views.
/// * Authenticated: answer submission, quota, own submissions.
/// * WebSocket: live leaderboard per quiz.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/leaderboard", get(quiz::leaderboard))
        .route("/{id}/leaderboard/full", get(quiz::full_leaderboard))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/{id}/submissions", post(submission::submit_answers))
                .route(
                    "/{id}/attempts/remaining",
                    get(submission::remaining_attempts),
                )
                .layer(middleware::from_fn_with_state(
                    state.config.clone(),
                    auth_middleware,
                )),
        );

    let submission_routes = Router::new()
        .route("/", get(submission::list_my_submissions))
        .route("/{id}", get(submission::get_submission))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    let ws_routes = Router::new().route("/quizzes/{id}/leaderboard", get(ws::leaderboard_ws));

    Router::new()
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/submissions", submission_routes)
        .nest("/ws", ws_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
