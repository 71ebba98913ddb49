// tests/api_tests.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use quizlive::config::Config;
use quizlive::metrics::TracingMetrics;
use quizlive::models::quiz::ScoringPolicy;
use quizlive::models::submission::{LeaderboardEntry, Submission};
use quizlive::routes;
use quizlive::state::AppState;
use quizlive::store::MemStore;
use quizlive::utils::jwt::sign_jwt;

const TEST_SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    store: Arc<MemStore>,
    state: AppState,
}

/// Spawns the app on a random port against a fresh in-memory store.
async fn spawn_app() -> TestApp {
    let store = Arc::new(MemStore::new());

    let config = Config {
        database_url: "postgres://unused-in-tests".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        rust_log: "error".to_string(),
    };

    let state = AppState::new(store.clone(), Arc::new(TracingMetrics), config);
    let app = routes::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        state,
    }
}

fn bearer(user_id: i64) -> String {
    format!(
        "Bearer {}",
        sign_jwt(user_id, TEST_SECRET, 600).expect("Failed to sign test token")
    )
}

fn answers_body(question_id: i64, answer_id: Option<i64>, complete: bool) -> serde_json::Value {
    serde_json::json!({
        "answers": { (question_id.to_string()): answer_id },
        "complete": complete,
    })
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn submitting_answers_requires_a_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/quizzes/1/submissions", app.address))
        .json(&answers_body(1, None, true))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn wrong_then_correct_resubmission_flow() {
    // Arrange: a published quiz with one question, `best` scoring.
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = app.store.seed_user("owner");
    let quiz = app.store.seed_quiz(owner, ScoringPolicy::Best, false, None);
    let question = app.store.seed_question(quiz, "2 + 2 = ?");
    let wrong = app.store.seed_answer(question, "3", false);
    let right = app.store.seed_answer(question, "4", true);
    let bob = app.store.seed_user("bob");
    let mut updates = app.state.broadcaster.subscribe(quiz);

    // Act 1: wrong answer, session kept open.
    let response = client
        .post(format!("{}/api/quizzes/{}/submissions", app.address, quiz))
        .header("Authorization", bearer(bob))
        .json(&answers_body(question, Some(wrong), false))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let submission: Submission = response.json().await.unwrap();
    assert_eq!(submission.score, 0);
    assert!(submission.in_progress);

    // Act 2: correct answer on the same session, completing it.
    let response = client
        .post(format!("{}/api/quizzes/{}/submissions", app.address, quiz))
        .header("Authorization", bearer(bob))
        .json(&answers_body(question, Some(right), true))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let completed: Submission = response.json().await.unwrap();
    assert_eq!(completed.id, submission.id);
    assert_eq!(completed.score, 1);
    assert!(!completed.in_progress);
    assert_eq!(completed.attempt_number, 1);

    // One leaderboard push per ledger write.
    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(1), updates.recv())
            .await
            .expect("expected a leaderboard push")
            .unwrap();
    }
    assert!(updates.try_recv().is_err());

    // The completed run is on the leaderboard.
    let response = client
        .get(format!("{}/api/quizzes/{}/leaderboard", app.address, quiz))
        .send()
        .await
        .expect("Failed to execute request");
    let entries: Vec<LeaderboardEntry> = response.json().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].username, "bob");
    assert_eq!(entries[0].score, 1);
}

#[tokio::test]
async fn quota_counts_down_and_then_conflicts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = app.store.seed_user("owner");
    let quiz = app.store.seed_quiz(owner, ScoringPolicy::Best, true, Some(2));
    let question = app.store.seed_question(quiz, "q");
    let answer = app.store.seed_answer(question, "a", true);
    let bob = app.store.seed_user("bob");

    for expected_remaining in [2i64, 1] {
        let response = client
            .get(format!(
                "{}/api/quizzes/{}/attempts/remaining",
                app.address, quiz
            ))
            .header("Authorization", bearer(bob))
            .send()
            .await
            .expect("Failed to execute request");
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["remaining"], expected_remaining);

        let response = client
            .post(format!("{}/api/quizzes/{}/submissions", app.address, quiz))
            .header("Authorization", bearer(bob))
            .json(&answers_body(question, Some(answer), true))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
    }

    // Quota exhausted: no new session may start.
    let response = client
        .post(format!("{}/api/quizzes/{}/submissions", app.address, quiz))
        .header("Authorization", bearer(bob))
        .json(&answers_body(question, Some(answer), true))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn leaderboard_orders_by_score_then_completion_time() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = app.store.seed_user("owner");
    let quiz = app.store.seed_quiz(owner, ScoringPolicy::Best, false, None);

    let t1 = Utc::now();
    let t2 = t1 + chrono::Duration::seconds(30);
    let early = app.store.seed_user("early");
    let late = app.store.seed_user("late");
    let third = app.store.seed_user("third");
    let racing = app.store.seed_user("racing");
    app.store.seed_submission(quiz, third, 1, 3, false, t1);
    app.store.seed_submission(quiz, late, 1, 5, false, t2);
    app.store.seed_submission(quiz, early, 1, 5, false, t1);
    // High score but still in progress: never shown.
    app.store.seed_submission(quiz, racing, 1, 50, true, t1);

    let response = client
        .get(format!("{}/api/quizzes/{}/leaderboard", app.address, quiz))
        .send()
        .await
        .expect("Failed to execute request");
    let entries: Vec<LeaderboardEntry> = response.json().await.unwrap();
    let order: Vec<&str> = entries.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(order, vec!["early", "late", "third"]);
}

#[tokio::test]
async fn submitting_to_an_unknown_quiz_is_not_found() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let bob = app.store.seed_user("bob");

    let response = client
        .post(format!("{}/api/quizzes/999999/submissions", app.address))
        .header("Authorization", bearer(bob))
        .json(&answers_body(1, None, true))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn submissions_are_visible_only_to_their_owner() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = app.store.seed_user("owner");
    let quiz = app.store.seed_quiz(owner, ScoringPolicy::Best, false, None);
    let question = app.store.seed_question(quiz, "q");
    let answer = app.store.seed_answer(question, "a", true);
    let bob = app.store.seed_user("bob");
    let eve = app.store.seed_user("eve");

    let response = client
        .post(format!("{}/api/quizzes/{}/submissions", app.address, quiz))
        .header("Authorization", bearer(bob))
        .json(&answers_body(question, Some(answer), true))
        .send()
        .await
        .expect("Failed to execute request");
    let submission: Submission = response.json().await.unwrap();

    let response = client
        .get(format!("{}/api/submissions/{}", app.address, submission.id))
        .header("Authorization", bearer(bob))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(format!("{}/api/submissions/{}", app.address, submission.id))
        .header("Authorization", bearer(eve))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .get(format!("{}/api/submissions", app.address))
        .header("Authorization", bearer(bob))
        .send()
        .await
        .expect("Failed to execute request");
    let mine: Vec<Submission> = response.json().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, submission.id);
}

#[tokio::test]
async fn quiz_detail_never_leaks_answer_keys() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = app.store.seed_user("owner");
    let quiz = app.store.seed_quiz(owner, ScoringPolicy::Best, false, None);
    let question = app.store.seed_question(quiz, "2 + 2 = ?");
    app.store.seed_answer(question, "3", false);
    app.store.seed_answer(question, "4", true);

    let response = client
        .get(format!("{}/api/quizzes/{}", app.address, quiz))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("\"answers\""));
    assert!(!body.contains("is_correct"));
}

#[tokio::test]
async fn empty_answer_batches_are_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = app.store.seed_user("owner");
    let quiz = app.store.seed_quiz(owner, ScoringPolicy::Best, false, None);
    let bob = app.store.seed_user("bob");

    let response = client
        .post(format!("{}/api/quizzes/{}/submissions", app.address, quiz))
        .header("Authorization", bearer(bob))
        .json(&serde_json::json!({ "answers": HashMap::<String, Option<i64>>::new() }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
}
