// src/services/quota.rs

use crate::error::AppError;
use crate::store::QuizStore;

/// Sentinel for "no cap configured".
pub const UNLIMITED_ATTEMPTS: i64 = 999_999;

/// Remaining attempt sessions for a user on a quiz.
///
/// Counts every submission row regardless of `in_progress`: a session that
/// was started consumes quota even if abandoned mid-way, which closes the
/// quota-reset loophole of repeatedly abandoning attempts.
pub async fn remaining_attempts(
    store: &dyn QuizStore,
    user_id: i64,
    quiz_id: i64,
) -> Result<i64, AppError> {
    let quiz = store
        .quiz_by_id(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    let attempts_made = store.submission_count(quiz_id, user_id).await?;

    if !quiz.allow_multiple_attempts {
        return Ok(if attempts_made > 0 { 0 } else { 1 });
    }

    if let Some(max_attempts) = quiz.max_attempts {
        return Ok((i64::from(max_attempts) - attempts_made).max(0));
    }

    Ok(UNLIMITED_ATTEMPTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::ScoringPolicy;
    use crate::store::MemStore;
    use chrono::Utc;

    #[tokio::test]
    async fn single_attempt_quiz_allows_exactly_one() {
        let store = MemStore::new();
        let owner = store.seed_user("owner");
        let user = store.seed_user("u");
        let quiz = store.seed_quiz(owner, ScoringPolicy::Best, false, None);

        assert_eq!(remaining_attempts(&store, user, quiz).await.unwrap(), 1);
        store.seed_submission(quiz, user, 1, 0, false, Utc::now());
        assert_eq!(remaining_attempts(&store, user, quiz).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn capped_quiz_counts_down_to_zero() {
        let store = MemStore::new();
        let owner = store.seed_user("owner");
        let user = store.seed_user("u");
        let quiz = store.seed_quiz(owner, ScoringPolicy::Best, true, Some(2));

        assert_eq!(remaining_attempts(&store, user, quiz).await.unwrap(), 2);
        store.seed_submission(quiz, user, 1, 0, false, Utc::now());
        assert_eq!(remaining_attempts(&store, user, quiz).await.unwrap(), 1);
        store.seed_submission(quiz, user, 2, 0, false, Utc::now());
        assert_eq!(remaining_attempts(&store, user, quiz).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn uncapped_multi_attempt_quiz_is_unlimited() {
        let store = MemStore::new();
        let owner = store.seed_user("owner");
        let user = store.seed_user("u");
        let quiz = store.seed_quiz(owner, ScoringPolicy::Best, true, None);

        assert_eq!(
            remaining_attempts(&store, user, quiz).await.unwrap(),
            UNLIMITED_ATTEMPTS
        );
    }

    #[tokio::test]
    async fn abandoned_sessions_still_consume_quota() {
        let store = MemStore::new();
        let owner = store.seed_user("owner");
        let user = store.seed_user("u");
        let quiz = store.seed_quiz(owner, ScoringPolicy::Best, true, Some(2));

        // Started but never completed.
        store.seed_submission(quiz, user, 1, 0, true, Utc::now());
        assert_eq!(remaining_attempts(&store, user, quiz).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn quota_is_per_user() {
        let store = MemStore::new();
        let owner = store.seed_user("owner");
        let user = store.seed_user("u");
        let other = store.seed_user("other");
        let quiz = store.seed_quiz(owner, ScoringPolicy::Best, false, None);

        store.seed_submission(quiz, other, 1, 0, false, Utc::now());
        assert_eq!(remaining_attempts(&store, user, quiz).await.unwrap(), 1);
    }
}
