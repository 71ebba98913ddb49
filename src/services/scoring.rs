// src/services/scoring.rs

use std::collections::BTreeMap;

use crate::error::AppError;
use crate::models::submission::QuestionAttempt;
use crate::store::QuizStore;

/// Recomputes a submission's total score from the question-attempt ledger.
///
/// The quiz's policy is applied per question over that question's attempts in
/// canonical order, and the total is the sum across questions. The stored
/// score is written only when it differs, so re-invoking with an unchanged
/// ledger performs no write. A missing submission (or an empty ledger) scores
/// 0 rather than erroring: the ledger is the source of truth and the stored
/// score is just a projection of it.
pub async fn recompute_score(
    store: &dyn QuizStore,
    submission_id: i64,
) -> Result<i64, AppError> {
    let Some(submission) = store.submission_by_id(submission_id).await? else {
        return Ok(0);
    };
    let Some(quiz) = store.quiz_by_id(submission.quiz_id).await? else {
        return Ok(0);
    };

    let attempts = store.attempts_for_submission(submission_id).await?;

    let mut per_question: BTreeMap<i64, Vec<QuestionAttempt>> = BTreeMap::new();
    for attempt in attempts {
        per_question.entry(attempt.question_id).or_default().push(attempt);
    }

    let total: i64 = per_question
        .values()
        .map(|group| quiz.scoring_policy.compute(group))
        .sum();

    if submission.score != total {
        store.update_score(submission_id, total).await?;
    }

    Ok(total)
}
