// src/store/memory.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::quiz::{Answer, Question, Quiz, ScoringPolicy, Visibility};
use crate::models::submission::{
    LeaderboardEntry, NewQuestionAttempt, QuestionAttempt, Submission,
};
use crate::models::user::User;
use crate::store::QuizStore;

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    quizzes: HashMap<i64, Quiz>,
    questions: Vec<Question>,
    answers: Vec<Answer>,
    submissions: Vec<Submission>,
    attempts: Vec<QuestionAttempt>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store. Drives the test suite without a database and documents
/// the reference semantics of the `QuizStore` contract.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
    score_writes: AtomicUsize,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of score point-updates performed. The aggregator must skip the
    /// write when the recomputed total matches the stored one; tests assert
    /// on this counter.
    pub fn score_writes(&self) -> usize {
        self.score_writes.load(Ordering::SeqCst)
    }

    // Fixture helpers.

    pub fn seed_user(&self, username: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                created_at: Some(Utc::now()),
            },
        );
        id
    }

    /// Seeds a published, public quiz.
    pub fn seed_quiz(
        &self,
        creator_id: i64,
        scoring_policy: ScoringPolicy,
        allow_multiple_attempts: bool,
        max_attempts: Option<i32>,
    ) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.quizzes.insert(
            id,
            Quiz {
                id,
                title: format!("Quiz {id}"),
                description: String::new(),
                creator_id,
                is_published: true,
                visibility: Visibility::Public,
                allow_multiple_attempts,
                max_attempts,
                scoring_policy,
                created_at: Some(Utc::now()),
            },
        );
        id
    }

    pub fn seed_question(&self, quiz_id: i64, text: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.questions.push(Question {
            id,
            quiz_id,
            text: text.to_string(),
        });
        id
    }

    pub fn seed_answer(&self, question_id: i64, text: &str, is_correct: bool) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.answers.push(Answer {
            id,
            question_id,
            text: text.to_string(),
            is_correct,
        });
        id
    }

    /// Seeds a submission row directly, bypassing the recording flow. Used by
    /// leaderboard tests that need fixed scores and completion times.
    pub fn seed_submission(
        &self,
        quiz_id: i64,
        user_id: i64,
        attempt_number: i32,
        score: i64,
        in_progress: bool,
        submitted_at: DateTime<Utc>,
    ) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.submissions.push(Submission {
            id,
            quiz_id,
            user_id,
            score,
            attempt_number,
            in_progress,
            submitted_at,
        });
        id
    }
}

#[async_trait]
impl QuizStore for MemStore {
    async fn quiz_by_id(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        Ok(self.lock().quizzes.get(&quiz_id).cloned())
    }

    async fn published_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let inner = self.lock();
        let mut quizzes: Vec<Quiz> = inner
            .quizzes
            .values()
            .filter(|q| q.is_published && q.visibility == Visibility::Public)
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quizzes)
    }

    async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        Ok(self
            .lock()
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn answers_for_question(&self, question_id: i64) -> Result<Vec<Answer>, AppError> {
        Ok(self
            .lock()
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn is_correct_answer(
        &self,
        question_id: i64,
        answer_id: i64,
    ) -> Result<bool, AppError> {
        Ok(self
            .lock()
            .answers
            .iter()
            .any(|a| a.id == answer_id && a.question_id == question_id && a.is_correct))
    }

    async fn submission_count(&self, quiz_id: i64, user_id: i64) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .submissions
            .iter()
            .filter(|s| s.quiz_id == quiz_id && s.user_id == user_id)
            .count() as i64)
    }

    async fn in_progress_submission(
        &self,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        Ok(self
            .lock()
            .submissions
            .iter()
            .filter(|s| s.quiz_id == quiz_id && s.user_id == user_id && s.in_progress)
            .max_by_key(|s| s.attempt_number)
            .cloned())
    }

    async fn get_or_create_submission(
        &self,
        quiz_id: i64,
        user_id: i64,
        attempt_number: i32,
    ) -> Result<(Submission, bool), AppError> {
        let mut inner = self.lock();
        if let Some(existing) = inner.submissions.iter().find(|s| {
            s.quiz_id == quiz_id && s.user_id == user_id && s.attempt_number == attempt_number
        }) {
            return Ok((existing.clone(), false));
        }

        let id = inner.next_id();
        let submission = Submission {
            id,
            quiz_id,
            user_id,
            score: 0,
            attempt_number,
            in_progress: true,
            submitted_at: Utc::now(),
        };
        inner.submissions.push(submission.clone());
        Ok((submission, true))
    }

    async fn submission_by_id(
        &self,
        submission_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        Ok(self
            .lock()
            .submissions
            .iter()
            .find(|s| s.id == submission_id)
            .cloned())
    }

    async fn submissions_for_user(&self, user_id: i64) -> Result<Vec<Submission>, AppError> {
        let inner = self.lock();
        let mut submissions: Vec<Submission> = inner
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(submissions)
    }

    async fn insert_question_attempt(
        &self,
        attempt: NewQuestionAttempt,
    ) -> Result<QuestionAttempt, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let attempt = QuestionAttempt {
            id,
            submission_id: attempt.submission_id,
            question_id: attempt.question_id,
            selected_answer_id: attempt.selected_answer_id,
            is_correct: attempt.is_correct,
            attempt_number: attempt.attempt_number,
            attempted_at: Utc::now(),
        };
        inner.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn attempts_for_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<QuestionAttempt>, AppError> {
        let inner = self.lock();
        let mut attempts: Vec<QuestionAttempt> = inner
            .attempts
            .iter()
            .filter(|a| a.submission_id == submission_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| (a.question_id, a.attempt_number, a.attempted_at, a.id));
        Ok(attempts)
    }

    async fn question_attempt_count(
        &self,
        submission_id: i64,
        question_id: i64,
    ) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .attempts
            .iter()
            .filter(|a| a.submission_id == submission_id && a.question_id == question_id)
            .count() as i64)
    }

    async fn update_score(&self, submission_id: i64, score: i64) -> Result<(), AppError> {
        let mut inner = self.lock();
        if let Some(submission) = inner.submissions.iter_mut().find(|s| s.id == submission_id)
        {
            submission.score = score;
            self.score_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn complete_submission(&self, submission_id: i64) -> Result<(), AppError> {
        let mut inner = self.lock();
        if let Some(submission) = inner.submissions.iter_mut().find(|s| s.id == submission_id)
        {
            submission.in_progress = false;
        }
        Ok(())
    }

    async fn completed_submissions(
        &self,
        quiz_id: i64,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let inner = self.lock();
        let mut completed: Vec<&Submission> = inner
            .submissions
            .iter()
            .filter(|s| s.quiz_id == quiz_id && !s.in_progress)
            .collect();
        completed.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        });

        Ok(completed
            .into_iter()
            .take(limit as usize)
            .map(|s| LeaderboardEntry {
                username: inner
                    .users
                    .get(&s.user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_else(|| format!("user{}", s.user_id)),
                score: s.score,
                attempt_number: s.attempt_number,
                submitted_at: s.submitted_at,
            })
            .collect())
    }
}
