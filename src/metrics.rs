// src/metrics.rs

/// Counter sink for the scoring write path.
///
/// Injected through `AppState` rather than registered globally, so tests can
/// observe the write path in isolation. Implementations must be cheap and
/// infallible; the write path never blocks on them.
pub trait MetricsSink: Send + Sync {
    fn submission_created(&self, quiz_id: i64);

    fn question_attempt_recorded(&self, question_id: i64, correct: bool);

    fn score_recomputed(&self, submission_id: i64, score: i64);
}

/// Default sink: structured log events, picked up by whatever subscriber the
/// binary installed.
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn submission_created(&self, quiz_id: i64) {
        tracing::debug!(quiz_id, counter = "submissions_created", "metric");
    }

    fn question_attempt_recorded(&self, question_id: i64, correct: bool) {
        tracing::debug!(question_id, correct, counter = "question_attempts", "metric");
    }

    fn score_recomputed(&self, submission_id: i64, score: i64) {
        tracing::debug!(submission_id, score, counter = "scores_recomputed", "metric");
    }
}
