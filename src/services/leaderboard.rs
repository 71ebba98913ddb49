// src/services/leaderboard.rs

use std::sync::Arc;

use crate::cache::LeaderboardCache;
use crate::error::AppError;
use crate::models::submission::LeaderboardEntry;
use crate::realtime::broadcast::LeaderboardBroadcaster;
use crate::store::QuizStore;

/// Entries in the cached live view.
pub const LIVE_LIMIT: i64 = 10;

/// Entries in the uncached detail view.
pub const FULL_LIMIT: i64 = 100;

/// Cached, push-capable view over completed submissions.
///
/// Only completed (`in_progress = false`) submissions appear, ranked score
/// descending with earlier completion winning ties.
#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<dyn QuizStore>,
    cache: Arc<LeaderboardCache>,
    broadcaster: Arc<LeaderboardBroadcaster>,
}

impl Leaderboard {
    pub fn new(
        store: Arc<dyn QuizStore>,
        cache: Arc<LeaderboardCache>,
        broadcaster: Arc<LeaderboardBroadcaster>,
    ) -> Self {
        Self {
            store,
            cache,
            broadcaster,
        }
    }

    /// Top 10, served from cache when fresh.
    pub async fn top(&self, quiz_id: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        if let Some(entries) = self.cache.get(quiz_id) {
            return Ok(entries);
        }
        let entries = self.store.completed_submissions(quiz_id, LIVE_LIMIT).await?;
        self.cache.set(quiz_id, entries.clone());
        Ok(entries)
    }

    /// Top 100 for the detail page. Deliberately uncached; it does not share
    /// the live view's cache entry.
    pub async fn full(&self, quiz_id: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        self.store.completed_submissions(quiz_id, FULL_LIMIT).await
    }

    /// Evicts the cached snapshot. Called once per ledger write, after the
    /// aggregator has persisted the new total.
    pub fn invalidate(&self, quiz_id: i64) {
        self.cache.delete(quiz_id);
    }

    /// Recomputes the snapshot (repopulating the cache) and hands it to the
    /// fan-out transport. Best effort: every failure is logged and swallowed,
    /// so the scoring write path never depends on this succeeding.
    pub async fn publish(&self, quiz_id: i64) {
        let entries = match self.top(quiz_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(quiz_id, error = %e, "leaderboard publish skipped");
                return;
            }
        };
        self.broadcaster.publish(quiz_id, entries);
    }

    /// Fire-and-forget publish, dispatched after persistence so the caller's
    /// response does not wait on fan-out. Not retried.
    pub fn publish_in_background(&self, quiz_id: i64) {
        let this = self.clone();
        tokio::spawn(async move {
            this.publish(quiz_id).await;
        });
    }
}
