// src/cache.rs

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::submission::LeaderboardEntry;

/// Cache time-to-live. Bounds staleness even if an invalidation is ever
/// missed; invalidation-on-write is the primary freshness mechanism.
pub const LEADERBOARD_TTL: Duration = Duration::from_secs(30);

fn cache_key(quiz_id: i64) -> String {
    format!("leaderboard:{quiz_id}")
}

struct CachedSnapshot {
    stored_at: Instant,
    entries: Vec<LeaderboardEntry>,
}

/// In-process key-value cache for leaderboard snapshots, keyed
/// `leaderboard:<quiz_id>` with a fixed TTL.
///
/// A poisoned lock degrades to cache misses: the ledger stays authoritative,
/// so cache failure is never allowed to fail a request.
pub struct LeaderboardCache {
    entries: Mutex<HashMap<String, CachedSnapshot>>,
    ttl: Duration,
}

impl LeaderboardCache {
    pub fn new() -> Self {
        Self::with_ttl(LEADERBOARD_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, quiz_id: i64) -> Option<Vec<LeaderboardEntry>> {
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };
        let key = cache_key(quiz_id);
        match entries.get(&key) {
            Some(snapshot) if snapshot.stored_at.elapsed() < self.ttl => {
                Some(snapshot.entries.clone())
            }
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, quiz_id: i64, snapshot: Vec<LeaderboardEntry>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.insert(
            cache_key(quiz_id),
            CachedSnapshot {
                stored_at: Instant::now(),
                entries: snapshot,
            },
        );
    }

    /// Unconditional eviction, called after every scoring write.
    pub fn delete(&self, quiz_id: i64) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.remove(&cache_key(quiz_id));
    }
}

impl Default for LeaderboardCache {
    fn default() -> Self {
        Self::new()
    }
}
