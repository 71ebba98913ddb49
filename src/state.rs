use std::sync::Arc;

use axum::extract::FromRef;

use crate::cache::LeaderboardCache;
use crate::config::Config;
use crate::metrics::MetricsSink;
use crate::realtime::broadcast::LeaderboardBroadcaster;
use crate::services::access::{AttemptGate, VisibilityGate};
use crate::services::leaderboard::Leaderboard;
use crate::services::submissions::SubmissionService;
use crate::store::QuizStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub leaderboard: Leaderboard,
    pub submissions: SubmissionService,
    pub broadcaster: Arc<LeaderboardBroadcaster>,
    pub gate: Arc<dyn AttemptGate>,
    pub config: Config,
}

impl AppState {
    /// Wires the service graph over the given store. Tests pass a `MemStore`;
    /// the binary passes a `PgStore`.
    pub fn new(
        store: Arc<dyn QuizStore>,
        metrics: Arc<dyn MetricsSink>,
        config: Config,
    ) -> Self {
        let cache = Arc::new(LeaderboardCache::new());
        let broadcaster = Arc::new(LeaderboardBroadcaster::new());
        let leaderboard = Leaderboard::new(store.clone(), cache, broadcaster.clone());
        let submissions = SubmissionService::new(store.clone(), leaderboard.clone(), metrics);
        Self {
            store,
            leaderboard,
            submissions,
            broadcaster,
            gate: Arc::new(VisibilityGate),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
