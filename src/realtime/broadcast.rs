// src/realtime/broadcast.rs

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::submission::LeaderboardEntry;

const CHANNEL_CAPACITY: usize = 32;

/// Snapshot pushed to live leaderboard viewers.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardUpdate {
    pub quiz_id: i64,
    pub entries: Vec<LeaderboardEntry>,
}

/// Fan-out transport: one broadcast channel per quiz group.
///
/// Delivery is best effort. Publishing to a group nobody subscribed to drops
/// the snapshot; the scoring write path never sees an error from here.
pub struct LeaderboardBroadcaster {
    channels: Mutex<HashMap<i64, broadcast::Sender<LeaderboardUpdate>>>,
}

impl LeaderboardBroadcaster {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Group key for a quiz's leaderboard channel, used in logs and by any
    /// external fan-out layer that mirrors these groups.
    pub fn group_name(quiz_id: i64) -> String {
        format!("quiz_{quiz_id}_leaderboard")
    }

    pub fn subscribe(&self, quiz_id: i64) -> broadcast::Receiver<LeaderboardUpdate> {
        let Ok(mut channels) = self.channels.lock() else {
            // Degraded mode: hand out a receiver on a throwaway channel.
            return broadcast::channel(CHANNEL_CAPACITY).1;
        };
        channels
            .entry(quiz_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Sends a snapshot to the quiz's group. Returns the number of receivers
    /// it reached; all failure modes collapse to 0.
    pub fn publish(&self, quiz_id: i64, entries: Vec<LeaderboardEntry>) -> usize {
        let sender = {
            let Ok(channels) = self.channels.lock() else {
                return 0;
            };
            match channels.get(&quiz_id) {
                Some(sender) => sender.clone(),
                None => {
                    tracing::debug!(
                        group = %Self::group_name(quiz_id),
                        "leaderboard update dropped (no channel)"
                    );
                    return 0;
                }
            }
        };

        match sender.send(LeaderboardUpdate { quiz_id, entries }) {
            Ok(receivers) => {
                tracing::debug!(
                    group = %Self::group_name(quiz_id),
                    receivers,
                    "leaderboard update published"
                );
                receivers
            }
            Err(_) => {
                tracing::debug!(
                    group = %Self::group_name(quiz_id),
                    "leaderboard update dropped (no subscribers)"
                );
                0
            }
        }
    }

    pub fn subscriber_count(&self, quiz_id: i64) -> usize {
        let Ok(channels) = self.channels.lock() else {
            return 0;
        };
        channels
            .get(&quiz_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for LeaderboardBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
