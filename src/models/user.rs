// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'users' table in the database.
///
/// This service does not register users or handle credentials; rows are
/// provisioned by the external accounts system and read here for leaderboard
/// usernames and ownership checks.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
