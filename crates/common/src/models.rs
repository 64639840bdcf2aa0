//! Domain models

use crate::DayKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A platform user, mirrored from the external user service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub handle: String,
    pub created_at: DateTime<Utc>,
}

/// One record per user per calendar day
///
/// An entry exists only once the day has some activity: at least one accepted
/// solve, or a consumed freeze token. `problems_solved == 0 && !is_freeze`
/// never occurs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub user_id: Uuid,
    pub day: DayKey,
    pub problems_solved: i32,
    pub points_earned: i64,
    pub is_freeze: bool,
}

impl ActivityEntry {
    /// Whether this day counts toward a streak
    pub fn counts(&self) -> bool {
        self.problems_solved > 0 || self.is_freeze
    }
}

/// Cached per-user streak state, recomputed after every ledger write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakState {
    pub user_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_day: Option<DayKey>,
    pub freezes_available: i32,
    pub updated_at: DateTime<Utc>,
}

impl StreakState {
    /// Zero state for a user with no activity yet
    pub fn zero(user_id: Uuid) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_active_day: None,
            freezes_available: 0,
            updated_at: Utc::now(),
        }
    }
}
