//! Streak service facade
//!
//! The single entry point the API layer calls. Writes for one user are
//! serialized through a per-user lock so two solve events arriving together
//! (two tabs, judge retries landing in parallel) cannot interleave the
//! read-recompute-write cycle. Reads recompute the visible streak from the
//! cached state and today's day key, so an elapsed gap reads as broken
//! without any write.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use common::daykey::seconds_left_in_day;
use common::models::{StreakState, User};
use common::{DayKey, Error, Result};
use db::StreakStore;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::badge::Badge;
use crate::streak;

/// Bounded retry for read paths; writes are never blindly retried since a
/// replayed solve would double-count.
const READ_ATTEMPTS: u32 = 3;

/// Everything the dashboard needs in one response
#[derive(Debug, Clone, Serialize)]
pub struct StreakSummary {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub today_solved: bool,
    pub today_points: i64,
    pub freezes_available: i32,
    pub badge: Badge,
    /// Seconds until the UTC day rolls over
    pub time_left_in_day: i64,
    pub last_active_day: Option<NaiveDate>,
}

/// One cell of the month grid
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub problems_solved: i32,
    pub is_freeze: bool,
}

/// Public leaderboard projection
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub email: String,
    pub handle: String,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub badge: Badge,
}

pub struct StreakService {
    store: Arc<dyn StreakStore>,
    user_locks: RwLock<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl StreakService {
    pub fn new(store: Arc<dyn StreakStore>) -> Self {
        Self {
            store,
            user_locks: RwLock::new(HashMap::new()),
        }
    }

    /// Mirror a user from the external user service
    pub async fn register_user(&self, id: Uuid, email: &str, handle: &str) -> Result<User> {
        let user = self.store.upsert_user(id, email, handle).await?;
        debug!(user_id = %id, "Registered user");
        Ok(user)
    }

    /// Hook called by the submission judge after an accepted solve.
    /// Each call is one solve event; de-duplication of judge retries is the
    /// submission service's responsibility.
    pub async fn record_solve(
        &self,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
        points: i64,
    ) -> Result<StreakSummary> {
        self.require_user(user_id).await?;

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let day = DayKey::from_timestamp(timestamp);
        let entry = self.store.upsert_solve(user_id, day, points).await?;
        info!(
            user_id = %user_id,
            day = %day,
            solves = entry.problems_solved,
            "Recorded solve"
        );

        let now = Utc::now();
        let prior = self.state_or_zero(user_id).await?;
        let state = self
            .recompute_and_store(user_id, DayKey::from_timestamp(now), prior.freezes_available)
            .await?;

        self.summarize(&state, now).await
    }

    /// Spend a freeze token on today. Rejected when today already counts
    /// (the token would be wasted) or when the balance is empty.
    pub async fn use_freeze(&self, user_id: Uuid) -> Result<StreakSummary> {
        self.require_user(user_id).await?;

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let now = Utc::now();
        let today = DayKey::from_timestamp(now);

        if self.store.get_entry(user_id, today).await?.is_some() {
            return Err(Error::AlreadyActive(today));
        }

        let prior = self.state_or_zero(user_id).await?;
        if prior.freezes_available <= 0 {
            return Err(Error::NoFreezeAvailable);
        }

        self.store.insert_freeze(user_id, today).await?;
        info!(user_id = %user_id, day = %today, "Freeze consumed");

        let state = self
            .recompute_and_store(user_id, today, prior.freezes_available - 1)
            .await?;

        self.summarize(&state, now).await
    }

    /// Freeze awarding hook; the grant policy lives outside this service
    pub async fn grant_freezes(&self, user_id: Uuid, count: i32) -> Result<i32> {
        self.require_user(user_id).await?;
        let balance = self.store.grant_freezes(user_id, count).await?;
        info!(user_id = %user_id, count, balance, "Granted freezes");
        Ok(balance)
    }

    /// Current streak summary for the dashboard
    pub async fn get_summary(&self, user_id: Uuid) -> Result<StreakSummary> {
        retry_read(|| self.require_user(user_id)).await?;
        let state = retry_read(|| self.state_or_zero(user_id)).await?;
        self.summarize(&state, Utc::now()).await
    }

    /// Month grid for the calendar view; months with no activity are a valid
    /// all-empty grid
    pub async fn get_calendar(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Vec<CalendarDay>> {
        retry_read(|| self.require_user(user_id)).await?;

        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::Internal(format!("invalid calendar month {year}-{month}")))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| Error::Internal(format!("invalid calendar month {year}-{month}")))?;

        let from = DayKey::from_date(first);
        let to = DayKey::from_date(next_month).prev();

        let entries = retry_read(|| self.store.entries_in_range(user_id, from, to)).await?;
        let by_day: HashMap<DayKey, _> = entries.into_iter().map(|e| (e.day, e)).collect();

        let mut grid = Vec::with_capacity(31);
        let mut day = from;
        while day <= to {
            let (problems_solved, is_freeze) = by_day
                .get(&day)
                .map(|e| (e.problems_solved, e.is_freeze))
                .unwrap_or((0, false));
            grid.push(CalendarDay {
                date: day.date(),
                problems_solved,
                is_freeze,
            });
            day = day.next();
        }
        Ok(grid)
    }

    /// Streak leaderboard, current streak descending
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardRow>> {
        let today = DayKey::from_timestamp(Utc::now());
        let rows = retry_read(|| self.store.leaderboard(limit)).await?;

        // The stored current streak can be stale for users who went quiet;
        // observe() zeroes those, after which the order must be restored.
        let mut projected: Vec<LeaderboardRow> = rows
            .into_iter()
            .map(|(user, state)| {
                let (current, _) = streak::observe(&state, today);
                LeaderboardRow {
                    email: user.email,
                    handle: user.handle,
                    current_streak: current,
                    longest_streak: state.longest_streak,
                    badge: Badge::for_streak(current),
                }
            })
            .collect();
        projected.sort_by(|a, b| {
            (b.current_streak, b.longest_streak).cmp(&(a.current_streak, a.longest_streak))
        });
        Ok(projected)
    }

    /// Default calendar target when the query omits year/month
    pub fn current_month(&self) -> (i32, u32) {
        let today = Utc::now().date_naive();
        (today.year(), today.month())
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User '{user_id}' not found")))
    }

    /// Registered user with no ledger yet reads as the zero state
    async fn state_or_zero(&self, user_id: Uuid) -> Result<StreakState> {
        Ok(self
            .store
            .get_state(user_id)
            .await?
            .unwrap_or_else(|| StreakState::zero(user_id)))
    }

    async fn recompute_and_store(
        &self,
        user_id: Uuid,
        today: DayKey,
        freezes_available: i32,
    ) -> Result<StreakState> {
        let active = self.store.active_days(user_id).await?;
        let prior = self.state_or_zero(user_id).await?;
        let comp = streak::recompute(&active, today, prior.longest_streak);

        let state = StreakState {
            user_id,
            current_streak: comp.current_streak,
            longest_streak: comp.longest_streak,
            last_active_day: comp.last_active_day,
            freezes_available,
            updated_at: Utc::now(),
        };
        self.store.put_state(&state).await?;
        Ok(state)
    }

    async fn summarize(&self, state: &StreakState, now: DateTime<Utc>) -> Result<StreakSummary> {
        let today = DayKey::from_timestamp(now);
        let (current_streak, today_solved) = streak::observe(state, today);

        let today_points = self
            .store
            .get_entry(state.user_id, today)
            .await?
            .map(|e| e.points_earned)
            .unwrap_or(0);

        Ok(StreakSummary {
            current_streak,
            longest_streak: state.longest_streak,
            today_solved,
            today_points,
            freezes_available: state.freezes_available,
            badge: Badge::for_streak(current_streak),
            time_left_in_day: seconds_left_in_day(now),
            last_active_day: state.last_active_day.map(DayKey::date),
        })
    }

    async fn user_lock(&self, user_id: Uuid) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.user_locks.read().await;
            if let Some(lock) = guard.get(&user_id) {
                return lock.clone();
            }
        }

        let mut guard = self.user_locks.write().await;
        // A strong count of 1 means no task holds or awaits the lock, so the
        // map does not grow with every user id that ever wrote
        guard.retain(|_, lock| Arc::strong_count(lock) > 1);
        guard
            .entry(user_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.user_locks.read().await.len()
    }
}

async fn retry_read<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < READ_ATTEMPTS => {
                warn!(attempt, error = %e, "Transient storage error on read, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}
