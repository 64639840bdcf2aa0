//! In-memory implementation of [`StreakStore`]
//!
//! Backs tests and local development without a database connection. Data is
//! lost when the process exits.

use async_trait::async_trait;
use chrono::Utc;
use common::models::{ActivityEntry, StreakState, User};
use common::{DayKey, Error, Result};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::StreakStore;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    // BTreeMap keeps each user's ledger ordered by day
    entries: HashMap<Uuid, BTreeMap<DayKey, ActivityEntry>>,
    states: HashMap<Uuid, StreakState>,
}

#[derive(Default)]
pub struct MemoryStreakStore {
    inner: RwLock<Inner>,
}

impl MemoryStreakStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StreakStore for MemoryStreakStore {
    async fn upsert_user(&self, id: Uuid, email: &str, handle: &str) -> Result<User> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .entry(id)
            .and_modify(|u| {
                u.email = email.to_string();
                u.handle = handle.to_string();
            })
            .or_insert_with(|| User {
                id,
                email: email.to_string(),
                handle: handle.to_string(),
                created_at: Utc::now(),
            });
        Ok(user.clone())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn upsert_solve(
        &self,
        user_id: Uuid,
        day: DayKey,
        points: i64,
    ) -> Result<ActivityEntry> {
        let mut inner = self.inner.write().await;
        let ledger = inner.entries.entry(user_id).or_default();
        let entry = ledger
            .entry(day)
            .and_modify(|e| {
                e.problems_solved += 1;
                e.points_earned += points;
            })
            .or_insert_with(|| ActivityEntry {
                user_id,
                day,
                problems_solved: 1,
                points_earned: points,
                is_freeze: false,
            });
        Ok(entry.clone())
    }

    async fn insert_freeze(&self, user_id: Uuid, day: DayKey) -> Result<ActivityEntry> {
        let mut inner = self.inner.write().await;
        let ledger = inner.entries.entry(user_id).or_default();
        if ledger.contains_key(&day) {
            return Err(Error::AlreadyActive(day));
        }
        let entry = ActivityEntry {
            user_id,
            day,
            problems_solved: 0,
            points_earned: 0,
            is_freeze: true,
        };
        ledger.insert(day, entry.clone());
        Ok(entry)
    }

    async fn get_entry(&self, user_id: Uuid, day: DayKey) -> Result<Option<ActivityEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .get(&user_id)
            .and_then(|ledger| ledger.get(&day))
            .cloned())
    }

    async fn entries_in_range(
        &self,
        user_id: Uuid,
        from: DayKey,
        to: DayKey,
    ) -> Result<Vec<ActivityEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .get(&user_id)
            .map(|ledger| ledger.range(from..=to).map(|(_, e)| e.clone()).collect())
            .unwrap_or_default())
    }

    async fn latest_entry(&self, user_id: Uuid) -> Result<Option<ActivityEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .get(&user_id)
            .and_then(|ledger| ledger.values().next_back())
            .cloned())
    }

    async fn active_days(&self, user_id: Uuid) -> Result<Vec<DayKey>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .get(&user_id)
            .map(|ledger| {
                ledger
                    .values()
                    .filter(|e| e.counts())
                    .map(|e| e.day)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_state(&self, user_id: Uuid) -> Result<Option<StreakState>> {
        let inner = self.inner.read().await;
        Ok(inner.states.get(&user_id).cloned())
    }

    async fn put_state(&self, state: &StreakState) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.states.insert(state.user_id, state.clone());
        Ok(())
    }

    async fn grant_freezes(&self, user_id: Uuid, count: i32) -> Result<i32> {
        let mut inner = self.inner.write().await;
        let state = inner
            .states
            .entry(user_id)
            .or_insert_with(|| StreakState::zero(user_id));
        state.freezes_available += count;
        state.updated_at = Utc::now();
        Ok(state.freezes_available)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<(User, StreakState)>> {
        let inner = self.inner.read().await;
        // Every registered user ranks, zero state included
        let mut rows: Vec<(User, StreakState)> = inner
            .users
            .values()
            .map(|user| {
                let state = inner
                    .states
                    .get(&user.id)
                    .cloned()
                    .unwrap_or_else(|| StreakState::zero(user.id));
                (user.clone(), state)
            })
            .collect();
        rows.sort_by(|(_, a), (_, b)| {
            (b.current_streak, b.longest_streak).cmp(&(a.current_streak, a.longest_streak))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> DayKey {
        DayKey(n)
    }

    #[tokio::test]
    async fn solve_creates_then_increments_the_day_entry() {
        let store = MemoryStreakStore::new();
        let user = Uuid::new_v4();

        let first = store.upsert_solve(user, day(10), 50).await.unwrap();
        assert_eq!(first.problems_solved, 1);
        assert_eq!(first.points_earned, 50);
        assert!(!first.is_freeze);

        let second = store.upsert_solve(user, day(10), 30).await.unwrap();
        assert_eq!(second.problems_solved, 2);
        assert_eq!(second.points_earned, 80);
    }

    #[tokio::test]
    async fn freeze_rejected_when_day_already_has_an_entry() {
        let store = MemoryStreakStore::new();
        let user = Uuid::new_v4();

        store.upsert_solve(user, day(10), 10).await.unwrap();
        let err = store.insert_freeze(user, day(10)).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyActive(d) if d == day(10)));

        // Also rejected when the day is already covered by a freeze
        store.insert_freeze(user, day(11)).await.unwrap();
        let err = store.insert_freeze(user, day(11)).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyActive(_)));
    }

    #[tokio::test]
    async fn range_query_is_ascending_and_inclusive() {
        let store = MemoryStreakStore::new();
        let user = Uuid::new_v4();

        for d in [day(5), day(3), day(7)] {
            store.upsert_solve(user, d, 1).await.unwrap();
        }

        let entries = store.entries_in_range(user, day(3), day(7)).await.unwrap();
        let days: Vec<DayKey> = entries.iter().map(|e| e.day).collect();
        assert_eq!(days, vec![day(3), day(5), day(7)]);

        let partial = store.entries_in_range(user, day(4), day(6)).await.unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].day, day(5));
    }

    #[tokio::test]
    async fn active_days_include_freezes() {
        let store = MemoryStreakStore::new();
        let user = Uuid::new_v4();

        store.upsert_solve(user, day(1), 10).await.unwrap();
        store.insert_freeze(user, day(2)).await.unwrap();
        store.upsert_solve(user, day(3), 10).await.unwrap();

        let days = store.active_days(user).await.unwrap();
        assert_eq!(days, vec![day(1), day(2), day(3)]);
    }

    #[tokio::test]
    async fn latest_entry_returns_most_recent_day() {
        let store = MemoryStreakStore::new();
        let user = Uuid::new_v4();

        assert!(store.latest_entry(user).await.unwrap().is_none());

        store.upsert_solve(user, day(9), 1).await.unwrap();
        store.upsert_solve(user, day(4), 1).await.unwrap();

        let latest = store.latest_entry(user).await.unwrap().unwrap();
        assert_eq!(latest.day, day(9));
    }

    #[tokio::test]
    async fn grant_freezes_accumulates_and_seeds_state() {
        let store = MemoryStreakStore::new();
        let user = Uuid::new_v4();

        assert_eq!(store.grant_freezes(user, 2).await.unwrap(), 2);
        assert_eq!(store.grant_freezes(user, 1).await.unwrap(), 3);

        let state = store.get_state(user).await.unwrap().unwrap();
        assert_eq!(state.freezes_available, 3);
        assert_eq!(state.current_streak, 0);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_current_then_longest() {
        let store = MemoryStreakStore::new();
        for (current, longest) in [(3, 5), (7, 7), (3, 9)] {
            let id = Uuid::new_v4();
            store
                .upsert_user(id, &format!("{current}-{longest}@codeclash.dev"), "u")
                .await
                .unwrap();
            let mut state = StreakState::zero(id);
            state.current_streak = current;
            state.longest_streak = longest;
            store.put_state(&state).await.unwrap();
        }

        let rows = store.leaderboard(10).await.unwrap();
        let order: Vec<(i32, i32)> = rows
            .iter()
            .map(|(_, s)| (s.current_streak, s.longest_streak))
            .collect();
        assert_eq!(order, vec![(7, 7), (3, 9), (3, 5)]);

        let top = store.leaderboard(1).await.unwrap();
        assert_eq!(top.len(), 1);
    }

    #[tokio::test]
    async fn leaderboard_includes_registered_users_with_no_activity() {
        let store = MemoryStreakStore::new();
        let active = Uuid::new_v4();
        let inactive = Uuid::new_v4();
        store
            .upsert_user(active, "active@codeclash.dev", "active")
            .await
            .unwrap();
        store
            .upsert_user(inactive, "new@codeclash.dev", "new")
            .await
            .unwrap();

        let mut state = StreakState::zero(active);
        state.current_streak = 2;
        state.longest_streak = 2;
        store.put_state(&state).await.unwrap();

        let rows = store.leaderboard(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0.id, active);
        assert_eq!(rows[1].0.id, inactive);
        assert_eq!(rows[1].1.current_streak, 0);
        assert_eq!(rows[1].1.freezes_available, 0);
    }
}
