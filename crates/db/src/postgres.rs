//! PostgreSQL implementation of [`StreakStore`]
//!
//! Solve recording relies on `ON CONFLICT ... DO UPDATE` so two near-
//! simultaneous solve events for the same user cannot lose an increment even
//! without the facade's per-user lock.

use async_trait::async_trait;
use common::models::{ActivityEntry, StreakState, User};
use common::{DayKey, Error, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::StreakStore;

pub struct PostgresStreakStore {
    pool: PgPool,
}

impl PostgresStreakStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        handle: row.get("handle"),
        created_at: row.get("created_at"),
    }
}

fn entry_from_row(row: &PgRow) -> ActivityEntry {
    ActivityEntry {
        user_id: row.get("user_id"),
        day: DayKey(row.get("day_key")),
        problems_solved: row.get("problems_solved"),
        points_earned: row.get("points_earned"),
        is_freeze: row.get("is_freeze"),
    }
}

fn state_from_row(row: &PgRow) -> StreakState {
    StreakState {
        user_id: row.get("user_id"),
        current_streak: row.get("current_streak"),
        longest_streak: row.get("longest_streak"),
        last_active_day: row.get::<Option<i64>, _>("last_active_day").map(DayKey),
        freezes_available: row.get("freezes_available"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl StreakStore for PostgresStreakStore {
    async fn upsert_user(&self, id: Uuid, email: &str, handle: &str) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, handle, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                handle = EXCLUDED.handle
            RETURNING id, email, handle, created_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(handle)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(user_from_row(&row))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, handle, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn upsert_solve(
        &self,
        user_id: Uuid,
        day: DayKey,
        points: i64,
    ) -> Result<ActivityEntry> {
        let row = sqlx::query(
            r#"
            INSERT INTO activity_entries (user_id, day_key, problems_solved, points_earned, is_freeze)
            VALUES ($1, $2, 1, $3, FALSE)
            ON CONFLICT (user_id, day_key) DO UPDATE
            SET problems_solved = activity_entries.problems_solved + 1,
                points_earned = activity_entries.points_earned + EXCLUDED.points_earned
            RETURNING user_id, day_key, problems_solved, points_earned, is_freeze
            "#,
        )
        .bind(user_id)
        .bind(day.0)
        .bind(points)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(entry_from_row(&row))
    }

    async fn insert_freeze(&self, user_id: Uuid, day: DayKey) -> Result<ActivityEntry> {
        // DO NOTHING + empty result signals the day already has an entry
        let row = sqlx::query(
            r#"
            INSERT INTO activity_entries (user_id, day_key, problems_solved, points_earned, is_freeze)
            VALUES ($1, $2, 0, 0, TRUE)
            ON CONFLICT (user_id, day_key) DO NOTHING
            RETURNING user_id, day_key, problems_solved, points_earned, is_freeze
            "#,
        )
        .bind(user_id)
        .bind(day.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => Ok(entry_from_row(&row)),
            None => Err(Error::AlreadyActive(day)),
        }
    }

    async fn get_entry(&self, user_id: Uuid, day: DayKey) -> Result<Option<ActivityEntry>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, day_key, problems_solved, points_earned, is_freeze
            FROM activity_entries
            WHERE user_id = $1 AND day_key = $2
            "#,
        )
        .bind(user_id)
        .bind(day.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.as_ref().map(entry_from_row))
    }

    async fn entries_in_range(
        &self,
        user_id: Uuid,
        from: DayKey,
        to: DayKey,
    ) -> Result<Vec<ActivityEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, day_key, problems_solved, points_earned, is_freeze
            FROM activity_entries
            WHERE user_id = $1 AND day_key BETWEEN $2 AND $3
            ORDER BY day_key ASC
            "#,
        )
        .bind(user_id)
        .bind(from.0)
        .bind(to.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    async fn latest_entry(&self, user_id: Uuid) -> Result<Option<ActivityEntry>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, day_key, problems_solved, points_earned, is_freeze
            FROM activity_entries
            WHERE user_id = $1
            ORDER BY day_key DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.as_ref().map(entry_from_row))
    }

    async fn active_days(&self, user_id: Uuid) -> Result<Vec<DayKey>> {
        let rows = sqlx::query(
            r#"
            SELECT day_key
            FROM activity_entries
            WHERE user_id = $1 AND (problems_solved > 0 OR is_freeze)
            ORDER BY day_key ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.iter().map(|r| DayKey(r.get("day_key"))).collect())
    }

    async fn get_state(&self, user_id: Uuid) -> Result<Option<StreakState>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, current_streak, longest_streak, last_active_day,
                   freezes_available, updated_at
            FROM streak_state
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.as_ref().map(state_from_row))
    }

    async fn put_state(&self, state: &StreakState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO streak_state
                (user_id, current_streak, longest_streak, last_active_day,
                 freezes_available, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET current_streak = EXCLUDED.current_streak,
                longest_streak = EXCLUDED.longest_streak,
                last_active_day = EXCLUDED.last_active_day,
                freezes_available = EXCLUDED.freezes_available,
                updated_at = NOW()
            "#,
        )
        .bind(state.user_id)
        .bind(state.current_streak)
        .bind(state.longest_streak)
        .bind(state.last_active_day.map(|d| d.0))
        .bind(state.freezes_available)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn grant_freezes(&self, user_id: Uuid, count: i32) -> Result<i32> {
        let row = sqlx::query(
            r#"
            INSERT INTO streak_state
                (user_id, current_streak, longest_streak, last_active_day,
                 freezes_available, updated_at)
            VALUES ($1, 0, 0, NULL, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET freezes_available = streak_state.freezes_available + EXCLUDED.freezes_available,
                updated_at = NOW()
            RETURNING freezes_available
            "#,
        )
        .bind(user_id)
        .bind(count)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.get("freezes_available"))
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<(User, StreakState)>> {
        // LEFT JOIN so registered users with no streak_state row yet still
        // rank with the zero state
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.email, u.handle, u.created_at,
                   COALESCE(s.current_streak, 0) AS current_streak,
                   COALESCE(s.longest_streak, 0) AS longest_streak,
                   s.last_active_day,
                   COALESCE(s.freezes_available, 0) AS freezes_available,
                   COALESCE(s.updated_at, u.created_at) AS updated_at
            FROM users u
            LEFT JOIN streak_state s ON s.user_id = u.id
            ORDER BY COALESCE(s.current_streak, 0) DESC,
                     COALESCE(s.longest_streak, 0) DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .iter()
            .map(|row| {
                let user = user_from_row(row);
                let state = StreakState {
                    user_id: user.id,
                    current_streak: row.get("current_streak"),
                    longest_streak: row.get("longest_streak"),
                    last_active_day: row.get::<Option<i64>, _>("last_active_day").map(DayKey),
                    freezes_available: row.get("freezes_available"),
                    updated_at: row.get("updated_at"),
                };
                (user, state)
            })
            .collect())
    }
}
