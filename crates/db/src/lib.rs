//! Storage layer for the streak service
//!
//! The activity ledger, the cached per-user streak state and the freeze
//! balance live behind the [`StreakStore`] trait. Two implementations are
//! provided: [`memory::MemoryStreakStore`] for tests and local development,
//! and [`postgres::PostgresStreakStore`] for production.

use async_trait::async_trait;
use common::models::{ActivityEntry, StreakState, User};
use common::{DayKey, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStreakStore;
pub use postgres::PostgresStreakStore;

/// Persistence operations for the activity ledger and streak state
///
/// Ledger entries are append-only per (user, day): solves increment an
/// existing entry, freezes create one, nothing deletes them. Writes for one
/// user are serialized above this trait by the service facade; implementations
/// must still make each individual write atomic.
#[async_trait]
pub trait StreakStore: Send + Sync {
    /// Mirror a user from the external user service (insert or refresh)
    async fn upsert_user(&self, id: Uuid, email: &str, handle: &str) -> Result<User>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Record one accepted solve: create the day's entry or increment it.
    /// Deliberately not idempotent; submission de-duplication happens upstream.
    async fn upsert_solve(&self, user_id: Uuid, day: DayKey, points: i64)
        -> Result<ActivityEntry>;

    /// Record a consumed freeze for `day`. Fails with
    /// [`common::Error::AlreadyActive`] if the day already has an entry.
    async fn insert_freeze(&self, user_id: Uuid, day: DayKey) -> Result<ActivityEntry>;

    async fn get_entry(&self, user_id: Uuid, day: DayKey) -> Result<Option<ActivityEntry>>;

    /// Entries in `[from, to]`, ascending by day
    async fn entries_in_range(
        &self,
        user_id: Uuid,
        from: DayKey,
        to: DayKey,
    ) -> Result<Vec<ActivityEntry>>;

    async fn latest_entry(&self, user_id: Uuid) -> Result<Option<ActivityEntry>>;

    /// All days that count toward a streak, ascending
    async fn active_days(&self, user_id: Uuid) -> Result<Vec<DayKey>>;

    async fn get_state(&self, user_id: Uuid) -> Result<Option<StreakState>>;

    async fn put_state(&self, state: &StreakState) -> Result<()>;

    /// Add freeze tokens to a user's balance, returning the new balance.
    /// The awarding policy lives outside this service.
    async fn grant_freezes(&self, user_id: Uuid, count: i32) -> Result<i32>;

    /// All registered users with their streak state (zero state for users
    /// with no activity yet), ordered by current streak descending
    async fn leaderboard(&self, limit: i64) -> Result<Vec<(User, StreakState)>>;
}

/// Create a database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| common::Error::Database(e.to_string()))?;
    info!("Database connected");
    Ok(pool)
}

/// Run database migrations from SQL files
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running migrations...");

    let migration_sql = include_str!("../../../migrations/001_initial.sql");
    sqlx::raw_sql(migration_sql)
        .execute(pool)
        .await
        .map_err(|e| common::Error::Database(e.to_string()))?;

    info!("Migrations complete");
    Ok(())
}
