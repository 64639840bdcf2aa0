//! User-facing streak routes

use axum::{
    extract::{Query, State},
    Json,
};
use engine::{CalendarDay, LeaderboardRow, StreakSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct StreakResponse {
    pub streak: StreakSummary,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    pub calendar: Vec<CalendarDay>,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardRow>,
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    25
}

pub async fn get_user_streak(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<StreakResponse>> {
    let streak = state.service.get_summary(user_id).await?;
    Ok(Json(StreakResponse { streak }))
}

pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarResponse>> {
    let (default_year, default_month) = state.service.current_month();
    let year = query.year.unwrap_or(default_year);
    let month = query.month.unwrap_or(default_month);
    if !(1..=12).contains(&month) {
        return Err(ApiError::BadRequest(format!("Invalid month: {month}")));
    }
    if !(1970..=9999).contains(&year) {
        return Err(ApiError::BadRequest(format!("Invalid year: {year}")));
    }

    let calendar = state.service.get_calendar(user_id, year, month).await?;
    Ok(Json(CalendarResponse { calendar }))
}

pub async fn use_freeze(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<StreakResponse>> {
    let streak = state.service.use_freeze(user_id).await?;
    Ok(Json(StreakResponse { streak }))
}

pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<LeaderboardResponse>> {
    let leaderboard = state.service.leaderboard(query.limit.clamp(1, 100)).await?;
    Ok(Json(LeaderboardResponse { leaderboard }))
}
