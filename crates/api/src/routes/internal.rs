//! Internal hooks for sibling services
//!
//! The submission judge posts accepted solves here, the user service mirrors
//! accounts, and the (external) awarding policy grants freeze tokens.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use common::models::User;
use engine::StreakSummary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::ServiceAuth;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SolveBody {
    pub user_id: Uuid,
    pub points: i64,
    /// Judging completion time; defaults to arrival time
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpsertUserBody {
    pub id: Uuid,
    pub email: String,
    pub handle: String,
}

#[derive(Deserialize)]
pub struct GrantFreezesBody {
    pub user_id: Uuid,
    pub count: i32,
}

#[derive(Serialize)]
pub struct StreakResponse {
    pub streak: StreakSummary,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Serialize)]
pub struct GrantFreezesResponse {
    pub freezes_available: i32,
}

pub async fn solve(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<SolveBody>,
) -> ApiResult<Json<StreakResponse>> {
    let timestamp = body.timestamp.unwrap_or_else(Utc::now);
    let streak = state
        .service
        .record_solve(body.user_id, timestamp, body.points)
        .await?;
    Ok(Json(StreakResponse { streak }))
}

pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<UpsertUserBody>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .service
        .register_user(body.id, &body.email, &body.handle)
        .await?;
    Ok(Json(UserResponse { user }))
}

pub async fn grant_freezes(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<GrantFreezesBody>,
) -> ApiResult<Json<GrantFreezesResponse>> {
    let freezes_available = state
        .service
        .grant_freezes(body.user_id, body.count)
        .await?;
    Ok(Json(GrantFreezesResponse { freezes_available }))
}
