//! CodeClash streak service HTTP API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Build the full application router
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/streak/user", get(routes::streak::get_user_streak))
        .route("/streak/calendar", get(routes::streak::get_calendar))
        .route("/streak/freeze", post(routes::streak::use_freeze))
        .route("/streak/leaderboard", get(routes::streak::leaderboard))
        .route("/internal/solve", post(routes::internal::solve))
        .route("/internal/users", post(routes::internal::upsert_user))
        .route(
            "/internal/freezes/grant",
            post(routes::internal::grant_freezes),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
