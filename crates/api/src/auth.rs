//! Bearer token verification
//!
//! Token issuance belongs to the platform's auth service; this side only
//! verifies. User tokens are `<user-uuid>.<hex hmac-sha256(uuid)>` signed
//! with the shared `AUTH_SECRET`. Internal hooks (judge callback, user
//! mirror, freeze grants) authenticate with the static `SERVICE_TOKEN`.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Verify a user bearer token, returning the authenticated user id
pub fn verify_user_token(token: &str, secret: &str) -> Option<Uuid> {
    let (id_part, sig_part) = token.split_once('.')?;
    let user_id = Uuid::parse_str(id_part).ok()?;

    let signature = hex::decode(sig_part).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(id_part.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(user_id)
}

/// Produce a token the way the auth service does; used by tests and tooling
pub fn sign_user_token(user_id: Uuid, secret: &str) -> String {
    let id_part = user_id.to_string();
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(id_part.as_bytes());
    format!("{}.{}", id_part, hex::encode(mac.finalize().into_bytes()))
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Extractor for user-authenticated routes
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        let user_id = verify_user_token(token, &state.config.auth_secret)
            .ok_or(ApiError::Unauthorized)?;
        Ok(AuthUser(user_id))
    }
}

/// Extractor for internal service-to-service routes
pub struct ServiceAuth;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        if token != state.config.service_token {
            return Err(ApiError::Unauthorized);
        }
        Ok(ServiceAuth)
    }
}
