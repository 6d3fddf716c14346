// [apps/mimosa-server/src/handlers/auth.rs]
//! Session login/logout (§4.11, §6). Passwords are hashed with a
//! keyed digest rather than a dedicated password-hashing crate, since
//! none is in this workspace's dependency set and user accounts are
//! provisioned out of band (`mimosa-seed`) rather than self-registered.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::handlers::{ApiError, ApiResult};
use crate::middleware::{AdminIdentity, SESSION_COOKIE_NAME};
use crate::state::AppState;

const SESSION_LIFETIME_DAYS: i64 = 7;

/// `sha256(password)`, base64-encoded. Not salted: acceptable for a
/// homelab-scale single/few-operator tool seeded by its own CLI, not
/// a multi-tenant service with self-service signup.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: u64,
}

pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> ApiResult<Response> {
    let Some((user_id, password_hash)) = state.users.find_by_username(&request.username).await? else {
        return Err(ApiError::InvalidInput("invalid username or password".to_string()));
    };

    if hash_password(&request.password) != password_hash {
        return Err(ApiError::InvalidInput("invalid username or password".to_string()));
    }

    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_LIFETIME_DAYS);
    state.sessions.create(&token, user_id, expires_at).await?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE_NAME,
        token,
        SESSION_LIFETIME_DAYS * 24 * 60 * 60
    );

    let mut response = Json(LoginResponse { user_id }).into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, HeaderValue::from_str(&cookie).map_err(|_| ApiError::InvalidInput("invalid session token".to_string()))?);
    Ok(response)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(cookie_header) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        if let Some(token) = cookie_header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE_NAME).then(|| value.to_string())
        }) {
            state.sessions.delete(&token).await?;
        }
    }

    let expired_cookie = format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE_NAME);
    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(header::SET_COOKIE, HeaderValue::from_str(&expired_cookie).unwrap());
    Ok(response)
}

pub async fn session(Extension(identity): Extension<AdminIdentity>) -> Json<AdminIdentity> {
    Json(identity)
}
