// [apps/mimosa-server/src/middleware.rs]
//! A single session-cookie guard (§4.11): every mutating admin/API
//! endpoint requires a valid session; read endpoints under
//! `/api/public/*` never pass through this guard at all.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "mimosa_session";

/// The identity injected into request extensions once a session cookie
/// has been validated against the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub user_id: u64,
}

pub async fn session_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = extract_session_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state
        .sessions
        .valid_user_id(&token, Utc::now())
        .await
        .map_err(|e| {
            warn!("session lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    debug!("session authenticated for user {}", user_id);
    req.extensions_mut().insert(AdminIdentity { user_id });
    Ok(next.run(req).await)
}

/// Pulls the session token out of the `Cookie` header. Axum has no
/// built-in cookie jar in this dependency set, so this does the same
/// manual header parse the rest of this codebase uses for bearer
/// tokens.
pub fn extract_session_token(req: &Request) -> Option<String> {
    let cookie_header = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE_NAME).then(|| value.to_string())
    })
}
