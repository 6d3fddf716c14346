// [apps/mimosa-server/src/handlers/mod.rs]
//! HTTP handlers for the admin/API facade (§6). One module per
//! resource family; `ApiError` is the single place a store, firewall,
//! or enrichment failure gets mapped to a status code.

pub mod auth;
pub mod blocks;
pub mod dashboard;
pub mod firewalls;
pub mod ips;
pub mod offenses;
pub mod plugins;
pub mod public;
pub mod rules;
pub mod stats;
pub mod whitelist;
pub mod ws;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use mimosa_enrichment::EnrichmentError;
use mimosa_firewall::FirewallError;
use mimosa_store::StoreError;

/// Every category from §7 folded into one enum so handlers can use
/// `?` against store/firewall/enrichment calls and still return a
/// well-shaped HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("not found")]
    NotFound,
    #[error("internal failure: {0}")]
    Internal(anyhow::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Firewall(#[from] FirewallError),
    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Internal(e) => {
                tracing::error!("internal invariant failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::Store(StoreError::NotFound) => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Store(StoreError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Store(e) => {
                tracing::error!("store failure: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "store unavailable".to_string())
            }
            ApiError::Firewall(FirewallError::AuthenticationFailed) => {
                (StatusCode::BAD_GATEWAY, "firewall rejected credentials".to_string())
            }
            ApiError::Firewall(e) => {
                tracing::warn!("firewall gateway failure: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::Enrichment(e) => {
                tracing::warn!("enrichment failure: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Shared `limit` query parsing per §6 (`limit ∈ [1,2000]`, default 100).
pub fn clamp_limit(raw: Option<u32>) -> u32 {
    raw.unwrap_or(100).clamp(1, 2000)
}
