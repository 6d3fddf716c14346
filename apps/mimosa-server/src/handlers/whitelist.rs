// [apps/mimosa-server/src/handlers/whitelist.rs]
//! Whitelist CRUD (§4.3, §6). Entries are free-form CIDR/IP/FQDN
//! strings; `mimosa_models::whitelist::classify_entry` decides the
//! shape at evaluation time, not here.

use axum::extract::{Path, State};
use axum::Json;
use mimosa_models::WhitelistEntry;
use serde::Deserialize;

use crate::handlers::ApiResult;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<WhitelistEntry>>> {
    Ok(Json(state.whitelist.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateWhitelistEntry {
    pub cidr: String,
    pub note: Option<String>,
}

pub async fn create(State(state): State<AppState>, Json(request): Json<CreateWhitelistEntry>) -> ApiResult<Json<u64>> {
    let id = state.whitelist.insert(&request.cidr, request.note.as_deref()).await?;
    Ok(Json(id))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<()> {
    state.whitelist.delete(id).await?;
    Ok(())
}
