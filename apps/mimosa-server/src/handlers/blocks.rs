// [apps/mimosa-server/src/handlers/blocks.rs]
//! Active/historical block reads and the manual block/unblock admin
//! actions (§4.6, §6). A manual block always carries `severity: None`
//! so it outranks any automated reason per the block manager's
//! overwrite rule.

use std::net::IpAddr;

use axum::extract::{Path, Query, State};
use axum::Json;
use mimosa_models::{Block, BlockHistoryEntry};
use serde::Deserialize;

use crate::handlers::{clamp_limit, ApiResult};
use crate::services::block_manager::AddBlockRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub include_expired: Option<bool>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Json<Vec<Block>>> {
    let blocks = state
        .block_manager
        .list(query.include_expired.unwrap_or(false), clamp_limit(query.limit))
        .await?;
    Ok(Json(blocks))
}

#[derive(Debug, Deserialize)]
pub struct CreateBlockRequest {
    pub ip: IpAddr,
    pub reason: String,
    pub duration_minutes: Option<u32>,
}

pub async fn create(State(state): State<AppState>, Json(request): Json<CreateBlockRequest>) -> ApiResult<Json<Block>> {
    let block = state
        .block_manager
        .add(AddBlockRequest {
            ip: request.ip,
            reason: request.reason,
            reason_text: None,
            reason_plugin: None,
            severity: None,
            source: "manual".to_string(),
            duration_minutes: request.duration_minutes,
        })
        .await?;

    for firewall_id in state.firewalls.list_enabled().await?.into_iter().map(|f| f.id) {
        state.nudge_synchronizer(firewall_id).await;
    }

    Ok(Json(block))
}

/// Block history across every IP, newest first (as opposed to
/// `IpProfile`'s per-ip history, which has its own path).
pub async fn history(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Json<Vec<BlockHistoryEntry>>> {
    Ok(Json(state.blocks.global_history(clamp_limit(query.limit)).await?))
}

pub async fn delete(State(state): State<AppState>, Path(ip): Path<IpAddr>) -> ApiResult<()> {
    state.block_manager.remove(ip, Some("admin")).await?;
    for firewall_id in state.firewalls.list_enabled().await?.into_iter().map(|f| f.id) {
        state.nudge_synchronizer(firewall_id).await;
    }
    Ok(())
}
