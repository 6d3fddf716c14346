// [apps/mimosa-server/src/handlers/dashboard.rs]
//! Dashboard aggregate widgets (§6 `GET /api/dashboard/{top_ips,
//! blocks/expiring,blocks/reasons,ip_types,reaction_time}`). `health`
//! lives in `firewalls::health_summary` since it is a per-firewall
//! rollup, not an offense/block aggregate.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use mimosa_models::{Block, IpClassification, IpProfile};
use serde::{Deserialize, Serialize};

use crate::handlers::{clamp_limit, ApiResult};
use crate::state::AppState;

const DEFAULT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub since: Option<DateTime<Utc>>,
}

fn window_start(since: Option<DateTime<Utc>>) -> DateTime<Utc> {
    since.unwrap_or_else(|| Utc::now() - Duration::hours(DEFAULT_WINDOW_HOURS))
}

pub async fn top_ips(State(state): State<AppState>, Query(query): Query<LimitQuery>) -> ApiResult<Json<Vec<IpProfile>>> {
    Ok(Json(state.ip_profiles.top_offenders(clamp_limit(query.limit)).await?))
}

pub async fn blocks_expiring(State(state): State<AppState>, Query(query): Query<LimitQuery>) -> ApiResult<Json<Vec<Block>>> {
    Ok(Json(state.blocks.expiring(clamp_limit(query.limit)).await?))
}

#[derive(Debug, Serialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: u64,
}

pub async fn blocks_reasons(State(state): State<AppState>) -> ApiResult<Json<Vec<ReasonCount>>> {
    let breakdown = state.blocks.reason_breakdown().await?;
    Ok(Json(breakdown.into_iter().map(|(reason, count)| ReasonCount { reason, count }).collect()))
}

#[derive(Debug, Serialize)]
pub struct IpTypeCount {
    pub classification: IpClassification,
    pub count: u64,
}

pub async fn ip_types(State(state): State<AppState>) -> ApiResult<Json<Vec<IpTypeCount>>> {
    let breakdown = state.ip_profiles.classification_breakdown().await?;
    Ok(Json(breakdown.into_iter().map(|(classification, count)| IpTypeCount { classification, count }).collect()))
}

#[derive(Debug, Serialize)]
pub struct ReactionTime {
    pub average_seconds: Option<f64>,
    pub since: DateTime<Utc>,
}

/// Average time between an IP's first offense and the block that
/// followed it, over the window `since` (defaulting to the trailing
/// 24 hours). `None` when nothing in the window reacted yet.
pub async fn reaction_time(State(state): State<AppState>, Query(query): Query<WindowQuery>) -> ApiResult<Json<ReactionTime>> {
    let since = window_start(query.since);
    let average_seconds = state.blocks.average_reaction_seconds(since).await?;
    Ok(Json(ReactionTime { average_seconds, since }))
}
