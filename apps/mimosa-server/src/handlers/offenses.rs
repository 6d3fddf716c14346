// [apps/mimosa-server/src/handlers/offenses.rs]
//! Offense reads (§6: `GET /api/offenses?limit=&source_ip=&plugin=&severity=&since=`).

use std::net::IpAddr;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use mimosa_models::{Offense, Severity};
use mimosa_store::{OffenseFilter, OffenseStats};
use serde::Deserialize;

use crate::handlers::{clamp_limit, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub source_ip: Option<IpAddr>,
    pub plugin: Option<String>,
    pub severity: Option<Severity>,
    pub since: Option<DateTime<Utc>>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Json<Vec<Offense>>> {
    let filter = OffenseFilter { source_ip: query.source_ip, plugin: query.plugin, severity: query.severity, since: query.since };
    Ok(Json(state.offenses.list(&filter, clamp_limit(query.limit)).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub since: DateTime<Utc>,
}

pub async fn stats(State(state): State<AppState>, Query(query): Query<StatsQuery>) -> ApiResult<Json<OffenseStats>> {
    Ok(Json(state.offenses.stats(query.since).await?))
}
