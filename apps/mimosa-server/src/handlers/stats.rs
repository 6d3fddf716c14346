// [apps/mimosa-server/src/handlers/stats.rs]
//! Point-in-time stats rollup (§4.10, §6 `GET /api/stats`). Reuses the
//! same snapshot the synchronizer and the stats broadcaster publish,
//! so a dashboard's initial load and its live feed never disagree.

use axum::extract::State;
use axum::Json;
use mimosa_models::StatsSnapshot;

use crate::handlers::ApiError;
use crate::state::AppState;

pub async fn current(State(state): State<AppState>) -> Result<Json<StatsSnapshot>, ApiError> {
    let snapshot = crate::services::stats::snapshot(&state).await.map_err(ApiError::Internal)?;
    Ok(Json(snapshot))
}
