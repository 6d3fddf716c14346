// [apps/mimosa-server/src/handlers/rules.rs]
//! Escalation rule CRUD (§4.5, §6).

use axum::extract::{Path, State};
use axum::Json;
use mimosa_models::Rule;

use crate::handlers::ApiResult;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Rule>>> {
    Ok(Json(state.rules.list_all().await?))
}

pub async fn create(State(state): State<AppState>, Json(mut rule): Json<Rule>) -> ApiResult<Json<Rule>> {
    rule.id = 0;
    let id = state.rules.upsert(&rule).await?;
    rule.id = id;
    Ok(Json(rule))
}

pub async fn update(State(state): State<AppState>, Path(id): Path<u64>, Json(mut rule): Json<Rule>) -> ApiResult<Json<Rule>> {
    rule.id = id;
    state.rules.upsert(&rule).await?;
    Ok(Json(rule))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<()> {
    state.rules.delete(id).await?;
    Ok(())
}
