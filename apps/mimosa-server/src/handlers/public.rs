// [apps/mimosa-server/src/handlers/public.rs]
//! Unauthenticated, redacted read surface (§6 `/api/public/*`): enough
//! for a public status page without handing out source IPs to anyone
//! who can reach the API.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use mimosa_models::{Severity, StatsSnapshot};
use serde::{Deserialize, Serialize};

use crate::handlers::{clamp_limit, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RedactedOffense {
    pub description_clean: String,
    pub plugin: Option<String>,
    pub severity: Option<Severity>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<u32>,
}

pub async fn feed(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Result<Json<Vec<RedactedOffense>>, ApiError> {
    let offenses = state.offenses.recent(clamp_limit(query.limit)).await?;
    let redacted = offenses
        .into_iter()
        .map(|o| RedactedOffense {
            description_clean: o.description_clean,
            plugin: o.plugin,
            severity: o.severity,
            created_at: o.created_at,
        })
        .collect();
    Ok(Json(redacted))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsSnapshot>, ApiError> {
    let snapshot = crate::services::stats::snapshot(&state).await.map_err(ApiError::Internal)?;
    Ok(Json(snapshot))
}

/// A coarse count-by-plugin breakdown over the most recent offenses.
/// Geo/country aggregates from §6 (`heatmap`, `offenses_by_country`,
/// `mimosa_location`) are not implemented: `ip_profiles.geo_json` is an
/// opaque provider blob, not a structured country field, and adding
/// one is outside this pass's scope.
pub async fn offense_types(State(state): State<AppState>) -> Result<Json<std::collections::HashMap<String, u64>>, ApiError> {
    let offenses = state.offenses.recent(2000).await?;
    let mut counts = std::collections::HashMap::new();
    for offense in offenses {
        *counts.entry(offense.plugin.unwrap_or_else(|| "unknown".to_string())).or_insert(0u64) += 1;
    }
    Ok(Json(counts))
}
