// [apps/mimosa-server/src/handlers/ips.rs]
//! IP profile listing, read, and on-demand refresh (§4.2, §6).

use std::net::IpAddr;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use mimosa_models::IpProfile;
use serde::Deserialize;

use crate::handlers::{clamp_limit, ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Json<Vec<IpProfile>>> {
    Ok(Json(state.ip_profiles.list(clamp_limit(query.limit)).await?))
}

pub async fn get(State(state): State<AppState>, Path(ip): Path<IpAddr>) -> ApiResult<Json<IpProfile>> {
    let profile = state.ip_profiles.get(ip).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(profile))
}

/// Forces a re-classification regardless of the profile's freshness
/// TTL; the lazy on-read refresh path this would normally go through
/// is out of scope, so an operator triggers it explicitly here.
pub async fn refresh(State(state): State<AppState>, Path(ip): Path<IpAddr>) -> ApiResult<Json<IpProfile>> {
    let mut profile = state.ip_profiles.get(ip).await?.ok_or(ApiError::NotFound)?;

    let classification = state.enrichment.classify(ip).await?;
    profile.geo_json = Some(classification.geo_json);
    profile.classification = classification.classification;
    profile.is_proxy = classification.is_proxy;
    profile.is_mobile = classification.is_mobile;
    profile.is_hosting = classification.is_hosting;
    profile.reverse_dns = state.dns_resolver.reverse_lookup(ip).await;
    profile.enriched_at = Some(Utc::now());

    state.ip_profiles.save_enrichment(&profile).await?;
    Ok(Json(profile))
}
