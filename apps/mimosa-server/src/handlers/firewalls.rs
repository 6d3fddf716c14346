// [apps/mimosa-server/src/handlers/firewalls.rs]
//! Firewall gateway CRUD plus connectivity test, setup, alias/rule
//! inspection, and scoped block views (§4.7, §6). Creating or editing
//! a firewall here takes effect for the synchronizer the next time the
//! kernel starts; this facade does not hot-spawn a synchronizer task
//! for a row added after boot.

use std::collections::HashMap;
use std::net::IpAddr;

use axum::extract::{Path, State};
use axum::Json;
use mimosa_firewall::{build_driver, ConnectivityProbe, FirewallDriver, FirewallRule, ALIAS_BLACKLIST, ALIAS_TEMPORAL, ALIAS_WHITELIST};
use mimosa_models::FirewallConfig;
use serde::{Deserialize, Serialize};

use crate::handlers::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<FirewallConfig>>> {
    Ok(Json(state.firewalls.list_all().await?))
}

pub async fn create(State(state): State<AppState>, Json(mut config): Json<FirewallConfig>) -> ApiResult<Json<FirewallConfig>> {
    config.id = 0;
    let id = state.firewalls.upsert(&config).await?;
    config.id = id;
    if config.enabled {
        state.register_synchronizer(id).await;
    }
    Ok(Json(config))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(mut config): Json<FirewallConfig>,
) -> ApiResult<Json<FirewallConfig>> {
    config.id = id;
    state.firewalls.upsert(&config).await?;
    if config.enabled {
        let notify = state.register_synchronizer(id).await;
        notify.notify_one();
    } else {
        state.unregister_synchronizer(id).await;
    }
    Ok(Json(config))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<()> {
    state.firewalls.delete(id).await?;
    state.unregister_synchronizer(id).await;
    Ok(())
}

async fn load_config(state: &AppState, id: u64) -> ApiResult<FirewallConfig> {
    state.firewalls.list_all().await?.into_iter().find(|c| c.id == id).ok_or(ApiError::NotFound)
}

/// Tests credentials/reachability without touching the synchronizer's
/// alias state.
pub async fn test(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<ConnectivityProbe>> {
    let config = load_config(&state, id).await?;
    let driver = build_driver(&config);
    Ok(Json(driver.test_connectivity().await))
}

/// Creates the fixed Mimosa aliases and filter rules on the gateway,
/// so a freshly added firewall is ready for the synchronizer's next
/// tick without waiting on it.
pub async fn setup(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<()> {
    let config = load_config(&state, id).await?;
    let driver = build_driver(&config);
    driver.ensure_aliases().await?;
    driver.install_mimosa_rules().await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AliasSnapshot {
    pub temporal: Vec<IpAddr>,
    pub blacklist: Vec<IpAddr>,
    pub whitelist: Vec<IpAddr>,
}

pub async fn aliases(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<AliasSnapshot>> {
    let config = load_config(&state, id).await?;
    let driver = build_driver(&config);
    Ok(Json(AliasSnapshot {
        temporal: driver.read_alias_contents(ALIAS_TEMPORAL).await?,
        blacklist: driver.read_alias_contents(ALIAS_BLACKLIST).await?,
        whitelist: driver.read_alias_contents(ALIAS_WHITELIST).await?,
    }))
}

#[derive(Debug, Serialize)]
pub struct BlacklistSnapshot {
    pub members: Vec<IpAddr>,
}

pub async fn blacklist(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<BlacklistSnapshot>> {
    let config = load_config(&state, id).await?;
    let driver = build_driver(&config);
    let members = driver.read_alias_contents(ALIAS_BLACKLIST).await?;
    Ok(Json(BlacklistSnapshot { members }))
}

#[derive(Debug, Serialize)]
pub struct FirewallBlocks {
    pub ips: Vec<IpAddr>,
}

/// The union of the temporal and blacklist aliases as the gateway
/// currently reports them, i.e. what this firewall is actually
/// blocking right now (as opposed to Mimosa's desired state).
pub async fn blocks(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<FirewallBlocks>> {
    let config = load_config(&state, id).await?;
    let driver = build_driver(&config);
    let mut ips = driver.read_alias_contents(ALIAS_TEMPORAL).await?;
    ips.extend(driver.read_alias_contents(ALIAS_BLACKLIST).await?);
    ips.sort();
    ips.dedup();
    Ok(Json(FirewallBlocks { ips }))
}

pub async fn list_rules(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<Vec<FirewallRule>>> {
    let config = load_config(&state, id).await?;
    let driver = build_driver(&config);
    Ok(Json(driver.list_rules().await?))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRuleRequest {
    pub enabled: bool,
}

pub async fn toggle_rule(
    State(state): State<AppState>,
    Path((id, rule_id)): Path<(u64, String)>,
    Json(request): Json<ToggleRuleRequest>,
) -> ApiResult<()> {
    let config = load_config(&state, id).await?;
    let driver = build_driver(&config);
    driver.toggle_rule(&rule_id, request.enabled).await?;
    Ok(())
}

pub async fn delete_rule(State(state): State<AppState>, Path((id, rule_id)): Path<(u64, String)>) -> ApiResult<()> {
    let config = load_config(&state, id).await?;
    let driver = build_driver(&config);
    driver.delete_rule(&rule_id).await?;
    Ok(())
}

/// A quick per-firewall health rollup for the dashboard (§6
/// `dashboard/health`), reusing the same probe `test` does.
pub async fn health_summary(State(state): State<AppState>) -> ApiResult<Json<HashMap<u64, ConnectivityProbe>>> {
    let configs = state.firewalls.list_enabled().await?;
    let mut summary = HashMap::with_capacity(configs.len());
    for config in configs {
        let driver = build_driver(&config);
        summary.insert(config.id, driver.test_connectivity().await);
    }
    Ok(Json(summary))
}
