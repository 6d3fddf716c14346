// [apps/mimosa-server/src/services/ingestion/submit.rs]
//! The single entry point every offense producer (ProxyTrap,
//! PortDetector, MimosaNPM) funnels through (§4.9): store the offense,
//! evaluate escalation rules, add or extend a block, then broadcast.
//! Whitelisting never skips this pipeline; it only gates whether a
//! resulting block gets pushed to the firewalls, via
//! `BlockManager::should_sync`.

use chrono::{Duration, Utc};
use mimosa_models::{derive_event_id, Offense, OffenseEvent};
use mimosa_rules::{evaluate, CountContext, OffenseContext};
use serde_json::Map;
use tracing::instrument;

use crate::services::block_manager::AddBlockRequest;
use crate::state::AppState;

#[instrument(skip(state, event), fields(ip = %event.source_ip, plugin = ?event.plugin))]
pub async fn submit(state: &AppState, event: OffenseEvent) -> anyhow::Result<()> {
    let now = Utc::now();
    let description_clean = mimosa_models::clean_description(&event.description);
    let event_id = derive_event_id(&event.description, &event.context);

    let offense = Offense {
        id: 0,
        source_ip: event.source_ip,
        description: event.description.clone(),
        description_clean: description_clean.clone(),
        plugin: event.plugin.clone(),
        severity: event.severity,
        host: event.host.clone(),
        path: event.path.clone(),
        context: event.context.clone(),
        created_at: now,
    };

    state.offenses.insert(&offense).await?;
    state.ip_profiles.touch(event.source_ip, now).await?;

    let rules = state.rules.list_enabled().await?;
    let offenses_last_hour = state.offenses.count_since(event.source_ip, now - Duration::hours(1)).await?;
    let offenses_total = state.offenses.count_total(event.source_ip).await?;
    let profile = state.ip_profiles.get(event.source_ip).await?;
    let blocks_total = profile.map(|p| p.blocks_total as u32).unwrap_or(0);

    let plugin = event.plugin.as_deref().unwrap_or("");
    let context = OffenseContext { plugin, event_id: &event_id, description: &description_clean };
    let counts = CountContext { offenses_last_hour, offenses_total, blocks_total };

    let decision = evaluate(&rules, &context, &counts);

    if let Some(decision) = decision {
        let existing = state.block_manager.get_active(event.source_ip).await;
        let skip = matches!(&existing, Some(block) if block.is_permanent());

        if !skip {
            let request = AddBlockRequest {
                ip: event.source_ip,
                reason: format!("rule:{}", decision.matched_rule_id),
                reason_text: Some(description_clean.clone()),
                reason_plugin: event.plugin.clone(),
                severity: event.severity,
                source: "escalation".to_string(),
                duration_minutes: decision.block_minutes,
            };
            let block = state.block_manager.add(request).await?;
            state.ip_profiles.increment_blocks_total(event.source_ip).await?;
            state.event_bus.publish(mimosa_models::LiveEvent::Block(block.clone()));
            for firewall_id in active_firewall_ids(state).await.unwrap_or_default() {
                state.nudge_synchronizer(firewall_id).await;
            }
        }
    }

    state.event_bus.publish(mimosa_models::LiveEvent::Offense(offense));
    Ok(())
}

async fn active_firewall_ids(state: &AppState) -> anyhow::Result<Vec<u64>> {
    Ok(state.firewalls.list_enabled().await?.into_iter().map(|f| f.id).collect())
}

/// Per-plugin ignore check: a host/path/status triple with wildcards
/// that short-circuits before `submit` is ever called.
pub fn is_ignored(ignore_rules: &[IgnoreRule], host: Option<&str>, path: Option<&str>, status: Option<u16>) -> bool {
    ignore_rules.iter().any(|rule| rule.matches(host, path, status))
}

#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub host: String,
    pub path: String,
    pub status: Option<u16>,
}

impl IgnoreRule {
    fn matches(&self, host: Option<&str>, path: Option<&str>, status: Option<u16>) -> bool {
        let host_ok = mimosa_models::wildcard::matches(&self.host, host.unwrap_or(""));
        let path_ok = mimosa_models::wildcard::matches(&self.path, path.unwrap_or(""));
        let status_ok = match (self.status, status) {
            (None, _) => true,
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
        };
        host_ok && path_ok && status_ok
    }
}

/// Empty context map helper shared by the listener tasks that don't
/// carry structured fields beyond host/path.
pub fn empty_context() -> Map<String, serde_json::Value> {
    Map::new()
}
