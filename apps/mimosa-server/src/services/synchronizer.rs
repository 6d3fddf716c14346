// [apps/mimosa-server/src/services/synchronizer.rs]
//! One background task per enabled firewall (C8, §4.8): purges expired
//! blocks, computes the three separately-reconciled desired alias sets
//! (temporal blocks, permanent blacklist, whitelist) plus the port
//! honeypot aliases, diffs each against the gateway's reported state,
//! and pushes the minimal delta. Runs on a fixed interval and wakes
//! early whenever `AppState::nudge_synchronizer` fires for this
//! firewall's id.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use mimosa_enrichment::is_whitelisted;
use mimosa_firewall::{build_driver, diff_alias, FirewallDriver, PortProtocol, ALIAS_BLACKLIST, ALIAS_TEMPORAL, ALIAS_WHITELIST};
use mimosa_models::{whitelist::WhitelistEntryKind, FirewallConfig, LiveEvent, Protocol};
use tokio::sync::Notify;
use tokio::time::interval;
use tracing::{error, info, instrument, warn};

use crate::state::AppState;

const MAX_BACKOFF_SECS: u64 = 600;

/// Spawns the synchronizer loop for one firewall. Returns immediately;
/// the loop runs until the process shuts down or the firewall is
/// disabled/deleted and the kernel drops the task handle.
pub fn spawn(state: AppState, firewall_id: u64, interval_secs: u64, notify: Arc<Notify>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run_loop(state, firewall_id, interval_secs, notify).await;
    })
}

async fn run_loop(state: AppState, firewall_id: u64, interval_secs: u64, notify: Arc<Notify>) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    let mut backoff_secs = interval_secs;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = notify.notified() => {}
        }

        let config = match state.firewalls.list_enabled().await {
            Ok(configs) => configs.into_iter().find(|f| f.id == firewall_id),
            Err(e) => {
                error!("synchronizer[{}]: failed to load firewall config: {}", firewall_id, e);
                continue;
            }
        };

        let Some(config) = config else {
            info!("synchronizer[{}]: firewall no longer enabled, stopping", firewall_id);
            return;
        };

        match tick(&state, &config).await {
            Ok(()) => {
                backoff_secs = interval_secs;
            }
            Err(e) => {
                warn!("synchronizer[{}]: tick failed: {}", firewall_id, e);
                backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            }
        }
    }
}

#[instrument(skip(state, config), fields(firewall = %config.name))]
async fn tick(state: &AppState, config: &FirewallConfig) -> anyhow::Result<()> {
    state.block_manager.purge_expired(chrono::Utc::now()).await?;
    state.block_manager.reload_if_inconsistent().await?;

    let driver = build_driver(config);
    driver.health_check().await?;
    driver.ensure_aliases().await?;
    driver.install_mimosa_rules().await?;

    let (desired_temporal, desired_blacklist) = desired_block_members(state).await?;
    let desired_whitelist = desired_whitelist_members(state).await?;

    let mut changed = false;
    for (alias, desired) in [(ALIAS_TEMPORAL, &desired_temporal), (ALIAS_BLACKLIST, &desired_blacklist), (ALIAS_WHITELIST, &desired_whitelist)]
    {
        let current = driver.read_alias_contents(alias).await?;
        let diff = diff_alias(&current, desired);
        if diff.is_empty() {
            continue;
        }
        info!("synchronizer[{}]: {} diff: +{} -{}", config.id, alias, diff.to_add.len(), diff.to_remove.len());
        driver.apply_diff(alias, &diff.to_add, &diff.to_remove).await?;
        changed = true;
    }

    if let Some(plugins) = state.settings.get_plugin_config().await? {
        if plugins.port_detector.enabled {
            for (protocol, ports) in desired_port_members(&plugins.port_detector.rules) {
                driver.ports_alias_sync(protocol, &ports).await?;
            }
        }
    }

    if changed {
        let stats = crate::services::stats::snapshot(state).await?;
        state.event_bus.publish(LiveEvent::Stats(stats));
    }
    Ok(())
}

/// The two block-derived desired sets: active, sync-eligible,
/// non-whitelisted blocks split into temporal (have an expiry) and
/// blacklist (permanent).
async fn desired_block_members(state: &AppState) -> anyhow::Result<(Vec<IpAddr>, Vec<IpAddr>)> {
    let whitelist = state.whitelist.list().await?;
    let active = state.block_manager.list_active_for_sync().await;

    let mut temporal = Vec::new();
    let mut blacklist = Vec::new();
    for block in active {
        if !block.sync_with_firewall {
            continue;
        }
        if is_whitelisted(block.ip, &whitelist, &state.dns_resolver).await {
            continue;
        }
        if block.is_permanent() {
            blacklist.push(block.ip);
        } else {
            temporal.push(block.ip);
        }
    }
    Ok((temporal, blacklist))
}

/// The whitelist-derived desired set: bare-IP and resolved-FQDN
/// entries, pushed as pass-list members. Network (CIDR) entries aren't
/// single addresses and are left for the gateway's own pass rule
/// against the alias's narrower membership to not apply to; they still
/// protect offenses via `BlockManager::should_sync`, just not via this
/// alias.
async fn desired_whitelist_members(state: &AppState) -> anyhow::Result<Vec<IpAddr>> {
    let entries = state.whitelist.list().await?;
    let mut members = Vec::new();
    for entry in &entries {
        match mimosa_models::whitelist::classify_entry(&entry.cidr) {
            WhitelistEntryKind::BareIp(ip) => members.push(ip),
            WhitelistEntryKind::Network(_) => {}
            WhitelistEntryKind::Fqdn(fqdn) => {
                if let Ok(resolved) = state.dns_resolver.resolve_fqdn(&fqdn).await {
                    members.extend(resolved);
                } else {
                    warn!("synchronizer: whitelist fqdn {} failed to resolve, omitting from whitelist alias", fqdn);
                }
            }
        }
    }
    Ok(members)
}

/// The configured port honeypot ports, grouped by protocol, expanded
/// from each rule's `PortSpec`.
fn desired_port_members(rules: &[mimosa_models::PortRule]) -> Vec<(PortProtocol, Vec<u16>)> {
    let mut tcp = Vec::new();
    let mut udp = Vec::new();
    for rule in rules {
        let target = match rule.protocol {
            Protocol::Tcp => &mut tcp,
            Protocol::Udp => &mut udp,
        };
        for port in rule.spec.all_ports() {
            if !target.contains(&port) {
                target.push(port);
            }
        }
    }
    vec![(PortProtocol::Tcp, tcp), (PortProtocol::Udp, udp)]
}
