// [apps/mimosa-server/src/services/block_manager.rs]
//! The block lifecycle manager (§4.6): the authoritative in-memory map
//! of active blocks, mirrored to the store under one lock. Firewall
//! I/O never happens while the lock is held; the synchronizer reads a
//! consistent snapshot via `list_active_for_sync` and does its remote
//! calls afterward.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use mimosa_enrichment::{is_whitelisted, DnsResolver};
use mimosa_models::{Block, BlockHistoryAction, BlockHistoryEntry, Severity, WhitelistEntry};
use mimosa_store::{BlockRepository, StoreError};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// What the escalation pipeline (or an admin endpoint) asks the
/// manager to do; the severity drives the reason-overwrite rule.
#[derive(Debug, Clone)]
pub struct AddBlockRequest {
    pub ip: IpAddr,
    pub reason: String,
    pub reason_text: Option<String>,
    pub reason_plugin: Option<String>,
    pub severity: Option<Severity>,
    pub source: String,
    pub duration_minutes: Option<u32>,
}

pub struct BlockManager {
    store: Arc<BlockRepository>,
    active: Mutex<HashMap<IpAddr, Block>>,
}

impl BlockManager {
    /// Loads the in-memory map from the store's active rows. Called at
    /// startup and whenever a consistency check fails.
    pub async fn load(store: Arc<BlockRepository>) -> Result<Self, StoreError> {
        let rows = store.list_active().await?;
        let active = rows.into_iter().map(|b| (b.ip, b)).collect();
        Ok(Self { store, active: Mutex::new(active) })
    }

    #[instrument(skip(self, request), fields(ip = %request.ip))]
    pub async fn add(&self, request: AddBlockRequest) -> Result<Block, StoreError> {
        let now = Utc::now();
        let requested_expiry = request.duration_minutes.map(|m| now + ChronoDuration::minutes(m as i64));

        let mut guard = self.active.lock().await;

        let block = if let Some(existing) = guard.get(&request.ip).cloned() {
            let expires_at = extend_expiry(existing.expires_at, requested_expiry);
            let mut updated = existing.clone();
            updated.expires_at = expires_at;
            updated.active = true;

            if new_reason_outranks(request.severity, existing.reason_severity) {
                updated.reason = request.reason.clone();
                updated.reason_text = request.reason_text.clone();
                updated.reason_plugin = request.reason_plugin.clone();
                updated.reason_severity = request.severity;
            }

            self.store.upsert(&updated).await?;
            self.store
                .record_history(&BlockHistoryEntry {
                    ip: request.ip,
                    reason: updated.reason.clone(),
                    action: BlockHistoryAction::Extend,
                    at: now,
                    source: Some(request.source.clone()),
                })
                .await?;
            updated
        } else {
            let block = Block {
                ip: request.ip,
                reason: request.reason.clone(),
                reason_text: request.reason_text.clone(),
                reason_plugin: request.reason_plugin.clone(),
                reason_severity: request.severity,
                source: request.source.clone(),
                created_at: now,
                expires_at: requested_expiry,
                active: true,
                sync_with_firewall: true,
            };
            self.store.upsert(&block).await?;
            self.store
                .record_history(&BlockHistoryEntry {
                    ip: request.ip,
                    reason: block.reason.clone(),
                    action: BlockHistoryAction::Add,
                    at: now,
                    source: Some(request.source.clone()),
                })
                .await?;
            info!("new block added for {}", request.ip);
            block
        };

        guard.insert(request.ip, block.clone());
        Ok(block)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, ip: IpAddr, source: Option<&str>) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut guard = self.active.lock().await;

        if guard.remove(&ip).is_none() {
            warn!("remove requested for an ip with no active block: {}", ip);
            return Ok(());
        }

        self.store.deactivate(ip).await?;
        self.store
            .record_history(&BlockHistoryEntry {
                ip,
                reason: "manual removal".into(),
                action: BlockHistoryAction::Remove,
                at: now,
                source: source.map(|s| s.to_string()),
            })
            .await?;
        Ok(())
    }

    pub async fn get_active(&self, ip: IpAddr) -> Option<Block> {
        self.active.lock().await.get(&ip).cloned()
    }

    /// Returns every active block, suitable for the synchronizer's
    /// desired-set computation. A snapshot clone; no lock is held
    /// while callers do I/O against it.
    pub async fn list_active_for_sync(&self) -> Vec<Block> {
        self.active.lock().await.values().cloned().collect()
    }

    /// Whether an active block for `ip` should be pushed to the
    /// firewalls (§4.6): it must still be active, opted into sync, and
    /// the ip must not be whitelisted. Whitelisting never prevents a
    /// block from being recorded, only from being synced out.
    pub async fn should_sync(&self, ip: IpAddr, whitelist: &[WhitelistEntry], resolver: &DnsResolver) -> bool {
        let Some(block) = self.get_active(ip).await else {
            return false;
        };
        if !block.sync_with_firewall {
            return false;
        }
        !is_whitelisted(ip, whitelist, resolver).await
    }

    pub async fn list(&self, include_expired: bool, limit: u32) -> Result<Vec<Block>, StoreError> {
        if include_expired {
            self.store.list_all(limit).await
        } else {
            let guard = self.active.lock().await;
            let mut blocks: Vec<Block> = guard.values().cloned().collect();
            blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            blocks.truncate(limit as usize);
            Ok(blocks)
        }
    }

    /// Promotes blocks whose `expires_at <= now` to inactive. Called at
    /// the start of every synchronizer tick (§4.8).
    #[instrument(skip(self))]
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<Block>, StoreError> {
        let due = self.store.due_for_expiry(now).await?;
        if due.is_empty() {
            return Ok(due);
        }

        let mut guard = self.active.lock().await;
        for block in &due {
            self.store.deactivate(block.ip).await?;
            self.store
                .record_history(&BlockHistoryEntry {
                    ip: block.ip,
                    reason: block.reason.clone(),
                    action: BlockHistoryAction::Expire,
                    at: now,
                    source: None,
                })
                .await?;
            guard.remove(&block.ip);
        }
        info!("purged {} expired blocks", due.len());
        Ok(due)
    }

    /// Reloads the in-memory map from the store if the in-memory count
    /// disagrees with the store's active count (§4.6, §7
    /// Internal-invariant). Cheap to call every tick since the common
    /// case is a single `COUNT(*)` query.
    #[instrument(skip(self))]
    pub async fn reload_if_inconsistent(&self) -> Result<bool, StoreError> {
        let store_count = self.store.count_active().await?;
        let memory_count = self.active.lock().await.len() as u64;

        if store_count == memory_count {
            return Ok(false);
        }

        warn!(
            "block manager in-memory count ({}) disagreed with store ({}); reloading",
            memory_count, store_count
        );
        let rows = self.store.list_active().await?;
        let mut guard = self.active.lock().await;
        *guard = rows.into_iter().map(|b| (b.ip, b)).collect();
        Ok(true)
    }
}

fn extend_expiry(existing: Option<DateTime<Utc>>, requested: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (existing, requested) {
        (None, _) => None,
        (Some(_), None) => None,
        (Some(current), Some(new)) => Some(current.max(new)),
    }
}

/// A manual/admin block carries no severity and outranks every
/// automated reason; among automated reasons, the higher severity
/// wins. Equal severities keep the existing reason.
fn new_reason_outranks(new_severity: Option<Severity>, existing_severity: Option<Severity>) -> bool {
    match (new_severity, existing_severity) {
        (None, None) => false,
        (None, Some(_)) => true,
        (Some(_), None) => false,
        (Some(new), Some(existing)) => new > existing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn extending_a_permanent_block_stays_permanent() {
        let now = Utc::now();
        assert_eq!(extend_expiry(None, Some(now + Duration::minutes(60))), None);
    }

    #[test]
    fn escalating_to_permanent_drops_expiry() {
        let now = Utc::now();
        assert_eq!(extend_expiry(Some(now + Duration::minutes(10)), None), None);
    }

    #[test]
    fn extension_never_shortens_expiry() {
        let now = Utc::now();
        let current = now + Duration::minutes(60);
        let shorter = now + Duration::minutes(10);
        assert_eq!(extend_expiry(Some(current), Some(shorter)), Some(current));
    }

    #[test]
    fn manual_reason_outranks_any_automated_reason() {
        assert!(new_reason_outranks(None, Some(Severity::Critico)));
        assert!(!new_reason_outranks(Some(Severity::Critico), None));
    }

    #[test]
    fn higher_severity_outranks_lower() {
        assert!(new_reason_outranks(Some(Severity::Critico), Some(Severity::Bajo)));
        assert!(!new_reason_outranks(Some(Severity::Bajo), Some(Severity::Critico)));
    }
}
