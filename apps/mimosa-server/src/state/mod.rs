// [apps/mimosa-server/src/state/mod.rs]
//! The composition root: every repository, background-service handle,
//! and shared client the HTTP handlers and background workers reach
//! into. Built once in `kernel.rs` and cloned (cheaply, via `Arc`) into
//! every task and request.

use std::collections::HashMap;
use std::sync::Arc;

use mimosa_enrichment::{DnsResolver, EnrichmentClient};
use mimosa_store::{
    BlockRepository, FirewallRepository, IpProfileRepository, OffenseRepository, RuleRepository,
    SessionRepository, SettingsRepository, StoreClient, UserRepository, WhitelistRepository,
};
use tokio::sync::{Notify, RwLock};
use tracing::instrument;

use crate::config::AppConfig;
use crate::services::block_manager::BlockManager;
use crate::services::event_bus::EventBus;

/// Shared application state, cloned into every Axum handler and
/// background task. Every field is already cheaply cloneable
/// (`Arc`-backed or a plain value), so `AppState` itself derives
/// `Clone` rather than being passed behind its own `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,

    pub offenses: Arc<OffenseRepository>,
    pub blocks: Arc<BlockRepository>,
    pub ip_profiles: Arc<IpProfileRepository>,
    pub whitelist: Arc<WhitelistRepository>,
    pub rules: Arc<RuleRepository>,
    pub firewalls: Arc<FirewallRepository>,
    pub sessions: Arc<SessionRepository>,
    pub users: Arc<UserRepository>,
    pub settings: Arc<SettingsRepository>,

    pub block_manager: Arc<BlockManager>,
    pub event_bus: Arc<EventBus>,
    pub enrichment: Arc<EnrichmentClient>,
    pub dns_resolver: Arc<DnsResolver>,

    /// One wakeup handle per firewall id, so an admin action (adding a
    /// block, editing a firewall) can nudge that firewall's
    /// synchronizer instead of waiting out the fixed interval (§4.8).
    pub sync_notifiers: Arc<RwLock<HashMap<u64, Arc<Notify>>>>,
}

impl AppState {
    #[instrument(skip(store, config))]
    pub async fn new(store: StoreClient, config: AppConfig) -> Result<Self, mimosa_store::StoreError> {
        let blocks = Arc::new(BlockRepository::new(store.clone()));
        let offenses = Arc::new(OffenseRepository::new(store.clone()));
        let ip_profiles = Arc::new(IpProfileRepository::new(store.clone()));
        let whitelist = Arc::new(WhitelistRepository::new(store.clone()));
        let rules = Arc::new(RuleRepository::new(store.clone()));
        let firewalls = Arc::new(FirewallRepository::new(store.clone()));
        let sessions = Arc::new(SessionRepository::new(store.clone()));
        let users = Arc::new(UserRepository::new(store.clone()));
        let settings = Arc::new(SettingsRepository::new(store.clone()));

        let block_manager = Arc::new(BlockManager::load(blocks.clone()).await?);
        let event_bus = Arc::new(EventBus::new());

        let enrichment_base_url =
            std::env::var("ENRICHMENT_BASE_URL").unwrap_or_else(|_| "https://ipapi.co".to_string());
        let enrichment = Arc::new(EnrichmentClient::new(enrichment_base_url));
        let dns_resolver = Arc::new(DnsResolver::new());

        let enabled_firewalls = firewalls.list_enabled().await?;
        let mut notifiers = HashMap::with_capacity(enabled_firewalls.len());
        for firewall in enabled_firewalls {
            notifiers.insert(firewall.id, Arc::new(Notify::new()));
        }

        Ok(Self {
            config,
            offenses,
            blocks,
            ip_profiles,
            whitelist,
            rules,
            firewalls,
            sessions,
            users,
            settings,
            block_manager,
            event_bus,
            enrichment,
            dns_resolver,
            sync_notifiers: Arc::new(RwLock::new(notifiers)),
        })
    }

    /// Wakes the synchronizer for `firewall_id` immediately instead of
    /// waiting for its fixed interval. A no-op if that firewall has no
    /// registered notifier (e.g. it is disabled).
    pub async fn nudge_synchronizer(&self, firewall_id: u64) {
        if let Some(notify) = self.sync_notifiers.read().await.get(&firewall_id) {
            notify.notify_one();
        }
    }

    /// Registers a notifier for a firewall added or re-enabled after
    /// startup, so it participates in on-demand wakeups too.
    pub async fn register_synchronizer(&self, firewall_id: u64) -> Arc<Notify> {
        let mut guard = self.sync_notifiers.write().await;
        guard.entry(firewall_id).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    pub async fn unregister_synchronizer(&self, firewall_id: u64) {
        self.sync_notifiers.write().await.remove(&firewall_id);
    }
}
