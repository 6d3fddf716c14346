// [apps/mimosa-server/src/kernel.rs]
//! The composition root: connects the store, builds `AppState`, spawns
//! every background worker (per-firewall synchronizers, the ingestion
//! listeners enabled in `PluginConfig`, the stats broadcaster), and
//! serves the HTTP surface until shutdown.

use std::time::Duration;

use mimosa_models::LiveEvent;
use mimosa_store::StoreClient;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::config::{initial_firewall_from_env, AppConfig};
use crate::routes;
use crate::services::ingestion::{port_detector, proxy_trap};
use crate::services::synchronizer;
use crate::state::AppState;

pub struct MimosaKernel {
    config: AppConfig,
    state: AppState,
}

impl MimosaKernel {
    /// Connects the store (which applies the schema as part of
    /// connecting), builds `AppState`, and seeds the first firewall
    /// from the environment if none exist yet.
    #[instrument(skip(config))]
    pub async fn ignite(config: AppConfig) -> anyhow::Result<Self> {
        let store = StoreClient::connect(&config.database_url, config.database_token.clone()).await?;
        let state = AppState::new(store, config.clone()).await?;

        if state.firewalls.list_all().await?.is_empty() {
            if let Some(firewall) = initial_firewall_from_env() {
                info!("seeding initial firewall '{}' from environment", firewall.name);
                state.firewalls.upsert(&firewall).await?;
            }
        }

        Ok(Self { config, state })
    }

    /// Spawns every background worker and serves the HTTP surface
    /// until ctrl-c, then aborts the workers.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        for firewall in self.state.firewalls.list_enabled().await? {
            let notify = self.state.register_synchronizer(firewall.id).await;
            workers.push(synchronizer::spawn(
                self.state.clone(),
                firewall.id,
                self.config.sync_interval_secs,
                notify,
            ));
        }
        info!("{} firewall synchronizer(s) running", workers.len());

        if let Some(plugins) = self.state.settings.get_plugin_config().await? {
            if plugins.proxy_trap.enabled {
                workers.push(proxy_trap::spawn(self.state.clone(), plugins.proxy_trap.port));
            }
            if plugins.port_detector.enabled {
                for rule in &plugins.port_detector.rules {
                    for port in rule.spec.all_ports() {
                        workers.push(match rule.protocol {
                            mimosa_models::Protocol::Tcp => port_detector::spawn_tcp(self.state.clone(), port),
                            mimosa_models::Protocol::Udp => port_detector::spawn_udp(self.state.clone(), port),
                        });
                    }
                }
            }
        }

        workers.push(spawn_stats_broadcaster(self.state.clone(), self.config.stats_interval_secs));

        let app = routes::build(self.state.clone());
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("mimosa-server listening on {}", addr);

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        for worker in workers {
            worker.abort();
        }
        Ok(())
    }
}

/// Publishes a `StatsSnapshot` to every `/ws/live` subscriber on a
/// fixed interval, independent of whatever triggers a synchronizer to
/// publish one after applying a diff.
fn spawn_stats_broadcaster(state: AppState, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            match crate::services::stats::snapshot(&state).await {
                Ok(snapshot) => state.event_bus.publish(LiveEvent::Stats(snapshot)),
                Err(e) => warn!("stats broadcaster: failed to build snapshot: {}", e),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to install ctrl-c handler: {}", e);
        return;
    }
    info!("shutdown signal received");
}
