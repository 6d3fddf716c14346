// [apps/mimosa-server/src/bin/seed.rs]
//! Plants a demo admin account, a demo firewall, and a handful of
//! sample offenses so a fresh homelab deployment has something to
//! look at before any real traffic arrives. Goes through the same
//! repositories the server itself uses, not raw SQL.

use std::net::IpAddr;

use chrono::Utc;
use mimosa_models::{clean_description, FirewallConfig, FirewallKind, Offense, Severity};
use mimosa_server::handlers::auth::hash_password;
use mimosa_store::{FirewallRepository, OffenseRepository, StoreClient, UserRepository};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    mimosa_telemetry::init_tracing("mimosa-seed");

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "file:./data/mimosa.db".to_string());
    let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();
    let store = StoreClient::connect(&database_url, database_token).await?;

    let users = UserRepository::new(store.clone());
    let username = std::env::var("SEED_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "changeme".to_string());
    match users.create(&username, &hash_password(&password)).await {
        Ok(id) => info!("seeded admin user '{}' (id {})", username, id),
        Err(mimosa_store::StoreError::Conflict(_)) => info!("admin user '{}' already exists, skipping", username),
        Err(e) => return Err(e.into()),
    }

    let firewalls = FirewallRepository::new(store.clone());
    if firewalls.list_all().await?.is_empty() {
        let demo = FirewallConfig {
            id: 0,
            name: "demo-opnsense".to_string(),
            kind: FirewallKind::OpnSense,
            base_url: "https://192.168.1.1".to_string(),
            username: "root".to_string(),
            password: "changeme".to_string(),
            verify_tls: false,
            apply_changes: true,
            enabled: false,
        };
        let id = firewalls.upsert(&demo).await?;
        info!("seeded demo firewall (id {}), disabled until credentials are set", id);
    } else {
        info!("firewalls table already populated, skipping demo firewall");
    }

    let offenses = OffenseRepository::new(store);
    let samples: [(&str, &str, Option<&str>, Severity); 3] = [
        ("203.0.113.7", "failed ssh login for root", Some("sshd"), Severity::Alto),
        ("198.51.100.23", "repeated 404 on /wp-admin.php (scan)", Some("proxy_trap"), Severity::Medio),
        ("192.0.2.88", "honeypot connection on port 23/tcp", Some("port_detector"), Severity::Bajo),
    ];

    for (ip, description, plugin, severity) in samples {
        let source_ip: IpAddr = match ip.parse() {
            Ok(ip) => ip,
            Err(e) => {
                warn!("seed: skipping malformed sample ip {}: {}", ip, e);
                continue;
            }
        };
        let offense = Offense {
            id: 0,
            source_ip,
            description: description.to_string(),
            description_clean: clean_description(description),
            plugin: plugin.map(|p| p.to_string()),
            severity: Some(severity),
            host: None,
            path: None,
            context: serde_json::Map::new(),
            created_at: Utc::now(),
        };
        offenses.insert(&offense).await?;
    }
    info!("seeded {} sample offenses", samples.len());

    info!("seed complete");
    Ok(())
}
