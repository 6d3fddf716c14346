// [apps/mimosa-server/src/config.rs]
//! Environment/`.env`-driven startup configuration (§4.1, §6). A
//! first firewall can be bootstrapped from `INITIAL_FIREWALL_*`
//! variables when the `firewalls` table is still empty, so a fresh
//! homelab deployment has something to synchronize against before an
//! operator ever opens the admin UI.

use mimosa_models::{FirewallConfig, FirewallKind};

/// Process-wide settings read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_token: Option<String>,
    pub port: u16,
    pub sync_interval_secs: u64,
    pub stats_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "file:./data/mimosa.db".to_string()),
            database_token: std::env::var("TURSO_AUTH_TOKEN").ok(),
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080),
            sync_interval_secs: std::env::var("SYNC_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(300),
            stats_interval_secs: std::env::var("STATS_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
        }
    }
}

/// Reads `INITIAL_FIREWALL_*` and returns a config to seed if all the
/// required variables are present. Absent variables mean "no
/// bootstrap firewall" rather than an error, since a homelab operator
/// may prefer to add the first firewall entirely through the admin UI.
pub fn initial_firewall_from_env() -> Option<FirewallConfig> {
    let name = std::env::var("INITIAL_FIREWALL_NAME").ok()?;
    let kind_raw = std::env::var("INITIAL_FIREWALL_KIND").ok()?;
    let base_url = std::env::var("INITIAL_FIREWALL_BASE_URL").ok()?;
    let username = std::env::var("INITIAL_FIREWALL_USERNAME").ok()?;
    let password = std::env::var("INITIAL_FIREWALL_PASSWORD").ok()?;

    let kind = match kind_raw.to_lowercase().as_str() {
        "opnsense" => FirewallKind::OpnSense,
        "pfsense" => FirewallKind::PfSense,
        _ => return None,
    };

    let verify_tls = std::env::var("INITIAL_FIREWALL_VERIFY_TLS").ok().and_then(|v| v.parse().ok()).unwrap_or(true);
    let apply_changes = std::env::var("INITIAL_FIREWALL_APPLY_CHANGES").ok().and_then(|v| v.parse().ok()).unwrap_or(true);

    Some(FirewallConfig {
        id: 0,
        name,
        kind,
        base_url,
        username,
        password,
        verify_tls,
        apply_changes,
        enabled: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_vars_yield_no_bootstrap_firewall() {
        std::env::remove_var("INITIAL_FIREWALL_NAME");
        assert!(initial_firewall_from_env().is_none());
    }
}
