// [libs/infra/mimosa-firewall/src/driver.rs]
use std::net::IpAddr;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alias::PortProtocol;
use crate::error::FirewallError;

/// A filter/rule row as the gateway reports it, identified by its
/// gateway-native id (a pfSense tracker or an OPNsense uuid).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    pub description: String,
    pub enabled: bool,
    pub action: String,
    pub source_alias: String,
}

/// The result of a reachability probe (§6 `/api/firewalls/{id}/test`).
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityProbe {
    pub online: bool,
    pub message: String,
    pub latency_ms: u64,
}

/// The capability every firewall gateway must provide (§4.7). The
/// synchronizer and the admin handlers only ever talk to this trait;
/// OPNsense and pfSense differ enough in their REST shape that each
/// implementation owns its own HTTP client and endpoint layout.
#[async_trait]
pub trait FirewallDriver: Send + Sync {
    /// Confirms the gateway is reachable and the configured
    /// credentials are accepted.
    async fn health_check(&self) -> Result<(), FirewallError>;

    /// Times `health_check` and reports it in the shape the
    /// connectivity-test endpoint returns. Drivers rarely need to
    /// override this.
    async fn test_connectivity(&self) -> ConnectivityProbe {
        let start = Instant::now();
        match self.health_check().await {
            Ok(()) => ConnectivityProbe { online: true, message: "reachable".into(), latency_ms: start.elapsed().as_millis() as u64 },
            Err(e) => ConnectivityProbe { online: false, message: e.to_string(), latency_ms: start.elapsed().as_millis() as u64 },
        }
    }

    /// Creates any of the fixed Mimosa aliases (`alias::ALL_ALIASES`)
    /// that don't already exist on the gateway. Idempotent.
    async fn ensure_aliases(&self) -> Result<(), FirewallError>;

    /// Returns one alias's current member addresses, as the gateway
    /// reports them right now.
    async fn read_alias_contents(&self, alias: &str) -> Result<Vec<IpAddr>, FirewallError>;

    /// Replaces one alias's members with exactly `desired`.
    async fn set_alias_contents(&self, alias: &str, desired: &[IpAddr]) -> Result<(), FirewallError>;

    /// Applies a pre-computed add/remove delta against one alias. The
    /// default implementation reads the current contents, merges the
    /// delta, and calls `set_alias_contents`; a driver whose gateway
    /// supports incremental member add/remove can override this for
    /// less traffic per sync.
    async fn apply_diff(&self, alias: &str, to_add: &[IpAddr], to_remove: &[IpAddr]) -> Result<(), FirewallError> {
        let mut current = self.read_alias_contents(alias).await?;
        current.retain(|ip| !to_remove.contains(ip));
        for ip in to_add {
            if !current.contains(ip) {
                current.push(*ip);
            }
        }
        self.set_alias_contents(alias, &current).await
    }

    /// Adds a single address to an alias without disturbing the rest
    /// of its members.
    async fn add_to_alias(&self, alias: &str, entry: IpAddr) -> Result<(), FirewallError> {
        self.apply_diff(alias, &[entry], &[]).await
    }

    /// Adds several addresses to an alias in one round trip.
    async fn add_bulk(&self, alias: &str, entries: &[IpAddr]) -> Result<(), FirewallError> {
        self.apply_diff(alias, entries, &[]).await
    }

    /// Removes a single address from an alias.
    async fn remove_from_alias(&self, alias: &str, entry: IpAddr) -> Result<(), FirewallError> {
        self.apply_diff(alias, &[], &[entry]).await
    }

    /// Replaces a port alias's members with the given port numbers.
    /// Port aliases are numeric, not address, aliases, so they get
    /// their own entry point rather than reusing the IP-keyed methods.
    async fn ports_alias_sync(&self, protocol: PortProtocol, ports: &[u16]) -> Result<(), FirewallError>;

    /// Lists the filter rules currently on the gateway.
    async fn list_rules(&self) -> Result<Vec<FirewallRule>, FirewallError>;

    /// Fetches a single rule by its gateway-native id.
    async fn get_rule(&self, id: &str) -> Result<Option<FirewallRule>, FirewallError> {
        Ok(self.list_rules().await?.into_iter().find(|rule| rule.id == id))
    }

    /// Enables or disables a rule without deleting it.
    async fn toggle_rule(&self, id: &str, enabled: bool) -> Result<(), FirewallError>;

    /// Deletes a rule outright.
    async fn delete_rule(&self, id: &str) -> Result<(), FirewallError>;

    /// Creates the fixed Mimosa filter rules (`alias::MIMOSA_RULE_SPECS`)
    /// that don't already exist, matched by description. Idempotent.
    async fn install_mimosa_rules(&self) -> Result<(), FirewallError>;

    /// Triggers the gateway's apply/reconfigure step so staged alias
    /// and rule changes take effect.
    async fn apply(&self) -> Result<(), FirewallError>;
}
