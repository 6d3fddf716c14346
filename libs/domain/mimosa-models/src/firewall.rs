//! [libs/domain/mimosa-models/src/firewall.rs]
use serde::{Deserialize, Serialize};

/// Which REST dialect a configured firewall gateway speaks. Drives
/// which `FirewallDriver` implementation the synchronizer dispatches
/// to (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallKind {
    OpnSense,
    PfSense,
}

/// A configured firewall gateway to keep in sync with the active block
/// set, the whitelist, and the configured port honeypots. The alias
/// and rule names a gateway receives are fixed (§3, never configurable
/// per row); this struct only carries what's needed to reach and
/// authenticate against the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallConfig {
    pub id: u64,
    pub name: String,
    pub kind: FirewallKind,
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub verify_tls: bool,
    /// Whether a sync tick triggers the gateway's apply/reconfigure
    /// step after writing an alias or rule, or only stages the change
    /// for an operator to apply by hand.
    pub apply_changes: bool,
    pub enabled: bool,
}
