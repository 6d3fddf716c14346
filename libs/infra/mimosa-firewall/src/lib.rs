// [libs/infra/mimosa-firewall/src/lib.rs]
//! Gateway adapters for the firewall synchronizer (§4.7, §4.8): a
//! capability trait dispatched by `FirewallConfig.kind`, concrete
//! OPNsense/pfSense REST drivers, and the pure alias-diff algorithm
//! that turns "desired active blocks" into the minimal add/remove set.

pub mod alias;
pub mod diff;
pub mod driver;
pub mod error;
pub mod opnsense;
pub mod pfsense;

pub use alias::{PortProtocol, ALIAS_BLACKLIST, ALIAS_PORTS_TCP, ALIAS_PORTS_UDP, ALIAS_TEMPORAL, ALIAS_WHITELIST, ALL_ALIASES};
pub use diff::{diff_alias, AliasDiff};
pub use driver::{ConnectivityProbe, FirewallDriver, FirewallRule};
pub use error::FirewallError;
pub use opnsense::OpnSenseDriver;
pub use pfsense::PfSenseDriver;

use std::sync::Arc;

use mimosa_models::{FirewallConfig, FirewallKind};

/// Builds the concrete driver for a configured gateway. The
/// synchronizer holds one of these per `FirewallConfig` row and never
/// matches on `kind` itself again after construction.
pub fn build_driver(config: &FirewallConfig) -> Arc<dyn FirewallDriver> {
    match config.kind {
        FirewallKind::OpnSense => Arc::new(OpnSenseDriver::new(config)),
        FirewallKind::PfSense => Arc::new(PfSenseDriver::new(config)),
    }
}
