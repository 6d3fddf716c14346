// [libs/infra/mimosa-firewall/src/alias.rs]
//! Fixed firewall-side alias and rule names (§3). These never vary per
//! configured gateway: every driver ensures and syncs the same names,
//! so a block or whitelist entry means the same alias on every gateway
//! an operator points Mimosa at.

pub const ALIAS_TEMPORAL: &str = "mimosa_temporal_list";
pub const ALIAS_BLACKLIST: &str = "mimosa_blacklist";
pub const ALIAS_WHITELIST: &str = "mimosa_whitelist";
pub const ALIAS_PORTS_TCP: &str = "mimosa_ports_tcp";
pub const ALIAS_PORTS_UDP: &str = "mimosa_ports_udp";

pub const ALL_ALIASES: &[&str] = &[ALIAS_TEMPORAL, ALIAS_BLACKLIST, ALIAS_WHITELIST, ALIAS_PORTS_TCP, ALIAS_PORTS_UDP];

/// Which port alias a sync targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortProtocol {
    Tcp,
    Udp,
}

impl PortProtocol {
    pub fn alias_name(self) -> &'static str {
        match self {
            PortProtocol::Tcp => ALIAS_PORTS_TCP,
            PortProtocol::Udp => ALIAS_PORTS_UDP,
        }
    }
}

/// A filter rule Mimosa expects to exist on every gateway it manages,
/// identified by `description` so `install_mimosa_rules` can tell an
/// already-installed rule apart from one it still needs to create.
pub struct MimosaRuleSpec {
    pub description: &'static str,
    pub action: &'static str,
    pub source_alias: &'static str,
}

pub const MIMOSA_RULE_SPECS: &[MimosaRuleSpec] = &[
    MimosaRuleSpec { description: "mimosa: pass whitelist", action: "pass", source_alias: ALIAS_WHITELIST },
    MimosaRuleSpec { description: "mimosa: block temporal list", action: "block", source_alias: ALIAS_TEMPORAL },
    MimosaRuleSpec { description: "mimosa: block blacklist", action: "block", source_alias: ALIAS_BLACKLIST },
];
