//! [libs/domain/mimosa-models/src/lib.rs]
//! Shared domain types for the Mimosa workspace: the entities described
//! in §3 of the design, plus the pure wildcard matcher every layer
//! above the store depends on.

pub mod block;
pub mod event;
pub mod firewall;
pub mod ip_profile;
pub mod offense;
pub mod plugin_config;
pub mod rule;
pub mod severity;
pub mod whitelist;
pub mod wildcard;

pub use block::{Block, BlockHistoryAction, BlockHistoryEntry};
pub use event::{LiveEvent, OffenseEvent, StatsSnapshot};
pub use firewall::{FirewallConfig, FirewallKind};
pub use ip_profile::{IpClassification, IpProfile};
pub use offense::{clean_description, derive_event_id, Offense};
pub use plugin_config::{
    DomainPolicy, MimosaNpmConfig, MimosaNpmIgnoreEntry, MimosaNpmRule, PluginConfig, PortDetectorConfig, PortRule, PortSpec, Protocol,
    ProxyTrapConfig, ResponseType,
};
pub use rule::Rule;
pub use severity::Severity;
pub use whitelist::WhitelistEntry;
