// [libs/infra/mimosa-store/src/lib.rs]
//! libSQL-backed persistence for the Mimosa workspace: connection
//! management, idempotent schema migration, and one repository per
//! aggregate (§4.1-§4.11).

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::StoreClient;
pub use errors::StoreError;
pub use repositories::{
    BlockRepository, FirewallRepository, IpProfileRepository, OffenseFilter, OffenseRepository, OffenseStats,
    RuleRepository, SessionRepository, SettingsRepository, UserRepository, WhitelistRepository,
};
