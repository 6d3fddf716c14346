//! [libs/infra/mimosa-enrichment/src/lib.rs]
//! Everything that needs the outside world to answer "what is this IP"
//! and "is this IP allowed to bypass blocking": reverse DNS, third-party
//! classification, and FQDN-backed whitelist resolution (§4.2, §4.3).

pub mod classify;
pub mod dns;
pub mod error;
pub mod whitelist;

pub use classify::EnrichmentClient;
pub use dns::DnsResolver;
pub use error::EnrichmentError;
pub use whitelist::is_whitelisted;
