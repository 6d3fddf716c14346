//! [libs/infra/mimosa-enrichment/src/error.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("classification provider unreachable: {0}")]
    ProviderUnreachable(#[from] reqwest::Error),
    #[error("classification provider rejected the request (status {0})")]
    ProviderRejected(u16),
    #[error("dns resolution failed: {0}")]
    DnsResolution(#[from] hickory_resolver::error::ResolveError),
}
