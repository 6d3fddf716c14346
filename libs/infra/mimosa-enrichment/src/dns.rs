//! [libs/infra/mimosa-enrichment/src/dns.rs]
use std::net::IpAddr;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::error::EnrichmentError;

/// Thin wrapper over the system/public resolver, used for two
/// independent purposes: reverse DNS on a source IP (C2 enrichment)
/// and forward resolution of an FQDN whitelist entry (C3 evaluation).
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }

    /// Returns the first PTR record for `ip`, if any resolver in the
    /// chain answers. A lookup failure (NXDOMAIN, timeout) is not an
    /// error here — absence of reverse DNS is a normal, common case.
    pub async fn reverse_lookup(&self, ip: IpAddr) -> Option<String> {
        match self.resolver.reverse_lookup(ip).await {
            Ok(lookup) => lookup.iter().next().map(|name| name.to_string().trim_end_matches('.').to_string()),
            Err(_) => None,
        }
    }

    /// Resolves an FQDN whitelist entry to its current A/AAAA set.
    /// Unlike `reverse_lookup`, failure here is surfaced: a whitelist
    /// entry that cannot be resolved must not silently fail open.
    pub async fn resolve_fqdn(&self, fqdn: &str) -> Result<Vec<IpAddr>, EnrichmentError> {
        let lookup = self.resolver.lookup_ip(fqdn).await?;
        Ok(lookup.iter().collect())
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}
