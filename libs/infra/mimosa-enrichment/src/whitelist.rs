//! [libs/infra/mimosa-enrichment/src/whitelist.rs]
use std::net::IpAddr;

use mimosa_models::whitelist::{classify_entry, WhitelistEntryKind};
use mimosa_models::WhitelistEntry;

use crate::dns::DnsResolver;

/// Checks `ip` against every configured whitelist entry. Network and
/// bare-IP entries are checked with no I/O; FQDN entries are resolved
/// through `resolver` on every call rather than cached here — callers
/// that need caching own that policy, this stays a pure-ish check
/// modulo the DNS round trip.
///
/// An FQDN entry whose resolution fails is treated as a non-match: a
/// DNS outage must never silently widen the whitelist, it can only
/// narrow it (§4.3).
pub async fn is_whitelisted(ip: IpAddr, entries: &[WhitelistEntry], resolver: &DnsResolver) -> bool {
    for entry in entries {
        match classify_entry(&entry.cidr) {
            WhitelistEntryKind::BareIp(candidate) => {
                if candidate == ip {
                    return true;
                }
            }
            WhitelistEntryKind::Network(net) => {
                if net.contains(&ip) {
                    return true;
                }
            }
            WhitelistEntryKind::Fqdn(fqdn) => {
                if let Ok(resolved) = resolver.resolve_fqdn(&fqdn).await {
                    if resolved.contains(&ip) {
                        return true;
                    }
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(cidr: &str) -> WhitelistEntry {
        WhitelistEntry { id: 1, cidr: cidr.into(), note: None, created_at: Utc::now() }
    }

    #[tokio::test]
    async fn bare_ip_and_network_entries_match_without_dns() {
        let resolver = DnsResolver::new();
        let entries = vec![entry("203.0.113.10"), entry("198.51.100.0/24")];

        assert!(is_whitelisted("203.0.113.10".parse().unwrap(), &entries, &resolver).await);
        assert!(is_whitelisted("198.51.100.42".parse().unwrap(), &entries, &resolver).await);
        assert!(!is_whitelisted("192.0.2.1".parse().unwrap(), &entries, &resolver).await);
    }
}
