//! [libs/domain/mimosa-models/src/whitelist.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A never-block entry: an IPv4/IPv6 network, a bare IP, or an FQDN.
/// Uniqueness is on the normalized `cidr` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub id: u64,
    pub cidr: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The three shapes a whitelist `cidr` string can take. Parsing lives
/// here (pure, no I/O); resolving an `Fqdn` variant against DNS is the
/// enrichment crate's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistEntryKind {
    Network(ipnet::IpNet),
    BareIp(std::net::IpAddr),
    Fqdn(String),
}

/// Normalizes and classifies a raw whitelist string per §4.3: a
/// `/32` or `/128` network is treated as a bare IP, anything that
/// parses as a plain IP address is a bare IP, anything else that
/// parses as a CIDR is a network, and everything else is assumed to
/// be an FQDN (resolved downstream, not here).
pub fn classify_entry(raw: &str) -> WhitelistEntryKind {
    let trimmed = raw.trim();

    if let Ok(ip) = trimmed.parse::<std::net::IpAddr>() {
        return WhitelistEntryKind::BareIp(ip);
    }

    if let Ok(net) = trimmed.parse::<ipnet::IpNet>() {
        let is_host_route = match net {
            ipnet::IpNet::V4(n) => n.prefix_len() == 32,
            ipnet::IpNet::V6(n) => n.prefix_len() == 128,
        };
        return if is_host_route {
            WhitelistEntryKind::BareIp(net.addr())
        } else {
            WhitelistEntryKind::Network(net)
        };
    }

    WhitelistEntryKind::Fqdn(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_bare_ip() {
        assert_eq!(
            classify_entry("203.0.113.10"),
            WhitelistEntryKind::BareIp("203.0.113.10".parse().unwrap())
        );
    }

    #[test]
    fn classifies_slash_32_as_bare_ip() {
        assert_eq!(
            classify_entry("203.0.113.10/32"),
            WhitelistEntryKind::BareIp("203.0.113.10".parse().unwrap())
        );
    }

    #[test]
    fn classifies_network() {
        assert_eq!(
            classify_entry("203.0.113.0/24"),
            WhitelistEntryKind::Network("203.0.113.0/24".parse().unwrap())
        );
    }

    #[test]
    fn classifies_fqdn() {
        assert_eq!(
            classify_entry("Trusted.Example.com"),
            WhitelistEntryKind::Fqdn("trusted.example.com".into())
        );
    }
}
