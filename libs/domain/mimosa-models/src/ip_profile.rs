//! [libs/domain/mimosa-models/src/ip_profile.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpClassification {
    Datacenter,
    Residential,
    Governmental,
    Educational,
    Corporate,
    Mobile,
    Proxy,
    Unknown,
}

impl Default for IpClassification {
    fn default() -> Self {
        IpClassification::Unknown
    }
}

/// Enrichment record for a single source IP. Created on first offense,
/// refreshed lazily or on demand; never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpProfile {
    pub ip: IpAddr,
    pub geo_json: Option<String>,
    pub reverse_dns: Option<String>,
    pub classification: IpClassification,
    pub is_proxy: bool,
    pub is_mobile: bool,
    pub is_hosting: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub enriched_at: Option<DateTime<Utc>>,
    pub offenses_total: u64,
    pub blocks_total: u64,
}

impl IpProfile {
    pub fn new(ip: IpAddr, now: DateTime<Utc>) -> Self {
        Self {
            ip,
            geo_json: None,
            reverse_dns: None,
            classification: IpClassification::Unknown,
            is_proxy: false,
            is_mobile: false,
            is_hosting: false,
            first_seen: now,
            last_seen: now,
            enriched_at: None,
            offenses_total: 0,
            blocks_total: 0,
        }
    }

    /// A profile is fresh if enriched within `ttl` of `now`; otherwise
    /// it is due for a refresh (§4.2, default TTL 24h).
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        match self.enriched_at {
            Some(enriched_at) => now - enriched_at < ttl,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_profile_within_ttl() {
        let now = Utc::now();
        let mut profile = IpProfile::new("203.0.113.10".parse().unwrap(), now);
        profile.enriched_at = Some(now - Duration::hours(1));
        assert!(profile.is_fresh(now, Duration::hours(24)));
    }

    #[test]
    fn stale_profile_outside_ttl_or_never_enriched() {
        let now = Utc::now();
        let mut profile = IpProfile::new("203.0.113.10".parse().unwrap(), now);
        assert!(!profile.is_fresh(now, Duration::hours(24)));
        profile.enriched_at = Some(now - Duration::hours(25));
        assert!(!profile.is_fresh(now, Duration::hours(24)));
    }
}
