//! [libs/infra/mimosa-enrichment/src/classify.rs]
use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use mimosa_models::IpClassification;

use crate::error::EnrichmentError;

/// Geo/ASN classification pulled from a configurable third-party IP
/// intelligence provider, plus the coarse booleans the rule engine and
/// dashboard care about (§4.2).
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub geo_json: String,
    pub classification: IpClassification,
    pub is_proxy: bool,
    pub is_mobile: bool,
    pub is_hosting: bool,
}

pub struct EnrichmentClient {
    http: Client,
    base_url: String,
}

impl EnrichmentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent("Mimosa-Enrichment/1.0")
                .build()
                .expect("failed to initialize enrichment HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// Fetches and maps a provider response into our classification
    /// shape. The provider's own category taxonomy rarely matches ours
    /// exactly, so `map_provider_type` absorbs that translation.
    pub async fn classify(&self, ip: IpAddr) -> Result<ClassificationResult, EnrichmentError> {
        let url = format!("{}/{}/json", self.base_url.trim_end_matches('/'), ip);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(EnrichmentError::ProviderRejected(response.status().as_u16()));
        }

        let payload: ProviderResponse = response.json().await?;
        let geo_json = serde_json::to_string(&payload).unwrap_or_default();

        Ok(ClassificationResult {
            classification: map_provider_type(payload.org.as_deref(), payload.proxy, payload.hosting),
            is_proxy: payload.proxy.unwrap_or(false),
            is_mobile: payload.mobile.unwrap_or(false),
            is_hosting: payload.hosting.unwrap_or(false),
            geo_json,
        })
    }
}

#[derive(Debug, Deserialize, serde::Serialize)]
struct ProviderResponse {
    org: Option<String>,
    country: Option<String>,
    city: Option<String>,
    proxy: Option<bool>,
    mobile: Option<bool>,
    hosting: Option<bool>,
}

fn map_provider_type(org: Option<&str>, proxy: Option<bool>, hosting: Option<bool>) -> IpClassification {
    if proxy.unwrap_or(false) {
        return IpClassification::Proxy;
    }
    if hosting.unwrap_or(false) {
        return IpClassification::Datacenter;
    }
    let org = org.unwrap_or_default().to_lowercase();
    if org.contains("university") || org.contains("edu") {
        IpClassification::Educational
    } else if org.contains("gov") {
        IpClassification::Governmental
    } else if org.contains("mobile") || org.contains("wireless") || org.contains("cellular") {
        IpClassification::Mobile
    } else if org.contains("corp") || org.contains("enterprises") {
        IpClassification::Corporate
    } else if !org.is_empty() {
        IpClassification::Residential
    } else {
        IpClassification::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_flag_takes_precedence_over_org_name() {
        assert_eq!(map_provider_type(Some("Acme University"), Some(true), None), IpClassification::Proxy);
    }

    #[test]
    fn hosting_flag_maps_to_datacenter() {
        assert_eq!(map_provider_type(Some("Some Corp"), None, Some(true)), IpClassification::Datacenter);
    }

    #[test]
    fn org_keywords_drive_fallback_classification() {
        assert_eq!(map_provider_type(Some("State University"), None, None), IpClassification::Educational);
        assert_eq!(map_provider_type(Some("Dept of Gov"), None, None), IpClassification::Governmental);
        assert_eq!(map_provider_type(Some("Big Mobile Wireless"), None, None), IpClassification::Mobile);
        assert_eq!(map_provider_type(None, None, None), IpClassification::Unknown);
    }
}
