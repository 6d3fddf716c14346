// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/repositories/ip_profile.rs]
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use libsql::params;
use mimosa_models::{IpClassification, IpProfile};
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct IpProfileRepository {
    client: StoreClient,
}

impl IpProfileRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, ip: IpAddr) -> Result<Option<IpProfile>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, geo_json, reverse_dns, classification, is_proxy, is_mobile, is_hosting,
                        first_seen, last_seen, enriched_at, offenses_total, blocks_total
                 FROM ip_profiles WHERE ip = ?1",
                params![ip.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Creates the profile row on first sighting of an IP, bumping
    /// `offenses_total`/`last_seen` when it already exists.
    #[instrument(skip(self))]
    pub async fn touch(&self, ip: IpAddr, now: DateTime<Utc>) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO ip_profiles (ip, first_seen, last_seen, offenses_total)
                 VALUES (?1, ?2, ?2, 1)
                 ON CONFLICT(ip) DO UPDATE SET
                    last_seen = excluded.last_seen,
                    offenses_total = offenses_total + 1",
                params![ip.to_string(), now.to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn increment_blocks_total(&self, ip: IpAddr) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE ip_profiles SET blocks_total = blocks_total + 1 WHERE ip = ?1",
                params![ip.to_string()],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, profile))]
    pub async fn save_enrichment(&self, profile: &IpProfile) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE ip_profiles SET
                    geo_json = ?2, reverse_dns = ?3, classification = ?4,
                    is_proxy = ?5, is_mobile = ?6, is_hosting = ?7, enriched_at = ?8
                 WHERE ip = ?1",
                params![
                    profile.ip.to_string(),
                    profile.geo_json.clone(),
                    profile.reverse_dns.clone(),
                    classification_label(profile.classification),
                    profile.is_proxy as i64,
                    profile.is_mobile as i64,
                    profile.is_hosting as i64,
                    profile.enriched_at.map(|t| t.to_rfc3339()),
                ],
            )
            .await?;
        Ok(())
    }

    /// The highest-offense IPs, for the dashboard's top-offenders
    /// widget. Ties broken by most recently seen first.
    #[instrument(skip(self))]
    pub async fn top_offenders(&self, limit: u32) -> Result<Vec<IpProfile>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, geo_json, reverse_dns, classification, is_proxy, is_mobile, is_hosting,
                        first_seen, last_seen, enriched_at, offenses_total, blocks_total
                 FROM ip_profiles ORDER BY offenses_total DESC, last_seen DESC LIMIT ?1",
                params![limit],
            )
            .await?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await? {
            profiles.push(map_row(&row)?);
        }
        Ok(profiles)
    }

    /// Plain, unranked profile listing for `/api/ips`.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: u32) -> Result<Vec<IpProfile>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, geo_json, reverse_dns, classification, is_proxy, is_mobile, is_hosting,
                        first_seen, last_seen, enriched_at, offenses_total, blocks_total
                 FROM ip_profiles ORDER BY last_seen DESC LIMIT ?1",
                params![limit],
            )
            .await?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await? {
            profiles.push(map_row(&row)?);
        }
        Ok(profiles)
    }

    /// Counts of enriched profiles per `IpClassification`, for the
    /// dashboard's ip-types breakdown.
    #[instrument(skip(self))]
    pub async fn classification_breakdown(&self) -> Result<Vec<(IpClassification, u64)>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query("SELECT classification, COUNT(*) FROM ip_profiles GROUP BY classification", ()).await?;
        let mut breakdown = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let classification = match raw.as_str() {
                "datacenter" => IpClassification::Datacenter,
                "residential" => IpClassification::Residential,
                "governmental" => IpClassification::Governmental,
                "educational" => IpClassification::Educational,
                "corporate" => IpClassification::Corporate,
                "mobile" => IpClassification::Mobile,
                "proxy" => IpClassification::Proxy,
                _ => IpClassification::Unknown,
            };
            breakdown.push((classification, count as u64));
        }
        Ok(breakdown)
    }

    #[instrument(skip(self))]
    pub async fn stale_since(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<IpAddr>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip FROM ip_profiles WHERE enriched_at IS NULL OR enriched_at < ?1 LIMIT ?2",
                params![cutoff.to_rfc3339(), limit],
            )
            .await?;
        let mut ips = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            ips.push(raw.parse().map_err(|e: std::net::AddrParseError| StoreError::MappingError(e.to_string()))?);
        }
        Ok(ips)
    }
}

fn classification_label(classification: IpClassification) -> &'static str {
    match classification {
        IpClassification::Datacenter => "datacenter",
        IpClassification::Residential => "residential",
        IpClassification::Governmental => "governmental",
        IpClassification::Educational => "educational",
        IpClassification::Corporate => "corporate",
        IpClassification::Mobile => "mobile",
        IpClassification::Proxy => "proxy",
        IpClassification::Unknown => "unknown",
    }
}

fn map_row(row: &libsql::Row) -> Result<IpProfile, StoreError> {
    let classification_raw: String = row.get(3)?;
    let classification = match classification_raw.as_str() {
        "datacenter" => IpClassification::Datacenter,
        "residential" => IpClassification::Residential,
        "governmental" => IpClassification::Governmental,
        "educational" => IpClassification::Educational,
        "corporate" => IpClassification::Corporate,
        "mobile" => IpClassification::Mobile,
        "proxy" => IpClassification::Proxy,
        _ => IpClassification::Unknown,
    };

    let first_seen: String = row.get(7)?;
    let last_seen: String = row.get(8)?;
    let enriched_at: Option<String> = row.get(9)?;

    Ok(IpProfile {
        ip: row.get::<String>(0)?.parse().map_err(|e: std::net::AddrParseError| StoreError::MappingError(e.to_string()))?,
        geo_json: row.get(1)?,
        reverse_dns: row.get(2)?,
        classification,
        is_proxy: row.get::<i64>(4)? != 0,
        is_mobile: row.get::<i64>(5)? != 0,
        is_hosting: row.get::<i64>(6)? != 0,
        first_seen: parse_timestamp(&first_seen)?,
        last_seen: parse_timestamp(&last_seen)?,
        enriched_at: enriched_at.map(|t| parse_timestamp(&t)).transpose()?,
        offenses_total: row.get::<i64>(10)? as u64,
        blocks_total: row.get::<i64>(11)? as u64,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw).map(|d| d.with_timezone(&Utc)).map_err(|e| StoreError::MappingError(e.to_string()))
}
