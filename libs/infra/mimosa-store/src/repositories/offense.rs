// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/repositories/offense.rs]
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use libsql::params;
use mimosa_models::{Offense, Severity};
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct OffenseRepository {
    client: StoreClient,
}

impl OffenseRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, offense))]
    pub async fn insert(&self, offense: &Offense) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        let context_json = serde_json::to_string(&offense.context).map_err(|e| StoreError::MappingError(e.to_string()))?;

        connection
            .execute(
                "INSERT INTO offenses (source_ip, description, description_clean, plugin, severity, host, path, context_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    offense.source_ip.to_string(),
                    offense.description.clone(),
                    offense.description_clean.clone(),
                    offense.plugin.clone(),
                    offense.severity.map(|s| s.to_string()),
                    offense.host.clone(),
                    offense.path.clone(),
                    context_json,
                    offense.created_at.to_rfc3339(),
                ],
            )
            .await?;

        Ok(connection.last_insert_rowid() as u64)
    }

    #[instrument(skip(self))]
    pub async fn count_since(&self, ip: IpAddr, since: DateTime<Utc>) -> Result<u32, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT COUNT(*) FROM offenses WHERE source_ip = ?1 AND created_at >= ?2",
                params![ip.to_string(), since.to_rfc3339()],
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(row.get::<i64>(0)? as u32)
    }

    #[instrument(skip(self))]
    pub async fn count_total(&self, ip: IpAddr) -> Result<u32, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT COUNT(*) FROM offenses WHERE source_ip = ?1", params![ip.to_string()])
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(row.get::<i64>(0)? as u32)
    }

    #[instrument(skip(self))]
    pub async fn count_global_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT COUNT(*) FROM offenses WHERE created_at >= ?1", params![since.to_rfc3339()])
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(row.get::<i64>(0)? as u64)
    }

    #[instrument(skip(self))]
    pub async fn count_global_total(&self) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query("SELECT COUNT(*) FROM offenses", ()).await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(row.get::<i64>(0)? as u64)
    }

    #[instrument(skip(self))]
    pub async fn recent(&self, limit: u32) -> Result<Vec<Offense>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, source_ip, description, description_clean, plugin, severity, host, path, context_json, created_at
                 FROM offenses ORDER BY created_at DESC LIMIT ?1",
                params![limit],
            )
            .await?;

        let mut offenses = Vec::new();
        while let Some(row) = rows.next().await? {
            offenses.push(map_row(&row)?);
        }
        Ok(offenses)
    }

    /// Filtered offense listing for the admin UI (§4.4). Each present
    /// filter field narrows the query with an additional `AND` clause;
    /// an empty filter is equivalent to `recent`.
    #[instrument(skip(self, filter))]
    pub async fn list(&self, filter: &OffenseFilter, limit: u32) -> Result<Vec<Offense>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut clauses = Vec::new();
        let mut values: Vec<libsql::Value> = Vec::new();

        if let Some(ip) = filter.source_ip {
            values.push(ip.to_string().into());
            clauses.push(format!("source_ip = ?{}", values.len()));
        }
        if let Some(plugin) = &filter.plugin {
            values.push(plugin.clone().into());
            clauses.push(format!("plugin = ?{}", values.len()));
        }
        if let Some(severity) = filter.severity {
            values.push(severity.to_string().into());
            clauses.push(format!("severity = ?{}", values.len()));
        }
        if let Some(since) = filter.since {
            values.push(since.to_rfc3339().into());
            clauses.push(format!("created_at >= ?{}", values.len()));
        }

        let where_clause = if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };
        values.push((limit as i64).into());
        let limit_placeholder = values.len();

        let sql = format!(
            "SELECT id, source_ip, description, description_clean, plugin, severity, host, path, context_json, created_at
             FROM offenses {} ORDER BY created_at DESC LIMIT ?{}",
            where_clause, limit_placeholder
        );

        let mut rows = connection.query(&sql, values).await?;
        let mut offenses = Vec::new();
        while let Some(row) = rows.next().await? {
            offenses.push(map_row(&row)?);
        }
        Ok(offenses)
    }

    /// Severity breakdown plus total count for offenses created at or
    /// after `since`, for the dashboard's offense-volume widgets.
    #[instrument(skip(self))]
    pub async fn stats(&self, since: DateTime<Utc>) -> Result<OffenseStats, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT severity, COUNT(*) FROM offenses WHERE created_at >= ?1 GROUP BY severity", params![since.to_rfc3339()])
            .await?;

        let mut by_severity = Vec::new();
        let mut total = 0u64;
        while let Some(row) = rows.next().await? {
            let severity: Option<String> = row.get(0)?;
            let count: i64 = row.get(1)?;
            total += count as u64;
            if let Some(severity) = severity.map(|s| Severity::from_str(&s)).transpose().map_err(StoreError::MappingError)? {
                by_severity.push((severity, count as u64));
            }
        }
        Ok(OffenseStats { total, by_severity })
    }
}

/// Filter criteria for `OffenseRepository::list`. All fields are
/// optional; unset fields impose no constraint.
#[derive(Debug, Clone, Default)]
pub struct OffenseFilter {
    pub source_ip: Option<IpAddr>,
    pub plugin: Option<String>,
    pub severity: Option<Severity>,
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct OffenseStats {
    pub total: u64,
    pub by_severity: Vec<(Severity, u64)>,
}

fn map_row(row: &libsql::Row) -> Result<Offense, StoreError> {
    let severity: Option<String> = row.get(5)?;
    let context_json: String = row.get(8)?;
    let created_at: String = row.get(9)?;

    Ok(Offense {
        id: row.get::<i64>(0)? as u64,
        source_ip: row.get::<String>(1)?.parse().map_err(|e: std::net::AddrParseError| StoreError::MappingError(e.to_string()))?,
        description: row.get(2)?,
        description_clean: row.get(3)?,
        plugin: row.get(4)?,
        severity: severity.map(|s| Severity::from_str(&s)).transpose().map_err(StoreError::MappingError)?,
        host: row.get(6)?,
        path: row.get(7)?,
        context: serde_json::from_str(&context_json).map_err(|e| StoreError::MappingError(e.to_string()))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::MappingError(e.to_string()))?
            .with_timezone(&Utc),
    })
}
