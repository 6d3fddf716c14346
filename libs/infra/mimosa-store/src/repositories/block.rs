// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/repositories/block.rs]
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use libsql::params;
use mimosa_models::{Block, BlockHistoryAction, BlockHistoryEntry, Severity};
use std::str::FromStr;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct BlockRepository {
    client: StoreClient,
}

impl BlockRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Upserts the block row for `block.ip`. The synchronizer and the
    /// escalation pipeline both call this; whichever wins the race to
    /// write last determines the persisted reason, which is why the
    /// severity-overwrite rule is enforced by the caller before this
    /// method is invoked, not here.
    #[instrument(skip(self, block))]
    pub async fn upsert(&self, block: &Block) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO blocks (ip, reason, reason_text, reason_plugin, reason_severity, source, created_at, expires_at, active, sync_with_firewall)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(ip) DO UPDATE SET
                    reason = excluded.reason,
                    reason_text = excluded.reason_text,
                    reason_plugin = excluded.reason_plugin,
                    reason_severity = excluded.reason_severity,
                    source = excluded.source,
                    expires_at = excluded.expires_at,
                    active = excluded.active,
                    sync_with_firewall = excluded.sync_with_firewall",
                params![
                    block.ip.to_string(),
                    block.reason.clone(),
                    block.reason_text.clone(),
                    block.reason_plugin.clone(),
                    block.reason_severity.map(|s| s.to_string()),
                    block.source.clone(),
                    block.created_at.to_rfc3339(),
                    block.expires_at.map(|t| t.to_rfc3339()),
                    block.active as i64,
                    block.sync_with_firewall as i64,
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, ip: IpAddr) -> Result<Option<Block>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, reason, reason_text, reason_plugin, reason_severity, source, created_at, expires_at, active, sync_with_firewall
                 FROM blocks WHERE ip = ?1",
                params![ip.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<Block>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, reason, reason_text, reason_plugin, reason_severity, source, created_at, expires_at, active, sync_with_firewall
                 FROM blocks WHERE active = 1",
                (),
            )
            .await?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next().await? {
            blocks.push(map_row(&row)?);
        }
        Ok(blocks)
    }

    /// Returns every block, active or not, newest first. Backs the
    /// `include_expired=true` branch of the blocks listing endpoint.
    #[instrument(skip(self))]
    pub async fn list_all(&self, limit: u32) -> Result<Vec<Block>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, reason, reason_text, reason_plugin, reason_severity, source, created_at, expires_at, active, sync_with_firewall
                 FROM blocks ORDER BY created_at DESC LIMIT ?1",
                params![limit],
            )
            .await?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next().await? {
            blocks.push(map_row(&row)?);
        }
        Ok(blocks)
    }

    #[instrument(skip(self))]
    pub async fn count_active(&self) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query("SELECT COUNT(*) FROM blocks WHERE active = 1", ()).await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(row.get::<i64>(0)? as u64)
    }

    #[instrument(skip(self))]
    pub async fn count_total(&self) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query("SELECT COUNT(*) FROM blocks", ()).await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(row.get::<i64>(0)? as u64)
    }

    /// Returns the active, non-permanent blocks whose `expires_at` is
    /// at or before `now`, without mutating them — the caller decides
    /// whether to deactivate or extend.
    #[instrument(skip(self))]
    pub async fn due_for_expiry(&self, now: DateTime<Utc>) -> Result<Vec<Block>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, reason, reason_text, reason_plugin, reason_severity, source, created_at, expires_at, active, sync_with_firewall
                 FROM blocks WHERE active = 1 AND expires_at IS NOT NULL AND expires_at <= ?1",
                params![now.to_rfc3339()],
            )
            .await?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next().await? {
            blocks.push(map_row(&row)?);
        }
        Ok(blocks)
    }

    /// Active, non-permanent blocks ordered by soonest expiry first,
    /// for the dashboard's expiring-blocks widget.
    #[instrument(skip(self))]
    pub async fn expiring(&self, limit: u32) -> Result<Vec<Block>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, reason, reason_text, reason_plugin, reason_severity, source, created_at, expires_at, active, sync_with_firewall
                 FROM blocks WHERE active = 1 AND expires_at IS NOT NULL ORDER BY expires_at ASC LIMIT ?1",
                params![limit],
            )
            .await?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next().await? {
            blocks.push(map_row(&row)?);
        }
        Ok(blocks)
    }

    /// Counts of active blocks per `reason`, for the dashboard's
    /// block-reasons breakdown.
    #[instrument(skip(self))]
    pub async fn reason_breakdown(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT reason, COUNT(*) FROM blocks WHERE active = 1 GROUP BY reason", ())
            .await?;
        let mut breakdown = Vec::new();
        while let Some(row) = rows.next().await? {
            let reason: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            breakdown.push((reason, count as u64));
        }
        Ok(breakdown)
    }

    /// Block history across every IP, newest first, for
    /// `/api/blocks/history` (as opposed to `history_for`, which is
    /// scoped to one IP).
    #[instrument(skip(self))]
    pub async fn global_history(&self, limit: u32) -> Result<Vec<BlockHistoryEntry>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT ip, reason, action, source, at FROM block_history ORDER BY at DESC LIMIT ?1", params![limit])
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(map_history_row(&row)?);
        }
        Ok(entries)
    }

    #[instrument(skip(self))]
    pub async fn deactivate(&self, ip: IpAddr) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute("UPDATE blocks SET active = 0 WHERE ip = ?1", params![ip.to_string()])
            .await?;
        Ok(())
    }

    /// Average seconds between an IP's first offense and the block
    /// that followed it, for blocks created since `since`. `None` when
    /// no block in the window has a matching offense.
    #[instrument(skip(self))]
    pub async fn average_reaction_seconds(&self, since: DateTime<Utc>) -> Result<Option<f64>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT AVG((julianday(b.created_at) - julianday(o.first_offense)) * 86400.0)
                 FROM blocks b
                 JOIN (
                     SELECT source_ip, MIN(created_at) AS first_offense
                     FROM offenses
                     WHERE created_at >= ?1
                     GROUP BY source_ip
                 ) o ON o.source_ip = b.ip
                 WHERE b.created_at >= ?1",
                params![since.to_rfc3339()],
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(row.get::<Option<f64>>(0)?)
    }

    #[instrument(skip(self, entry))]
    pub async fn record_history(&self, entry: &BlockHistoryEntry) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO block_history (ip, reason, action, source, at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.ip.to_string(),
                    entry.reason.clone(),
                    action_label(entry.action),
                    entry.source.clone(),
                    entry.at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn history_for(&self, ip: IpAddr, limit: u32) -> Result<Vec<BlockHistoryEntry>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT ip, reason, action, source, at FROM block_history WHERE ip = ?1 ORDER BY at DESC LIMIT ?2",
                params![ip.to_string(), limit],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(map_history_row(&row)?);
        }
        Ok(entries)
    }
}

fn action_label(action: BlockHistoryAction) -> &'static str {
    match action {
        BlockHistoryAction::Add => "add",
        BlockHistoryAction::Remove => "remove",
        BlockHistoryAction::Expire => "expire",
        BlockHistoryAction::Extend => "extend",
    }
}

fn parse_action(label: &str) -> Result<BlockHistoryAction, StoreError> {
    match label {
        "add" => Ok(BlockHistoryAction::Add),
        "remove" => Ok(BlockHistoryAction::Remove),
        "expire" => Ok(BlockHistoryAction::Expire),
        "extend" => Ok(BlockHistoryAction::Extend),
        other => Err(StoreError::MappingError(format!("unknown block history action: {}", other))),
    }
}

fn map_row(row: &libsql::Row) -> Result<Block, StoreError> {
    let reason_severity: Option<String> = row.get(4)?;
    let created_at: String = row.get(6)?;
    let expires_at: Option<String> = row.get(7)?;

    Ok(Block {
        ip: row.get::<String>(0)?.parse().map_err(|e: std::net::AddrParseError| StoreError::MappingError(e.to_string()))?,
        reason: row.get(1)?,
        reason_text: row.get(2)?,
        reason_plugin: row.get(3)?,
        reason_severity: reason_severity
            .map(|s| Severity::from_str(&s).map_err(|e| StoreError::MappingError(e.to_string())))
            .transpose()?,
        source: row.get(5)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::MappingError(e.to_string()))?
            .with_timezone(&Utc),
        expires_at: expires_at
            .map(|t| DateTime::parse_from_rfc3339(&t).map(|d| d.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| StoreError::MappingError(e.to_string()))?,
        active: row.get::<i64>(8)? != 0,
        sync_with_firewall: row.get::<i64>(9)? != 0,
    })
}

fn map_history_row(row: &libsql::Row) -> Result<BlockHistoryEntry, StoreError> {
    let action_label_value: String = row.get(2)?;
    let at: String = row.get(4)?;

    Ok(BlockHistoryEntry {
        ip: row.get::<String>(0)?.parse().map_err(|e: std::net::AddrParseError| StoreError::MappingError(e.to_string()))?,
        reason: row.get(1)?,
        action: parse_action(&action_label_value)?,
        at: DateTime::parse_from_rfc3339(&at).map_err(|e| StoreError::MappingError(e.to_string()))?.with_timezone(&Utc),
        source: row.get(3)?,
    })
}
