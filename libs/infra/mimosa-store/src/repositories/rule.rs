// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/repositories/rule.rs]
use std::str::FromStr;

use libsql::params;
use mimosa_models::{Rule, Severity};
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct RuleRepository {
    client: StoreClient,
}

impl RuleRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list_enabled(&self) -> Result<Vec<Rule>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, plugin, event_id, severity, description, min_last_hour, min_total, min_blocks_total, block_minutes, enabled
                 FROM rules WHERE enabled = 1",
                (),
            )
            .await?;
        let mut rules = Vec::new();
        while let Some(row) = rows.next().await? {
            rules.push(map_row(&row)?);
        }
        Ok(rules)
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Rule>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, plugin, event_id, severity, description, min_last_hour, min_total, min_blocks_total, block_minutes, enabled
                 FROM rules ORDER BY id",
                (),
            )
            .await?;
        let mut rules = Vec::new();
        while let Some(row) = rows.next().await? {
            rules.push(map_row(&row)?);
        }
        Ok(rules)
    }

    #[instrument(skip(self, rule))]
    pub async fn upsert(&self, rule: &Rule) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        if rule.id == 0 {
            connection
                .execute(
                    "INSERT INTO rules (plugin, event_id, severity, description, min_last_hour, min_total, min_blocks_total, block_minutes, enabled)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        rule.plugin.clone(),
                        rule.event_id.clone(),
                        rule.severity.map(|s| s.to_string()),
                        rule.description.clone(),
                        rule.min_last_hour,
                        rule.min_total,
                        rule.min_blocks_total,
                        rule.block_minutes,
                        rule.enabled as i64,
                    ],
                )
                .await?;
            Ok(connection.last_insert_rowid() as u64)
        } else {
            connection
                .execute(
                    "UPDATE rules SET plugin = ?2, event_id = ?3, severity = ?4, description = ?5,
                        min_last_hour = ?6, min_total = ?7, min_blocks_total = ?8, block_minutes = ?9, enabled = ?10
                     WHERE id = ?1",
                    params![
                        rule.id,
                        rule.plugin.clone(),
                        rule.event_id.clone(),
                        rule.severity.map(|s| s.to_string()),
                        rule.description.clone(),
                        rule.min_last_hour,
                        rule.min_total,
                        rule.min_blocks_total,
                        rule.block_minutes,
                        rule.enabled as i64,
                    ],
                )
                .await?;
            Ok(rule.id)
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM rules WHERE id = ?1", params![id]).await?;
        Ok(())
    }
}

fn map_row(row: &libsql::Row) -> Result<Rule, StoreError> {
    let severity: Option<String> = row.get(3)?;
    Ok(Rule {
        id: row.get::<i64>(0)? as u64,
        plugin: row.get(1)?,
        event_id: row.get(2)?,
        severity: severity.map(|s| Severity::from_str(&s)).transpose().map_err(StoreError::MappingError)?,
        description: row.get(4)?,
        min_last_hour: row.get::<i64>(5)? as u32,
        min_total: row.get::<i64>(6)? as u32,
        min_blocks_total: row.get::<i64>(7)? as u32,
        block_minutes: row.get::<Option<i64>>(8)?.map(|v| v as u32),
        enabled: row.get::<i64>(9)? != 0,
    })
}
