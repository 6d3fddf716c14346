// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/repositories/whitelist.rs]
use chrono::{DateTime, Utc};
use libsql::params;
use mimosa_models::WhitelistEntry;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct WhitelistRepository {
    client: StoreClient,
}

impl WhitelistRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<WhitelistEntry>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query("SELECT id, cidr, note, created_at FROM whitelist ORDER BY id", ()).await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(map_row(&row)?);
        }
        Ok(entries)
    }

    #[instrument(skip(self))]
    pub async fn insert(&self, cidr: &str, note: Option<&str>) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute("INSERT INTO whitelist (cidr, note) VALUES (?1, ?2)", params![cidr, note])
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    StoreError::Conflict(format!("whitelist entry already exists: {}", cidr))
                } else {
                    StoreError::QueryError(e)
                }
            })?;
        Ok(connection.last_insert_rowid() as u64)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM whitelist WHERE id = ?1", params![id]).await?;
        Ok(())
    }
}

fn map_row(row: &libsql::Row) -> Result<WhitelistEntry, StoreError> {
    let created_at: String = row.get(3)?;
    Ok(WhitelistEntry {
        id: row.get::<i64>(0)? as u64,
        cidr: row.get(1)?,
        note: row.get(2)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::MappingError(e.to_string()))?
            .with_timezone(&Utc),
    })
}
