// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/repositories/firewall.rs]
use libsql::params;
use mimosa_models::{FirewallConfig, FirewallKind};
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

pub struct FirewallRepository {
    client: StoreClient,
}

impl FirewallRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list_enabled(&self) -> Result<Vec<FirewallConfig>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, name, kind, base_url, username, password, verify_tls, apply_changes, enabled
                 FROM firewalls WHERE enabled = 1",
                (),
            )
            .await?;
        let mut configs = Vec::new();
        while let Some(row) = rows.next().await? {
            configs.push(map_row(&row)?);
        }
        Ok(configs)
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<FirewallConfig>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, name, kind, base_url, username, password, verify_tls, apply_changes, enabled
                 FROM firewalls ORDER BY id",
                (),
            )
            .await?;
        let mut configs = Vec::new();
        while let Some(row) = rows.next().await? {
            configs.push(map_row(&row)?);
        }
        Ok(configs)
    }

    #[instrument(skip(self, config))]
    pub async fn upsert(&self, config: &FirewallConfig) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        if config.id == 0 {
            connection
                .execute(
                    "INSERT INTO firewalls (name, kind, base_url, username, password, verify_tls, apply_changes, enabled)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        config.name.clone(),
                        kind_label(config.kind),
                        config.base_url.clone(),
                        config.username.clone(),
                        config.password.clone(),
                        config.verify_tls as i64,
                        config.apply_changes as i64,
                        config.enabled as i64,
                    ],
                )
                .await?;
            Ok(connection.last_insert_rowid() as u64)
        } else {
            connection
                .execute(
                    "UPDATE firewalls SET name = ?2, kind = ?3, base_url = ?4, username = ?5,
                        password = ?6, verify_tls = ?7, apply_changes = ?8, enabled = ?9
                     WHERE id = ?1",
                    params![
                        config.id,
                        config.name.clone(),
                        kind_label(config.kind),
                        config.base_url.clone(),
                        config.username.clone(),
                        config.password.clone(),
                        config.verify_tls as i64,
                        config.apply_changes as i64,
                        config.enabled as i64,
                    ],
                )
                .await?;
            Ok(config.id)
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM firewalls WHERE id = ?1", params![id]).await?;
        Ok(())
    }
}

fn kind_label(kind: FirewallKind) -> &'static str {
    match kind {
        FirewallKind::OpnSense => "opnsense",
        FirewallKind::PfSense => "pfsense",
    }
}

fn map_row(row: &libsql::Row) -> Result<FirewallConfig, StoreError> {
    let kind_raw: String = row.get(2)?;
    let kind = match kind_raw.as_str() {
        "opnsense" => FirewallKind::OpnSense,
        "pfsense" => FirewallKind::PfSense,
        other => return Err(StoreError::MappingError(format!("unknown firewall kind: {}", other))),
    };

    Ok(FirewallConfig {
        id: row.get::<i64>(0)? as u64,
        name: row.get(1)?,
        kind,
        base_url: row.get(3)?,
        username: row.get(4)?,
        password: row.get(5)?,
        verify_tls: row.get::<i64>(6)? != 0,
        apply_changes: row.get::<i64>(7)? != 0,
        enabled: row.get::<i64>(8)? != 0,
    })
}
