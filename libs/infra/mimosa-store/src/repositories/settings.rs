// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/repositories/settings.rs]
use libsql::params;
use mimosa_models::PluginConfig;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

const PLUGIN_CONFIG_KEY: &str = "plugin_config";

/// Arbitrary key/value JSON settings. Currently holds only the
/// ingestion plugin configuration (§6), but the table is generic so a
/// future setting doesn't need a schema migration.
pub struct SettingsRepository {
    client: StoreClient,
}

impl SettingsRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn get_plugin_config(&self) -> Result<Option<PluginConfig>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT value_json FROM system_settings WHERE key = ?1", params![PLUGIN_CONFIG_KEY])
            .await?;
        match rows.next().await? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&raw).map_err(|e| StoreError::MappingError(e.to_string()))?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, config))]
    pub async fn set_plugin_config(&self, config: &PluginConfig) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        let value_json = serde_json::to_string(config).map_err(|e| StoreError::MappingError(e.to_string()))?;
        connection
            .execute(
                "INSERT INTO system_settings (key, value_json, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = CURRENT_TIMESTAMP",
                params![PLUGIN_CONFIG_KEY, value_json],
            )
            .await?;
        Ok(())
    }
}
