// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/client.rs]
/*!
 * Connection management for the libSQL-backed store.
 *
 * In-memory URLs need a long-lived anchor connection: SQLite purges an
 * in-memory database once its last connection closes, and without an
 * anchor held open by this struct, every `get_connection()` call would
 * see a freshly wiped, unschemad database.
 */

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{error, info, instrument};

use crate::errors::StoreError;
use crate::schema::apply_mimosa_schema;

#[derive(Clone)]
pub struct StoreClient {
    database: Arc<Database>,
    _memory_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(access_token))]
    pub async fn connect(connection_url: &str, access_token: Option<String>) -> Result<Self, StoreError> {
        if connection_url.is_empty() {
            return Err(StoreError::ConfigurationError("DATABASE_URL is empty".into()));
        }

        info!("connecting to store at {}", connection_url);

        let is_remote = connection_url.starts_with("libsql://") || connection_url.starts_with("https://");
        let is_memory = connection_url.contains(":memory:") || connection_url.contains("mode=memory");

        let database = if is_remote {
            let token = access_token
                .ok_or_else(|| StoreError::ConfigurationError("remote store requires an access token".into()))?;
            Builder::new_remote(connection_url.to_string(), token).build().await
        } else {
            Builder::new_local(connection_url).build().await
        }
        .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let database = Arc::new(database);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = database.connect().map_err(|e| StoreError::ConnectionError(e.to_string()))?;
            apply_mimosa_schema(&anchor_conn)
                .await
                .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
            anchor = Some(Arc::new(anchor_conn));
            info!("in-memory store anchored");
        } else {
            let bootstrap_conn = database.connect().map_err(|e| StoreError::ConnectionError(e.to_string()))?;
            apply_mimosa_schema(&bootstrap_conn)
                .await
                .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        }

        Ok(Self { database, _memory_anchor: anchor })
    }

    pub fn get_connection(&self) -> Result<Connection, StoreError> {
        self.database.connect().map_err(|e| {
            error!("connection allocation failed: {}", e);
            StoreError::ConnectionError(e.to_string())
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/mimosa-store/src/client.rs]
