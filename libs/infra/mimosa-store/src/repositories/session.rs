// INICIO DEL ARCHIVO [libs/infra/mimosa-store/src/repositories/session.rs]
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

/// The admin/API facade's lightweight session table (§4.11): an
/// opaque bearer token tied to a user row, with a server-side expiry.
pub struct SessionRepository {
    client: StoreClient,
}

impl SessionRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, token))]
    pub async fn create(&self, token: &str, user_id: u64, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, expires_at.to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    /// Returns the session's user id if `token` exists and has not
    /// expired. An expired row is left for the reaper to delete later
    /// rather than cleaned up inline here.
    #[instrument(skip(self, token))]
    pub async fn valid_user_id(&self, token: &str, now: DateTime<Utc>) -> Result<Option<u64>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT user_id, expires_at FROM sessions WHERE token = ?1", params![token])
            .await?;
        match rows.next().await? {
            Some(row) => {
                let expires_at: String = row.get(1)?;
                let expires_at = DateTime::parse_from_rfc3339(&expires_at)
                    .map_err(|e| StoreError::MappingError(e.to_string()))?
                    .with_timezone(&Utc);
                if expires_at <= now {
                    Ok(None)
                } else {
                    Ok(Some(row.get::<i64>(0)? as u64))
                }
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, token))]
    pub async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM sessions WHERE token = ?1", params![token]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now.to_rfc3339()]).await?;
        Ok(connection.changes())
    }
}

pub struct UserRepository {
    client: StoreClient,
}

impl UserRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, password_hash))]
    pub async fn create(&self, username: &str, password_hash: &str) -> Result<u64, StoreError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                params![username, password_hash],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    StoreError::Conflict(format!("username already taken: {}", username))
                } else {
                    StoreError::QueryError(e)
                }
            })?;
        Ok(connection.last_insert_rowid() as u64)
    }

    #[instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<(u64, String)>, StoreError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT id, password_hash FROM users WHERE username = ?1", params![username])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some((row.get::<i64>(0)? as u64, row.get(1)?))),
            None => Ok(None),
        }
    }
}
