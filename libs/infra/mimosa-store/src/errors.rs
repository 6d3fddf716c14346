// [libs/infra/mimosa-store/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database link unavailable: {0}")]
    ConnectionError(String),

    #[error("store configuration invalid: {0}")]
    ConfigurationError(String),

    #[error("query rejected: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("row mapping failed: {0}")]
    MappingError(String),

    #[error("record not found")]
    NotFound,

    #[error("a unique constraint rejected this write: {0}")]
    Conflict(String),
}
