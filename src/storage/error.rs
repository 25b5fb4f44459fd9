//! Error taxonomy for graph store operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached at all. Fatal for a run.
    #[error("cannot reach graph store at {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// A constraint or index with the same definition already exists
    #[error("schema item already exists: {0}")]
    AlreadyExists(String),

    /// The store rejected a statement
    #[error("statement failed [{code}]: {message}")]
    Statement { code: String, message: String },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }
}
