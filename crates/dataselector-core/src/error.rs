//! Error types for the DataSelector core

use thiserror::Error;

/// Result type for DataSelector operations
pub type Result<T> = std::result::Result<T, DataSelectorError>;

/// Errors raised by the core and its collaborators
#[derive(Debug, Error)]
pub enum DataSelectorError {
    /// Database client or server error (listing, counting, stored procedures)
    #[error("Database error: {0}")]
    Database(String),

    /// Syntax or semantic error reported by the server for a probe statement
    #[error("SQL error: {0}")]
    Sql(String),

    /// Could not open the probe connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Probe did not complete in time
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// GIS map/layer service error (copy, export, map creation)
    #[error("Map service error: {0}")]
    Map(String),

    /// User-supplied input that cannot be used as-is
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A precondition that must hold before any server work
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Saved query file could not be read or written
    #[error("Query file error: {0}")]
    QueryFile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataSelectorError {
    pub fn database(msg: impl Into<String>) -> Self {
        DataSelectorError::Database(msg.into())
    }

    pub fn map(msg: impl Into<String>) -> Self {
        DataSelectorError::Map(msg.into())
    }

    /// True for errors originating in the SQL text itself rather than transport
    pub fn is_sql_error(&self) -> bool {
        matches!(self, DataSelectorError::Sql(_))
    }
}

impl From<anyhow::Error> for DataSelectorError {
    fn from(err: anyhow::Error) -> Self {
        DataSelectorError::Config(err.to_string())
    }
}
