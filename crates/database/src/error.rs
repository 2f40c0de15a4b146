//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// A JSON column failed to decode into its model type
    #[error("corrupt {entity} record: {source}")]
    Corrupt {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for database operations. Modules with their own error enums
/// override the error parameter.
pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;
