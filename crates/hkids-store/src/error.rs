//! Error types for HKids storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection configuration could not be resolved to something usable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record.
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// Uniqueness violation (username, category name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            // 23505 = unique_violation
            if db.code().as_deref() == Some("23505") {
                return Self::Conflict(db.message().to_string());
            }
        }
        Self::Database(err.to_string())
    }
}

/// Classify a connection or initialization failure into a human-readable
/// diagnostic for startup logs.
///
/// Distinguishes wrong-password/authentication failures, refused
/// connections, and missing databases from generic errors, so a
/// misconfigured deployment fails loudly with an actionable message.
#[must_use]
pub fn classify_connect_error(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            // 28P01 = invalid_password
            Some("28P01") => format!(
                "authentication failed: wrong password for the configured user ({})",
                db.message()
            ),
            // 28000 = invalid_authorization_specification
            Some("28000") => format!("authentication failed: {}", db.message()),
            // 3D000 = invalid_catalog_name
            Some("3D000") => format!(
                "database does not exist: {} (create it or fix DB_NAME/DATABASE_URL)",
                db.message()
            ),
            _ => format!("database error: {}", db.message()),
        },
        sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
            format!("connection refused: is PostgreSQL running and reachable? ({io})")
        }
        sqlx::Error::PoolTimedOut => {
            "connection pool timed out waiting for the database".to_string()
        }
        other => format!("database error: {other}"),
    }
}
