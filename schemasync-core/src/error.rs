//! Error types for schemasync operations.

use thiserror::Error;

/// Extract the full error message from a tokio_postgres::Error,
/// including the underlying DbError details that Display hides.
pub fn format_db_error(e: &tokio_postgres::Error) -> String {
    if let Some(db_err) = e.as_db_error() {
        let mut msg = db_err.message().to_string();
        if let Some(detail) = db_err.detail() {
            msg.push_str(&format!("\n  Detail: {}", detail));
        }
        if let Some(hint) = db_err.hint() {
            msg.push_str(&format!("\n  Hint: {}", hint));
        }
        return msg;
    }
    // Fallback: walk the source chain
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        msg.push_str(&format!(": {}", s));
        source = s.source();
    }
    if e.is_closed() {
        msg.push_str("\n  Note: The database connection was closed unexpectedly.");
    }
    msg
}

/// All error types that schemasync operations can produce.
#[derive(Error, Debug)]
pub enum SchemaSyncError {
    /// Invalid or missing configuration (TOML parse errors, missing required fields, etc.).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The introspection collaborator for one side could not be reached or went away.
    #[error("Connection error ({side}): {detail}")]
    ConnectionError { side: String, detail: String },

    /// A specific introspection query failed, e.g. a table vanished mid-run.
    #[error("Query failed ({side}) during {operation}: {reason}")]
    QueryError {
        side: String,
        operation: String,
        reason: String,
    },

    /// A table uses a shape the synthesizer only approximates (composite primary keys).
    #[error("Unsupported schema in table '{table}': {reason}")]
    UnsupportedSchema { table: String, reason: String },

    /// A snapshot file could not be written, read, or parsed.
    #[error("Snapshot error: {reason}")]
    SnapshotError { reason: String },

    /// A filesystem I/O operation failed (config, snapshot, or output files).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// One or more named comparisons in a multi-pair run failed.
    #[error("Comparison(s) failed: {names}")]
    ComparisonsFailed { names: String },

    /// Differences were found and the caller asked for that to be treated as failure.
    #[error("Schema differences detected: {count} statement(s)")]
    ChangesDetected { count: usize },
}

impl SchemaSyncError {
    /// Classify a tokio-postgres error raised while introspecting one side.
    ///
    /// Closed connections and transport failures become `ConnectionError`;
    /// anything the server answered becomes `QueryError`.
    pub fn from_postgres(side: &str, operation: &str, e: tokio_postgres::Error) -> Self {
        if e.is_closed() || e.as_db_error().is_none() {
            SchemaSyncError::ConnectionError {
                side: side.to_string(),
                detail: format_db_error(&e),
            }
        } else {
            SchemaSyncError::QueryError {
                side: side.to_string(),
                operation: operation.to_string(),
                reason: format_db_error(&e),
            }
        }
    }

    /// Classify a mysql_async error raised while introspecting one side.
    pub fn from_mysql(side: &str, operation: &str, e: mysql_async::Error) -> Self {
        match e {
            mysql_async::Error::Server(server) => SchemaSyncError::QueryError {
                side: side.to_string(),
                operation: operation.to_string(),
                reason: format!("{} (code {})", server.message, server.code),
            },
            other => SchemaSyncError::ConnectionError {
                side: side.to_string(),
                detail: other.to_string(),
            },
        }
    }
}

/// Convenience type alias for `Result<T, SchemaSyncError>`.
pub type Result<T> = std::result::Result<T, SchemaSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_server_error_is_query_error() {
        let err = mysql_async::Error::Server(mysql_async::ServerError {
            code: 1146,
            message: "Table 'app.gone' doesn't exist".to_string(),
            state: "42S02".to_string(),
        });
        let classified = SchemaSyncError::from_mysql("target", "describe gone", err);
        match classified {
            SchemaSyncError::QueryError {
                side,
                operation,
                reason,
            } => {
                assert_eq!(side, "target");
                assert_eq!(operation, "describe gone");
                assert!(reason.contains("1146"));
            }
            other => panic!("expected QueryError, got {other:?}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = SchemaSyncError::UnsupportedSchema {
            table: "order_items".to_string(),
            reason: "composite primary key (order_id, line_no)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported schema in table 'order_items': composite primary key (order_id, line_no)"
        );
    }
}
