//! MySQL / MariaDB introspection via `SHOW FULL TABLES` and `SHOW COLUMNS`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::Conn;
use tokio::sync::Mutex;

use crate::config::Engine;
use crate::db::quote_mysql_ident;
use crate::error::{Result, SchemaSyncError};
use crate::introspect::SchemaIntrospector;
use crate::schema::{nullable_from_marker, ColumnDescriptor, KeyRole, TableSchema};

/// One row of `SHOW COLUMNS`: Field, Type, Null, Key, Default, Extra.
type ColumnRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
);

/// Introspector over a single MySQL connection.
///
/// The connection is behind a mutex so each query completes before the next
/// one starts on the same handle.
pub struct MySqlIntrospector {
    side: String,
    conn: Mutex<Conn>,
}

impl MySqlIntrospector {
    pub fn new(side: impl Into<String>, conn: Conn) -> Self {
        Self {
            side: side.into(),
            conn: Mutex::new(conn),
        }
    }

    fn error(&self, operation: &str, e: mysql_async::Error) -> SchemaSyncError {
        SchemaSyncError::from_mysql(&self.side, operation, e)
    }
}

/// Column types whose literal defaults are valid SQL without quoting.
const UNQUOTED_TYPES: &[&str] = &[
    "tinyint", "smallint", "mediumint", "int", "integer", "bigint", "decimal", "numeric",
    "float", "double", "real", "bit", "bool", "boolean", "year",
];

/// Temporal keywords MySQL 5.7 reports as defaults without `DEFAULT_GENERATED`.
fn is_temporal_keyword(value: &str) -> bool {
    let upper = value.to_ascii_uppercase();
    let keyword = upper.split('(').next().unwrap_or("");
    matches!(
        keyword,
        "CURRENT_TIMESTAMP" | "NOW" | "LOCALTIME" | "LOCALTIMESTAMP" | "CURRENT_DATE" | "CURRENT_TIME"
    )
}

/// Render a `SHOW COLUMNS` default as it must appear after `DEFAULT`.
///
/// `SHOW COLUMNS` strips the quotes from string literals, so they are quoted
/// again here with embedded `'` doubled. Expression defaults keep their text,
/// wrapped in parentheses unless they are a temporal keyword.
fn normalize_default(column_type: &str, default: Option<String>, extra: &str) -> Option<String> {
    let value = default?;
    if extra.contains("DEFAULT_GENERATED") {
        if is_temporal_keyword(&value) {
            return Some(value);
        }
        return Some(format!("({})", value));
    }

    let base_type = column_type
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    if matches!(base_type.as_str(), "timestamp" | "datetime") && is_temporal_keyword(&value) {
        return Some(value);
    }
    if UNQUOTED_TYPES.contains(&base_type.as_str()) {
        return Some(value);
    }
    Some(format!("'{}'", value.replace('\'', "''")))
}

fn to_descriptor(row: ColumnRow) -> ColumnDescriptor {
    let (name, column_type, null, key, default, extra) = row;
    let default = normalize_default(&column_type, default, extra.as_deref().unwrap_or(""));
    ColumnDescriptor {
        name,
        column_type,
        nullable: nullable_from_marker(&null),
        key_role: KeyRole::from_marker(&key),
        default,
    }
}

#[async_trait]
impl SchemaIntrospector for MySqlIntrospector {
    fn side(&self) -> &str {
        &self.side
    }

    fn engine(&self) -> Option<Engine> {
        Some(Engine::MySql)
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<(String, String)> = conn
            .query("SHOW FULL TABLES")
            .await
            .map_err(|e| self.error("list tables", e))?;

        Ok(rows
            .into_iter()
            .filter(|(_, kind)| kind == "BASE TABLE")
            .map(|(name, _)| name)
            .collect())
    }

    async fn describe_table(&self, table: &str) -> Result<TableSchema> {
        let operation = format!("describe {}", table);
        let mut conn = self.conn.lock().await;
        let rows: Vec<ColumnRow> = conn
            .query(format!("SHOW COLUMNS FROM {}", quote_mysql_ident(table)))
            .await
            .map_err(|e| self.error(&operation, e))?;

        if rows.is_empty() {
            return Err(SchemaSyncError::QueryError {
                side: self.side.clone(),
                operation,
                reason: "table has no columns or no longer exists".to_string(),
            });
        }

        Ok(rows.into_iter().map(to_descriptor).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_descriptor_from_show_columns_row() {
        let row: ColumnRow = (
            "id".to_string(),
            "int(11)".to_string(),
            "NO".to_string(),
            "PRI".to_string(),
            None,
            Some("auto_increment".to_string()),
        );
        let column = to_descriptor(row);
        assert_eq!(column.name, "id");
        assert_eq!(column.column_type, "int(11)");
        assert!(!column.nullable);
        assert_eq!(column.key_role, KeyRole::Primary);
        assert_eq!(column.default, None);

        let row: ColumnRow = (
            "status".to_string(),
            "varchar(20)".to_string(),
            "YES".to_string(),
            "MUL".to_string(),
            Some("new".to_string()),
            Some(String::new()),
        );
        let column = to_descriptor(row);
        assert!(column.nullable);
        assert_eq!(column.key_role, KeyRole::Other);
        assert_eq!(column.default.as_deref(), Some("'new'"));
    }

    fn row_with_default(column_type: &str, default: &str, extra: &str) -> ColumnRow {
        (
            "c".to_string(),
            column_type.to_string(),
            "NO".to_string(),
            String::new(),
            Some(default.to_string()),
            Some(extra.to_string()),
        )
    }

    #[test]
    fn test_string_defaults_are_quoted_for_ddl() {
        let empty = to_descriptor(row_with_default("varchar(20)", "", ""));
        assert_eq!(empty.default.as_deref(), Some("''"));
        assert_eq!(
            crate::ddl::add_column("users", &empty),
            "ALTER TABLE users ADD COLUMN c varchar(20) NOT NULL DEFAULT '';"
        );

        let active = to_descriptor(row_with_default("varchar(20)", "active", ""));
        assert_eq!(
            crate::ddl::add_column("users", &active),
            "ALTER TABLE users ADD COLUMN c varchar(20) NOT NULL DEFAULT 'active';"
        );

        let quoted = to_descriptor(row_with_default("enum('a','b')", "it's", ""));
        assert_eq!(quoted.default.as_deref(), Some("'it''s'"));
    }

    #[test]
    fn test_numeric_and_expression_defaults_stay_unquoted() {
        let count = to_descriptor(row_with_default("int(11)", "0", ""));
        assert_eq!(count.default.as_deref(), Some("0"));

        let total = to_descriptor(row_with_default("decimal(10,2) unsigned", "0.00", ""));
        assert_eq!(total.default.as_deref(), Some("0.00"));

        let legacy_ts = to_descriptor(row_with_default("timestamp", "CURRENT_TIMESTAMP", ""));
        assert_eq!(legacy_ts.default.as_deref(), Some("CURRENT_TIMESTAMP"));

        let ts = to_descriptor(row_with_default(
            "datetime(3)",
            "CURRENT_TIMESTAMP(3)",
            "DEFAULT_GENERATED",
        ));
        assert_eq!(ts.default.as_deref(), Some("CURRENT_TIMESTAMP(3)"));

        let uuid = to_descriptor(row_with_default("char(36)", "uuid()", "DEFAULT_GENERATED"));
        assert_eq!(uuid.default.as_deref(), Some("(uuid())"));

        let word = to_descriptor(row_with_default("varchar(10)", "now", ""));
        assert_eq!(word.default.as_deref(), Some("'now'"));

        let plain_date = to_descriptor(row_with_default("date", "2020-01-01", ""));
        assert_eq!(plain_date.default.as_deref(), Some("'2020-01-01'"));
    }

    /// Requires a running MySQL instance; set TEST_MYSQL_URL to enable.
    #[tokio::test]
    async fn test_live_mysql_introspection() {
        let Ok(url) = std::env::var("TEST_MYSQL_URL") else {
            return;
        };
        let mut conn = Conn::new(mysql_async::Opts::from_url(&url).unwrap())
            .await
            .unwrap();
        conn.query_drop(
            "DROP TABLE IF EXISTS schemasync_introspect;
             CREATE TABLE schemasync_introspect (
                 id INT NOT NULL,
                 email VARCHAR(100) NOT NULL DEFAULT '',
                 note TEXT,
                 PRIMARY KEY (id)
             )",
        )
        .await
        .unwrap();

        let introspector = MySqlIntrospector::new("base", conn);
        let tables = introspector.list_tables().await.unwrap();
        assert!(tables.contains("schemasync_introspect"));

        let schema = introspector.describe_table("schemasync_introspect").await.unwrap();
        let names: Vec<&str> = schema.column_names().collect();
        assert_eq!(names, vec!["id", "email", "note"]);
        assert_eq!(schema.columns()[0].key_role, KeyRole::Primary);
        assert!(!schema.columns()[1].nullable);
        assert_eq!(schema.columns()[1].default.as_deref(), Some("''"));
        assert!(schema.columns()[2].nullable);

        let missing = introspector.describe_table("schemasync_absent").await;
        assert!(matches!(missing, Err(SchemaSyncError::QueryError { .. })));

        introspector
            .conn
            .lock()
            .await
            .query_drop("DROP TABLE schemasync_introspect")
            .await
            .unwrap();
    }
}
