//! PostgreSQL introspection via the system catalogs.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio_postgres::Client;

use crate::config::Engine;
use crate::error::{Result, SchemaSyncError};
use crate::introspect::SchemaIntrospector;
use crate::schema::{nullable_from_marker, ColumnDescriptor, KeyRole, TableSchema};

const LIST_TABLES_SQL: &str = "SELECT table_name::text
     FROM information_schema.tables
     WHERE table_schema = $1 AND table_type = 'BASE TABLE'
     ORDER BY table_name";

// Null and key markers are spelled the way MySQL's DESC reports them.
const DESCRIBE_TABLE_SQL: &str = "SELECT a.attname::text,
            format_type(a.atttypid, a.atttypmod),
            CASE WHEN a.attnotnull THEN 'NO' ELSE 'YES' END,
            CASE
                WHEN EXISTS (SELECT 1 FROM pg_constraint p
                             WHERE p.conrelid = c.oid AND p.contype = 'p'
                               AND a.attnum = ANY (p.conkey)) THEN 'PRI'
                WHEN EXISTS (SELECT 1 FROM pg_constraint k
                             WHERE k.conrelid = c.oid AND k.contype IN ('u', 'f')
                               AND a.attnum = ANY (k.conkey)) THEN 'MUL'
                ELSE ''
            END,
            pg_get_expr(d.adbin, d.adrelid)
     FROM pg_class c
     JOIN pg_namespace n ON n.oid = c.relnamespace
     JOIN pg_attribute a ON a.attrelid = c.oid
     LEFT JOIN pg_attrdef d ON d.adrelid = c.oid AND d.adnum = a.attnum
     WHERE n.nspname = $1 AND c.relname = $2 AND c.relkind IN ('r', 'p')
       AND a.attnum > 0 AND NOT a.attisdropped
     ORDER BY a.attnum";

/// Introspector over one PostgreSQL schema.
pub struct PostgresIntrospector {
    side: String,
    client: Client,
    schema: String,
}

impl PostgresIntrospector {
    pub fn new(side: impl Into<String>, client: Client, schema: impl Into<String>) -> Self {
        Self {
            side: side.into(),
            client,
            schema: schema.into(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl SchemaIntrospector for PostgresIntrospector {
    fn side(&self) -> &str {
        &self.side
    }

    fn engine(&self) -> Option<Engine> {
        Some(Engine::Postgres)
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>> {
        let rows = self
            .client
            .query(LIST_TABLES_SQL, &[&self.schema])
            .await
            .map_err(|e| SchemaSyncError::from_postgres(&self.side, "list tables", e))?;

        Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
    }

    async fn describe_table(&self, table: &str) -> Result<TableSchema> {
        let operation = format!("describe {}", table);
        let rows = self
            .client
            .query(DESCRIBE_TABLE_SQL, &[&self.schema, &table])
            .await
            .map_err(|e| SchemaSyncError::from_postgres(&self.side, &operation, e))?;

        if rows.is_empty() {
            return Err(SchemaSyncError::QueryError {
                side: self.side.clone(),
                operation,
                reason: format!("table does not exist in schema '{}'", self.schema),
            });
        }

        Ok(rows
            .iter()
            .map(|r| ColumnDescriptor {
                name: r.get(0),
                column_type: r.get(1),
                nullable: nullable_from_marker(r.get::<_, &str>(2)),
                key_role: KeyRole::from_marker(r.get::<_, &str>(3)),
                default: r.get(4),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    /// Requires a running PostgreSQL instance; set TEST_DATABASE_URL to enable.
    #[tokio::test]
    async fn test_live_postgres_introspection() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let config = DatabaseConfig {
            url: Some(url),
            ssl_mode: crate::config::SslMode::Disable,
            ..Default::default()
        };
        let client = crate::db::connect_postgres("base", &config).await.unwrap();
        client
            .batch_execute(
                "DROP SCHEMA IF EXISTS schemasync_introspect CASCADE;
                 CREATE SCHEMA schemasync_introspect;
                 CREATE TABLE schemasync_introspect.users (
                     id integer NOT NULL PRIMARY KEY,
                     email varchar(100) NOT NULL UNIQUE,
                     score integer DEFAULT 0
                 );",
            )
            .await
            .unwrap();

        let introspector = PostgresIntrospector::new("base", client, "schemasync_introspect");
        let tables = introspector.list_tables().await.unwrap();
        assert_eq!(tables.into_iter().collect::<Vec<_>>(), vec!["users"]);

        let schema = introspector.describe_table("users").await.unwrap();
        let columns = schema.columns();
        assert_eq!(columns[0].key_role, KeyRole::Primary);
        assert_eq!(columns[1].column_type, "character varying(100)");
        assert_eq!(columns[1].key_role, KeyRole::Other);
        assert!(!columns[1].nullable);
        assert_eq!(columns[2].default.as_deref(), Some("0"));
        assert_eq!(columns[2].key_role, KeyRole::None);

        let missing = introspector.describe_table("ghost").await;
        assert!(matches!(missing, Err(SchemaSyncError::QueryError { .. })));

        introspector
            .client()
            .batch_execute("DROP SCHEMA schemasync_introspect CASCADE")
            .await
            .unwrap();
    }
}
