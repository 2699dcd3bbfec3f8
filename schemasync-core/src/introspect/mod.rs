//! Schema introspection: the boundary between the diff engine and live databases.
//!
//! Every source of schema information implements [`SchemaIntrospector`]. The
//! generator only ever talks to this trait.

mod mysql;
mod postgres;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::config::{DatabaseConfig, Engine};
use crate::error::{Result, SchemaSyncError};
use crate::schema::{SchemaSnapshot, TableSchema};
use crate::snapshot::SnapshotFile;

pub use self::mysql::MySqlIntrospector;
pub use self::postgres::PostgresIntrospector;

/// Schema introspection interface for one side of a comparison.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Label used in errors and logs, e.g. `base` or `target`.
    fn side(&self) -> &str;

    /// Engine behind this source, when known.
    fn engine(&self) -> Option<Engine> {
        None
    }

    /// Names of all base tables.
    async fn list_tables(&self) -> Result<BTreeSet<String>>;

    /// Columns of `table` in the order the database reports them.
    ///
    /// Fails with `QueryError` if the table no longer exists.
    async fn describe_table(&self, table: &str) -> Result<TableSchema>;
}

/// Capture a point-in-time snapshot of every table the introspector lists.
///
/// Any failure aborts the capture; no partial snapshot is returned.
pub async fn capture<I>(introspector: &I) -> Result<SchemaSnapshot>
where
    I: SchemaIntrospector + ?Sized,
{
    let names = introspector.list_tables().await?;
    log::debug!(
        "Listed tables; side={}, count={}",
        introspector.side(),
        names.len()
    );

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let schema = introspector.describe_table(&name).await?;
        log::debug!(
            "Described table; side={}, table={}, columns={}",
            introspector.side(),
            name,
            schema.len()
        );
        tables.push((name, schema));
    }

    Ok(tables.into_iter().collect())
}

/// Introspector serving an already captured snapshot.
///
/// Backs snapshot files and tests; never touches the network.
#[derive(Debug, Clone)]
pub struct StaticIntrospector {
    side: String,
    engine: Option<Engine>,
    snapshot: SchemaSnapshot,
}

impl StaticIntrospector {
    pub fn new(side: impl Into<String>, snapshot: SchemaSnapshot) -> Self {
        Self {
            side: side.into(),
            engine: None,
            snapshot,
        }
    }

    /// Serve the schema stored in a snapshot file.
    pub fn from_file(side: impl Into<String>, file: SnapshotFile) -> Self {
        Self {
            side: side.into(),
            engine: file.engine,
            snapshot: file.schema,
        }
    }

    pub fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl SchemaIntrospector for StaticIntrospector {
    fn side(&self) -> &str {
        &self.side
    }

    fn engine(&self) -> Option<Engine> {
        self.engine
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>> {
        Ok(self.snapshot.table_names().map(str::to_string).collect())
    }

    async fn describe_table(&self, table: &str) -> Result<TableSchema> {
        self.snapshot
            .table(table)
            .cloned()
            .ok_or_else(|| SchemaSyncError::QueryError {
                side: self.side.clone(),
                operation: format!("describe {}", table),
                reason: "table does not exist".to_string(),
            })
    }
}

/// Open the schema source configured for one side.
///
/// A configured snapshot file wins over any live connection settings.
pub async fn open(side: &str, config: &DatabaseConfig) -> Result<Box<dyn SchemaIntrospector>> {
    if let Some(ref path) = config.snapshot {
        log::info!("Reading snapshot; side={}, path={}", side, path.display());
        let file = SnapshotFile::load(path)?;
        return Ok(Box::new(StaticIntrospector::from_file(side, file)));
    }

    if !config.is_configured() {
        return Err(SchemaSyncError::ConfigError(format!(
            "No {} database configured. Set a URL, connection fields, or a snapshot file.",
            side
        )));
    }

    log::info!("Connecting; side={}, source={}", side, config.describe());
    match config.resolved_engine()? {
        Engine::MySql => {
            let conn = crate::db::connect_mysql(side, config).await?;
            Ok(Box::new(MySqlIntrospector::new(side, conn)))
        }
        Engine::Postgres => {
            let client = crate::db::connect_postgres(side, config).await?;
            Ok(Box::new(PostgresIntrospector::new(
                side,
                client,
                config.schema.clone(),
            )))
        }
    }
}
