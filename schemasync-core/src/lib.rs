//! Schema comparison and migration generation for MySQL and PostgreSQL.
//!
//! Compares a *base* schema (the desired state) against a *target* schema and
//! emits the DDL that brings the target in line with the base.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use schemasync_core::config::{CliOverrides, SchemaSyncConfig};
//! use schemasync_core::SchemaSync;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SchemaSyncConfig::load(None, &CliOverrides::default())?;
//! let report = SchemaSync::new(config).diff().await?;
//! for stmt in &report.statements {
//!     println!("{}", stmt);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`config`]: configuration loading (TOML, env vars, CLI overrides)
//! - [`db`]: connections, TLS, retries
//! - [`schema`]: column, table, and snapshot value types
//! - [`introspect`]: reading schemas from MySQL, PostgreSQL, or snapshot files
//! - [`compare`]: name-set partitioning
//! - [`column_diff`]: per-column attribute comparison
//! - [`ddl`]: DDL statement synthesis
//! - [`generator`]: the diff pipeline
//! - [`snapshot`]: snapshot files on disk
//! - [`commands`]: command implementations
//! - [`multi`]: multi-pair orchestration
//! - [`error`]: error types

pub mod column_diff;
pub mod commands;
pub mod compare;
pub mod config;
pub mod db;
pub mod ddl;
pub mod error;
pub mod generator;
pub mod introspect;
pub mod multi;
pub mod schema;
pub mod snapshot;

use config::SchemaSyncConfig;
use error::Result;

pub use commands::diff::DiffReport;
pub use commands::snapshot::{Side, SnapshotReport};
pub use config::CliOverrides;
pub use ddl::Dialect;
pub use error::SchemaSyncError;
pub use generator::{GeneratorOptions, Migration, MigrationGenerator, SchemaChange};
pub use introspect::{SchemaIntrospector, StaticIntrospector};
pub use multi::MultiResult;
pub use schema::{ColumnDescriptor, KeyRole, SchemaSnapshot, TableSchema};
pub use snapshot::{SnapshotFile, SnapshotInfo};

/// Main entry point for the library.
///
/// Connections are opened per command and dropped when it finishes.
pub struct SchemaSync {
    pub config: SchemaSyncConfig,
}

impl SchemaSync {
    pub fn new(config: SchemaSyncConfig) -> Self {
        Self { config }
    }

    /// Compare the configured base against the configured target.
    pub async fn diff(&self) -> Result<DiffReport> {
        commands::diff::execute(&self.config).await
    }

    /// Capture one side into the snapshot directory.
    pub async fn snapshot(&self, side: Side) -> Result<SnapshotReport> {
        commands::snapshot::execute_snapshot(&self.config, side).await
    }

    /// List stored snapshots, newest first.
    pub fn snapshots(&self) -> Result<Vec<SnapshotInfo>> {
        commands::snapshot::execute_list(&self.config)
    }

    /// Run every configured comparison, or only the one named `filter`.
    pub async fn diff_all(&self, filter: Option<&str>, fail_fast: bool) -> Result<MultiResult> {
        multi::diff_all(&self.config, filter, fail_fast).await
    }
}
