//! Capture a schema into a snapshot file, and list stored snapshots.

use std::fmt;

use serde::Serialize;

use crate::config::{DatabaseConfig, SchemaSyncConfig};
use crate::error::{Result, SchemaSyncError};
use crate::introspect;
use crate::snapshot::{self, SnapshotFile, SnapshotInfo};

/// Which side of the configuration to capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Base,
    Target,
}

impl Side {
    fn config(self, config: &SchemaSyncConfig) -> &DatabaseConfig {
        match self {
            Side::Base => &config.base,
            Side::Target => &config.target,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Base => write!(f, "base"),
            Side::Target => write!(f, "target"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = SchemaSyncError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(Side::Base),
            "target" => Ok(Side::Target),
            _ => Err(SchemaSyncError::ConfigError(format!(
                "Invalid side '{}'. Use 'base' or 'target'.",
                s
            ))),
        }
    }
}

/// Report from a snapshot operation.
#[derive(Debug, Serialize)]
pub struct SnapshotReport {
    pub snapshot_id: String,
    /// Filesystem path where the snapshot was written.
    pub snapshot_path: String,
    pub tables: usize,
    pub columns: usize,
}

/// Capture one side and store it in the snapshot directory.
pub async fn execute_snapshot(config: &SchemaSyncConfig, side: Side) -> Result<SnapshotReport> {
    let db = side.config(config);
    let label = side.to_string();
    let introspector = introspect::open(&label, db).await?;
    let schema = introspect::capture(introspector.as_ref()).await?;

    let source = match db.snapshot {
        Some(ref path) => path.display().to_string(),
        None => db.describe(),
    };
    let file = SnapshotFile::new(&label, source, introspector.engine(), schema);
    let path = snapshot::store(&file, &config.snapshots)?;

    Ok(SnapshotReport {
        snapshot_id: file.snapshot_id,
        snapshot_path: path.display().to_string(),
        tables: file.schema.tables().len(),
        columns: file.schema.column_count(),
    })
}

/// List stored snapshots, newest first.
pub fn execute_list(config: &SchemaSyncConfig) -> Result<Vec<SnapshotInfo>> {
    snapshot::list_snapshots(&config.snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnapshotSettings;
    use crate::schema::{ColumnDescriptor, SchemaSnapshot, TableSchema};

    #[test]
    fn test_side_parse() {
        assert_eq!("base".parse::<Side>().unwrap(), Side::Base);
        assert_eq!("TARGET".parse::<Side>().unwrap(), Side::Target);
        assert!("left".parse::<Side>().is_err());
    }

    #[tokio::test]
    async fn test_snapshot_of_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let schema: SchemaSnapshot = [(
            "users",
            TableSchema::new(vec![
                ColumnDescriptor::new("id", "int").not_null().primary_key(),
                ColumnDescriptor::new("email", "varchar(100)"),
            ]),
        )]
        .into_iter()
        .collect();
        let mut source = SnapshotFile::new("target", "fixture".to_string(), None, schema.clone());
        source.snapshot_id = "fixture".to_string();
        let source_path = source.save(dir.path()).unwrap();

        let config = SchemaSyncConfig {
            target: DatabaseConfig {
                snapshot: Some(source_path),
                ..Default::default()
            },
            snapshots: SnapshotSettings {
                directory: dir.path().join("out"),
                max_snapshots: 5,
            },
            ..Default::default()
        };

        let report = execute_snapshot(&config, Side::Target).await.unwrap();
        assert_eq!(report.tables, 1);
        assert_eq!(report.columns, 2);
        assert!(report.snapshot_id.ends_with("_target"));

        let stored = SnapshotFile::load(std::path::Path::new(&report.snapshot_path)).unwrap();
        assert_eq!(stored.schema, schema);

        let listed = execute_list(&config).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, report.snapshot_id);
    }
}
