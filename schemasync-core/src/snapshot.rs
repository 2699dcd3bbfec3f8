//! Schema snapshot files.
//!
//! A snapshot is a captured [`SchemaSnapshot`] stored as pretty-printed JSON,
//! so it can stand in for a live database on either side of a diff.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Engine, SnapshotSettings};
use crate::error::{Result, SchemaSyncError};
use crate::schema::SchemaSnapshot;

const SNAPSHOT_EXTENSION: &str = "json";

/// A schema captured at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Timestamp-based identifier, also the file stem.
    pub snapshot_id: String,
    /// Redacted description of where the schema came from.
    pub source: String,
    /// Engine the schema was read from, if known.
    #[serde(default)]
    pub engine: Option<Engine>,
    pub captured_at: DateTime<Utc>,
    pub schema: SchemaSnapshot,
}

impl SnapshotFile {
    /// Wrap a freshly captured schema. `side` is appended to the id so base
    /// and target captured in the same second do not collide.
    pub fn new(side: &str, source: String, engine: Option<Engine>, schema: SchemaSnapshot) -> Self {
        let captured_at = Utc::now();
        Self {
            snapshot_id: format!("{}_{}", captured_at.format("%Y%m%d_%H%M%S"), side),
            source,
            engine,
            captured_at,
            schema,
        }
    }

    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SchemaSyncError::SnapshotError {
                    reason: format!("Snapshot file not found: {}", path.display()),
                }
            } else {
                SchemaSyncError::IoError(e)
            }
        })?;

        serde_json::from_str(&content).map_err(|e| SchemaSyncError::SnapshotError {
            reason: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    /// Write the snapshot into `dir` as `<snapshot_id>.json`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", self.snapshot_id, SNAPSHOT_EXTENSION));
        let json = serde_json::to_string_pretty(self).map_err(|e| SchemaSyncError::SnapshotError {
            reason: format!("Failed to serialize snapshot: {}", e),
        })?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// Info about a stored snapshot.
#[derive(Debug, Serialize)]
pub struct SnapshotInfo {
    pub id: String,
    pub path: PathBuf,
    pub source: String,
    pub tables: usize,
    pub size_bytes: u64,
    /// Human-readable capture timestamp.
    pub created: String,
}

/// Save `file` under the configured directory and prune old snapshots.
pub fn store(file: &SnapshotFile, settings: &SnapshotSettings) -> Result<PathBuf> {
    let path = file.save(&settings.directory)?;
    log::info!(
        "Snapshot written; id={}, path={}, tables={}",
        file.snapshot_id,
        path.display(),
        file.schema.tables().len()
    );
    prune_snapshots(&settings.directory, settings.max_snapshots)?;
    Ok(path)
}

/// List stored snapshots, newest first. Unreadable files are skipped.
pub fn list_snapshots(settings: &SnapshotSettings) -> Result<Vec<SnapshotInfo>> {
    let dir = &settings.directory;
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();
    for path in snapshot_paths(dir)? {
        let file = match SnapshotFile::load(&path) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("Skipping unreadable snapshot; path={}, error={}", path.display(), e);
                continue;
            }
        };
        let size_bytes = std::fs::metadata(&path)?.len();

        snapshots.push(SnapshotInfo {
            id: file.snapshot_id,
            path,
            source: file.source,
            tables: file.schema.tables().len(),
            size_bytes,
            created: file.captured_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        });
    }

    snapshots.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(snapshots)
}

/// Delete the oldest snapshots until at most `max` remain.
///
/// At least one snapshot is always kept, so a freshly stored file survives.
pub fn prune_snapshots(dir: &Path, max: usize) -> Result<()> {
    let mut paths = snapshot_paths(dir)?;
    paths.sort();

    let excess = paths.len().saturating_sub(max.max(1));
    for oldest in paths.into_iter().take(excess) {
        log::debug!("Pruning snapshot; path={}", oldest.display());
        if let Err(e) = std::fs::remove_file(&oldest) {
            log::warn!("Failed to prune snapshot; path={}, error={}", oldest.display(), e);
        }
    }

    Ok(())
}

fn snapshot_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == SNAPSHOT_EXTENSION))
        .collect())
}
