//! Compare a base schema against a target and generate migration SQL.

use serde::Serialize;

use crate::config::{DatabaseConfig, SchemaSyncConfig};
use crate::ddl::Dialect;
use crate::error::Result;
use crate::generator::{Migration, MigrationGenerator, SchemaChange};
use crate::introspect;

/// Report produced by the diff command.
#[derive(Debug, Serialize)]
pub struct DiffReport {
    /// Individual differences, in statement order.
    pub changes: Vec<SchemaChange>,
    /// DDL bringing the target in line with the base.
    pub statements: Vec<String>,
    /// Whether any differences were detected.
    pub has_changes: bool,
}

impl DiffReport {
    /// All statements as one script.
    pub fn sql(&self) -> String {
        let mut sql = self.statements.join("\n");
        if !sql.is_empty() {
            sql.push('\n');
        }
        sql
    }
}

impl From<Migration> for DiffReport {
    fn from(migration: Migration) -> Self {
        let has_changes = !migration.is_empty();
        DiffReport {
            changes: migration.changes,
            statements: migration.statements,
            has_changes,
        }
    }
}

/// Execute the diff command for the configured base and target.
pub async fn execute(config: &SchemaSyncConfig) -> Result<DiffReport> {
    compare(config, &config.base, &config.target).await
}

/// Diff an arbitrary base/target pair using the global diff settings.
pub async fn compare(
    config: &SchemaSyncConfig,
    base: &DatabaseConfig,
    target: &DatabaseConfig,
) -> Result<DiffReport> {
    let base = introspect::open("base", base).await?;
    let target = introspect::open("target", target).await?;

    let options = config.generator_options(base.engine().map(Dialect::from));
    let migration = MigrationGenerator::new(base.as_ref(), target.as_ref(), options)
        .generate()
        .await?;

    Ok(migration.into())
}
