//! Migration generation: snapshot both sides, partition, and synthesize DDL.
//!
//! Statements are emitted in a fixed order:
//!
//! 1. `DROP TABLE` for every table only the target has
//! 2. `CREATE TABLE` for every table only the base has
//! 3. per common table: `DROP COLUMN`, then `ADD COLUMN`, then column changes
//!
//! Names within each group are sorted so the output is reproducible.

use std::fmt;

use serde::Serialize;

use crate::column_diff::{diff_column, ColumnDelta};
use crate::compare::partition;
use crate::ddl::{self, Dialect};
use crate::error::{Result, SchemaSyncError};
use crate::introspect::{capture, SchemaIntrospector};
use crate::schema::{ColumnDescriptor, SchemaSnapshot, TableSchema};

/// Knobs that influence how changes are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub dialect: Dialect,
    /// Fail on composite primary keys instead of keeping only the first column.
    pub strict_primary_keys: bool,
}

/// One difference between base and target, in the direction base -> target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaChange {
    /// Table exists only in the target and is dropped.
    TableDropped { table: String },
    /// Table exists only in the base and is created with base's columns.
    TableCreated { table: String, columns: TableSchema },
    /// Column exists only in the target table.
    ColumnDropped { table: String, column: String },
    /// Column exists only in the base table.
    ColumnAdded {
        table: String,
        column: ColumnDescriptor,
    },
    /// Column exists on both sides with differing attributes.
    ColumnChanged {
        table: String,
        base: ColumnDescriptor,
        target: ColumnDescriptor,
        delta: ColumnDelta,
    },
}

impl SchemaChange {
    /// Table the change applies to.
    pub fn table(&self) -> &str {
        match self {
            SchemaChange::TableDropped { table }
            | SchemaChange::TableCreated { table, .. }
            | SchemaChange::ColumnDropped { table, .. }
            | SchemaChange::ColumnAdded { table, .. }
            | SchemaChange::ColumnChanged { table, .. } => table,
        }
    }

    /// Render the change as a single DDL statement.
    pub fn to_ddl(&self, dialect: Dialect) -> String {
        match self {
            SchemaChange::TableDropped { table } => ddl::drop_table(table),
            SchemaChange::TableCreated { table, columns } => ddl::create_table(table, columns),
            SchemaChange::ColumnDropped { table, column } => ddl::drop_column(table, column),
            SchemaChange::ColumnAdded { table, column } => ddl::add_column(table, column),
            SchemaChange::ColumnChanged {
                table,
                base,
                target,
                ..
            } => ddl::change_column(dialect, table, base, target),
        }
    }
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaChange::TableDropped { table } => write!(f, "- TABLE {}", table),
            SchemaChange::TableCreated { table, columns } => {
                write!(f, "+ TABLE {} ({} columns)", table, columns.len())
            }
            SchemaChange::ColumnDropped { table, column } => {
                write!(f, "- COLUMN {}.{}", table, column)
            }
            SchemaChange::ColumnAdded { table, column } => {
                write!(f, "+ COLUMN {}.{} ({})", table, column.name, column.column_type)
            }
            SchemaChange::ColumnChanged {
                table, base, delta, ..
            } => write!(f, "~ COLUMN {}.{} ({})", table, base.name, delta),
        }
    }
}

/// Ordered changes and the statements rendering them.
///
/// `statements[i]` is the DDL for `changes[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Migration {
    pub changes: Vec<SchemaChange>,
    pub statements: Vec<String>,
}

impl Migration {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Statements joined into one script, one statement per line.
    pub fn to_sql(&self) -> String {
        let mut sql = self.statements.join("\n");
        if !sql.is_empty() {
            sql.push('\n');
        }
        sql
    }
}

/// Compute the changes that bring `target` in line with `base`.
pub fn diff(
    base: &SchemaSnapshot,
    target: &SchemaSnapshot,
    options: GeneratorOptions,
) -> Result<Vec<SchemaChange>> {
    let tables = partition(base.table_names(), target.table_names());
    let mut changes = Vec::new();

    for table in tables.extra_in_target {
        changes.push(SchemaChange::TableDropped { table });
    }

    for table in tables.missing_from_target {
        let Some(columns) = base.table(&table) else {
            continue;
        };
        check_primary_key(&table, columns, options)?;
        changes.push(SchemaChange::TableCreated {
            columns: columns.clone(),
            table,
        });
    }

    for table in tables.common {
        let (Some(base_table), Some(target_table)) = (base.table(&table), target.table(&table))
        else {
            continue;
        };
        diff_table(&table, base_table, target_table, &mut changes);
    }

    Ok(changes)
}

fn diff_table(
    table: &str,
    base: &TableSchema,
    target: &TableSchema,
    changes: &mut Vec<SchemaChange>,
) {
    let columns = partition(base.column_names(), target.column_names());

    for column in columns.extra_in_target {
        changes.push(SchemaChange::ColumnDropped {
            table: table.to_string(),
            column,
        });
    }

    for name in &columns.missing_from_target {
        if let Some(column) = base.column(name) {
            changes.push(SchemaChange::ColumnAdded {
                table: table.to_string(),
                column: column.clone(),
            });
        }
    }

    for name in &columns.common {
        let (Some(b), Some(t)) = (base.column(name), target.column(name)) else {
            continue;
        };
        let delta = diff_column(b, t);
        if delta.is_changed() {
            changes.push(SchemaChange::ColumnChanged {
                table: table.to_string(),
                base: b.clone(),
                target: t.clone(),
                delta,
            });
        }
    }
}

fn check_primary_key(table: &str, columns: &TableSchema, options: GeneratorOptions) -> Result<()> {
    let primary = columns.primary_columns();
    if primary.len() < 2 {
        return Ok(());
    }

    let names: Vec<&str> = primary.iter().map(|c| c.name.as_str()).collect();
    if options.strict_primary_keys {
        return Err(SchemaSyncError::UnsupportedSchema {
            table: table.to_string(),
            reason: format!("composite primary key ({})", names.join(", ")),
        });
    }

    log::warn!(
        "Composite primary key reduced to its first column; table={}, columns={}",
        table,
        names.join(",")
    );
    Ok(())
}

/// Diff two captured snapshots and render every change.
pub fn plan(
    base: &SchemaSnapshot,
    target: &SchemaSnapshot,
    options: GeneratorOptions,
) -> Result<Migration> {
    let changes = diff(base, target, options)?;
    let statements = changes.iter().map(|c| c.to_ddl(options.dialect)).collect();
    Ok(Migration {
        changes,
        statements,
    })
}

/// Drives a full run against two introspectors.
pub struct MigrationGenerator<'a> {
    base: &'a dyn SchemaIntrospector,
    target: &'a dyn SchemaIntrospector,
    options: GeneratorOptions,
}

impl<'a> MigrationGenerator<'a> {
    pub fn new(
        base: &'a dyn SchemaIntrospector,
        target: &'a dyn SchemaIntrospector,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            base,
            target,
            options,
        }
    }

    /// Capture both sides, one after the other, then plan.
    pub async fn generate(&self) -> Result<Migration> {
        let base = capture(self.base).await?;
        log::info!(
            "Captured base schema; tables={}, columns={}",
            base.tables().len(),
            base.column_count()
        );

        let target = capture(self.target).await?;
        log::info!(
            "Captured target schema; tables={}, columns={}",
            target.tables().len(),
            target.column_count()
        );

        let migration = plan(&base, &target, self.options)?;
        log::info!(
            "Generated migration; statements={}, dialect={}",
            migration.len(),
            self.options.dialect
        );
        Ok(migration)
    }
}
