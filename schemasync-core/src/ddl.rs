//! DDL synthesis: pure functions from schema values to statement strings.
//!
//! Identifiers and types are emitted verbatim as introspected. Default values
//! are emitted as the raw expression the database reported.

use std::fmt;

use crate::column_diff::diff_column;
use crate::error::SchemaSyncError;
use crate::schema::{ColumnDescriptor, TableSchema};

/// SQL dialect used when a statement has no portable spelling.
///
/// Only column alteration differs between dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// `ALTER TABLE t CHANGE COLUMN c c <type> ...`
    #[default]
    MySql,
    /// `ALTER TABLE t ALTER COLUMN c TYPE <type>, ...`
    Postgres,
}

impl std::str::FromStr for Dialect {
    type Err = SchemaSyncError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            _ => Err(SchemaSyncError::ConfigError(format!(
                "Invalid dialect '{}'. Use 'mysql' or 'postgres'.",
                s
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// `<name> <type>[ NOT NULL][ DEFAULT <value>]`
pub fn column_clause(column: &ColumnDescriptor) -> String {
    let mut clause = format!("{} {}", column.name, column.column_type);
    if !column.nullable {
        clause.push_str(" NOT NULL");
    }
    if let Some(ref default) = column.default {
        clause.push_str(&format!(" DEFAULT {}", default));
    }
    clause
}

/// Create `table` with base's columns in declared order.
///
/// Only the first primary column is turned into a `PRIMARY KEY` clause.
pub fn create_table(table: &str, schema: &TableSchema) -> String {
    let mut lines: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| format!("\t{}", column_clause(c)))
        .collect();

    if let Some(pk) = schema.primary_columns().first() {
        lines.push(format!("\tPRIMARY KEY ({})", pk.name));
    }

    format!("CREATE TABLE {} (\n{}\n);", table, lines.join(",\n"))
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE {};", table)
}

pub fn add_column(table: &str, column: &ColumnDescriptor) -> String {
    format!("ALTER TABLE {} ADD COLUMN {};", table, column_clause(column))
}

pub fn drop_column(table: &str, column: &str) -> String {
    format!("ALTER TABLE {} DROP COLUMN {};", table, column)
}

/// Alter a common column so it matches `base`.
///
/// The statement is a delta: the type is always restated, nullability and
/// default only when they differ from `target`. On MySQL, clauses left out of
/// `CHANGE COLUMN` are reset by the server, so an unchanged NOT NULL or
/// DEFAULT may be lost when only the type changes.
pub fn change_column(
    dialect: Dialect,
    table: &str,
    base: &ColumnDescriptor,
    target: &ColumnDescriptor,
) -> String {
    let delta = diff_column(base, target);
    let name = &base.name;

    match dialect {
        Dialect::MySql => {
            let mut stmt = format!(
                "ALTER TABLE {} CHANGE COLUMN {} {} {}",
                table, name, name, base.column_type
            );
            if delta.nullability_changed {
                stmt.push_str(if base.nullable { " NULL" } else { " NOT NULL" });
            }
            if delta.default_changed {
                let default = base.default.as_deref().unwrap_or("NULL");
                stmt.push_str(&format!(" DEFAULT {}", default));
            }
            stmt.push(';');
            stmt
        }
        Dialect::Postgres => {
            let mut actions = vec![format!("ALTER COLUMN {} TYPE {}", name, base.column_type)];
            if delta.nullability_changed {
                actions.push(if base.nullable {
                    format!("ALTER COLUMN {} DROP NOT NULL", name)
                } else {
                    format!("ALTER COLUMN {} SET NOT NULL", name)
                });
            }
            if delta.default_changed {
                actions.push(match base.default {
                    Some(ref default) => format!("ALTER COLUMN {} SET DEFAULT {}", name, default),
                    None => format!("ALTER COLUMN {} DROP DEFAULT", name),
                });
            }
            format!("ALTER TABLE {} {};", table, actions.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> TableSchema {
        TableSchema::new(vec![
            ColumnDescriptor::new("id", "int(11)").not_null().primary_key(),
            ColumnDescriptor::new("user_id", "int(11)").not_null().keyed(),
            ColumnDescriptor::new("status", "varchar(20)")
                .not_null()
                .with_default("'new'"),
            ColumnDescriptor::new("note", "text"),
        ])
    }

    #[test]
    fn test_column_clause() {
        assert_eq!(column_clause(&ColumnDescriptor::new("note", "text")), "note text");
        assert_eq!(
            column_clause(
                &ColumnDescriptor::new("qty", "int")
                    .not_null()
                    .with_default("0")
            ),
            "qty int NOT NULL DEFAULT 0"
        );
        assert_eq!(
            column_clause(&ColumnDescriptor::new("created", "datetime").with_default("CURRENT_TIMESTAMP")),
            "created datetime DEFAULT CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_create_table() {
        assert_eq!(
            create_table("orders", &orders()),
            "CREATE TABLE orders (\n\
             \tid int(11) NOT NULL,\n\
             \tuser_id int(11) NOT NULL,\n\
             \tstatus varchar(20) NOT NULL DEFAULT 'new',\n\
             \tnote text,\n\
             \tPRIMARY KEY (id)\n\
             );"
        );
    }

    #[test]
    fn test_create_table_without_primary_key() {
        let schema = TableSchema::new(vec![ColumnDescriptor::new("line", "text")]);
        assert_eq!(create_table("logs", &schema), "CREATE TABLE logs (\n\tline text\n);");
    }

    #[test]
    fn test_create_table_composite_key_uses_first_primary() {
        let schema = TableSchema::new(vec![
            ColumnDescriptor::new("order_id", "int").not_null().primary_key(),
            ColumnDescriptor::new("line_no", "int").not_null().primary_key(),
        ]);
        let ddl = create_table("order_items", &schema);
        assert!(ddl.contains("\tPRIMARY KEY (order_id)\n"));
        assert!(!ddl.contains("line_no)"));
    }

    #[test]
    fn test_drop_and_add_statements() {
        assert_eq!(drop_table("logs"), "DROP TABLE logs;");
        assert_eq!(drop_column("users", "legacy"), "ALTER TABLE users DROP COLUMN legacy;");
        assert_eq!(
            add_column("users", &ColumnDescriptor::new("age", "int").not_null().with_default("0")),
            "ALTER TABLE users ADD COLUMN age int NOT NULL DEFAULT 0;"
        );
    }

    #[test]
    fn test_change_column_type_only() {
        let base = ColumnDescriptor::new("email", "varchar(50)").not_null();
        let target = ColumnDescriptor::new("email", "varchar(255)").not_null();
        assert_eq!(
            change_column(Dialect::MySql, "users", &base, &target),
            "ALTER TABLE users CHANGE COLUMN email email varchar(50);"
        );
    }

    #[test]
    fn test_change_column_nullability() {
        let base = ColumnDescriptor::new("email", "varchar(100)").not_null();
        let target = ColumnDescriptor::new("email", "varchar(100)");
        assert_eq!(
            change_column(Dialect::MySql, "users", &base, &target),
            "ALTER TABLE users CHANGE COLUMN email email varchar(100) NOT NULL;"
        );
        assert_eq!(
            change_column(Dialect::MySql, "users", &target, &base),
            "ALTER TABLE users CHANGE COLUMN email email varchar(100) NULL;"
        );
    }

    #[test]
    fn test_change_column_default() {
        let base = ColumnDescriptor::new("qty", "int").with_default("1");
        let target = ColumnDescriptor::new("qty", "int").with_default("0");
        assert_eq!(
            change_column(Dialect::MySql, "items", &base, &target),
            "ALTER TABLE items CHANGE COLUMN qty qty int DEFAULT 1;"
        );

        let no_default = ColumnDescriptor::new("qty", "int");
        assert_eq!(
            change_column(Dialect::MySql, "items", &no_default, &target),
            "ALTER TABLE items CHANGE COLUMN qty qty int DEFAULT NULL;"
        );
    }

    #[test]
    fn test_change_column_postgres() {
        let base = ColumnDescriptor::new("qty", "integer").not_null();
        let target = ColumnDescriptor::new("qty", "bigint").with_default("0");
        assert_eq!(
            change_column(Dialect::Postgres, "items", &base, &target),
            "ALTER TABLE items ALTER COLUMN qty TYPE integer, \
             ALTER COLUMN qty SET NOT NULL, ALTER COLUMN qty DROP DEFAULT;"
        );

        let retyped = ColumnDescriptor::new("qty", "bigint").not_null();
        assert_eq!(
            change_column(Dialect::Postgres, "items", &base, &retyped),
            "ALTER TABLE items ALTER COLUMN qty TYPE integer;"
        );
    }

    #[test]
    fn test_dialect_parse() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert!("oracle".parse::<Dialect>().is_err());
        assert_eq!(Dialect::Postgres.to_string(), "postgres");
    }
}
