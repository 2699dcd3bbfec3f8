//! Schema data model: column descriptors, table schemas, and point-in-time snapshots.
//!
//! Used by the generator, the snapshot files, and every introspector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Role a column plays in the table's keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Part of the primary key.
    Primary,
    /// Part of some other key (unique, multiple, foreign).
    Other,
    /// Not part of any key.
    #[default]
    None,
}

impl KeyRole {
    /// Parse the `Key` marker reported by `DESC`/`SHOW COLUMNS`.
    ///
    /// `PRI` is primary, an empty marker is none, anything else (`UNI`, `MUL`) is other.
    pub fn from_marker(marker: &str) -> Self {
        match marker.trim() {
            "PRI" => KeyRole::Primary,
            "" => KeyRole::None,
            _ => KeyRole::Other,
        }
    }
}

/// Parse the `Null` marker reported by `DESC`/`SHOW COLUMNS` or `information_schema`.
///
/// Only `NO` means not nullable.
pub fn nullable_from_marker(marker: &str) -> bool {
    marker.trim() != "NO"
}

/// One column as seen at introspection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Name of the column.
    pub name: String,
    /// Raw database type string, e.g. `varchar(255)`.
    pub column_type: String,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Key membership of the column.
    #[serde(default)]
    pub key_role: KeyRole,
    /// Default value expression, if any.
    #[serde(default)]
    pub default: Option<String>,
}

impl ColumnDescriptor {
    /// Build a nullable, keyless column without a default.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable: true,
            key_role: KeyRole::None,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.key_role = KeyRole::Primary;
        self
    }

    pub fn keyed(mut self) -> Self {
        self.key_role = KeyRole::Other;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A table's columns in the order the database reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    /// Columns in declared order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// All columns whose key role is primary, in declared order.
    pub fn primary_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| c.key_role == KeyRole::Primary)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<ColumnDescriptor> for TableSchema {
    fn from_iter<I: IntoIterator<Item = ColumnDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Point-in-time view of every table in one database.
///
/// Built once per side and never mutated after capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaSnapshot {
    pub fn new(tables: BTreeMap<String, TableSchema>) -> Self {
        Self { tables }
    }

    /// Table names in lexicographic order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> &BTreeMap<String, TableSchema> {
        &self.tables
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.values().map(TableSchema::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, TableSchema)> for SchemaSnapshot {
    fn from_iter<I: IntoIterator<Item = (N, TableSchema)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_role_markers() {
        assert_eq!(KeyRole::from_marker("PRI"), KeyRole::Primary);
        assert_eq!(KeyRole::from_marker(""), KeyRole::None);
        assert_eq!(KeyRole::from_marker("UNI"), KeyRole::Other);
        assert_eq!(KeyRole::from_marker("MUL"), KeyRole::Other);
    }

    #[test]
    fn test_nullable_markers() {
        assert!(!nullable_from_marker("NO"));
        assert!(nullable_from_marker("YES"));
        assert!(nullable_from_marker(""));
    }

    #[test]
    fn test_primary_columns_keep_declared_order() {
        let table = TableSchema::new(vec![
            ColumnDescriptor::new("order_id", "int").not_null().primary_key(),
            ColumnDescriptor::new("note", "text"),
            ColumnDescriptor::new("line_no", "int").not_null().primary_key(),
        ]);
        let names: Vec<&str> = table
            .primary_columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["order_id", "line_no"]);
        assert!(table.column("note").is_some());
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot: SchemaSnapshot = [(
            "users",
            TableSchema::new(vec![
                ColumnDescriptor::new("id", "int").not_null().primary_key(),
                ColumnDescriptor::new("email", "varchar(100)").with_default("''"),
            ]),
        )]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tables"]["users"][0]["key_role"], "primary");
        assert_eq!(json["tables"]["users"][1]["default"], "''");

        let parsed: SchemaSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.column_count(), 2);
    }
}
