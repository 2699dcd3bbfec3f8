//! Attribute comparison for a pair of same-named columns.

use std::fmt;

use serde::Serialize;

use crate::schema::ColumnDescriptor;

/// Which attributes differ between the base and target versions of a column.
///
/// Key role is never compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnDelta {
    pub type_changed: bool,
    pub nullability_changed: bool,
    pub default_changed: bool,
}

impl ColumnDelta {
    /// Whether any compared attribute differs.
    pub fn is_changed(&self) -> bool {
        self.type_changed || self.nullability_changed || self.default_changed
    }
}

impl fmt::Display for ColumnDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.type_changed {
            parts.push("type");
        }
        if self.nullability_changed {
            parts.push("nullability");
        }
        if self.default_changed {
            parts.push("default");
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Compare `base` against `target`.
pub fn diff_column(base: &ColumnDescriptor, target: &ColumnDescriptor) -> ColumnDelta {
    debug_assert_eq!(base.name, target.name);
    ColumnDelta {
        type_changed: base.column_type != target.column_type,
        nullability_changed: base.nullable != target.nullable,
        default_changed: base.default != target.default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_columns() {
        let c = ColumnDescriptor::new("email", "varchar(100)").not_null();
        let delta = diff_column(&c, &c.clone());
        assert!(!delta.is_changed());
        assert_eq!(delta, ColumnDelta::default());
    }

    #[test]
    fn test_each_attribute_detected() {
        let base = ColumnDescriptor::new("email", "varchar(50)");

        let retyped = ColumnDescriptor::new("email", "varchar(255)");
        let delta = diff_column(&base, &retyped);
        assert!(delta.type_changed && !delta.nullability_changed && !delta.default_changed);

        let strict = ColumnDescriptor::new("email", "varchar(50)").not_null();
        let delta = diff_column(&base, &strict);
        assert!(!delta.type_changed && delta.nullability_changed && !delta.default_changed);

        let defaulted = ColumnDescriptor::new("email", "varchar(50)").with_default("''");
        let delta = diff_column(&base, &defaulted);
        assert!(!delta.type_changed && !delta.nullability_changed && delta.default_changed);
        assert_eq!(delta.to_string(), "default");
    }

    #[test]
    fn test_key_role_alone_is_not_a_change() {
        let base = ColumnDescriptor::new("id", "int").not_null().primary_key();
        let target = ColumnDescriptor::new("id", "int").not_null().keyed();
        assert!(!diff_column(&base, &target).is_changed());
    }

    #[test]
    fn test_display_lists_all_changes() {
        let base = ColumnDescriptor::new("n", "int").not_null().with_default("0");
        let target = ColumnDescriptor::new("n", "bigint");
        assert_eq!(
            diff_column(&base, &target).to_string(),
            "type, nullability, default"
        );
    }
}
