//! Three-way partition of two name collections (tables, or columns within a table).

use std::collections::HashSet;

/// Result of partitioning base names against target names.
///
/// Every list is sorted lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetPartition {
    /// Present in base, absent in target.
    pub missing_from_target: Vec<String>,
    /// Present in target, absent in base.
    pub extra_in_target: Vec<String>,
    /// Present in both.
    pub common: Vec<String>,
}

impl SetPartition {
    /// Whether both sides hold exactly the same names.
    pub fn is_aligned(&self) -> bool {
        self.missing_from_target.is_empty() && self.extra_in_target.is_empty()
    }
}

/// Partition `base` and `target` names into missing, extra, and common.
pub fn partition<'a, B, T>(base: B, target: T) -> SetPartition
where
    B: IntoIterator<Item = &'a str>,
    T: IntoIterator<Item = &'a str>,
{
    let base: HashSet<&str> = base.into_iter().collect();
    let target: HashSet<&str> = target.into_iter().collect();

    SetPartition {
        missing_from_target: sorted(base.difference(&target)),
        extra_in_target: sorted(target.difference(&base)),
        common: sorted(base.intersection(&target)),
    }
}

fn sorted<'a>(names: impl Iterator<Item = &'a &'a str>) -> Vec<String> {
    let mut out: Vec<String> = names.map(|n| n.to_string()).collect();
    out.sort();
    out
}
