//! Command implementations: diff, snapshot, snapshots.

pub mod diff;
pub mod snapshot;
