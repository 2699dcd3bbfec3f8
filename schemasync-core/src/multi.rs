//! Multi-pair orchestration.
//!
//! Runs every `[[comparisons]]` entry from the configuration. Pairs are
//! independent, so each one gets its own task and its own connections;
//! results are always reported in configuration order.

use std::collections::HashSet;

use serde::Serialize;

use crate::commands::diff;
use crate::config::{NamedComparison, SchemaSyncConfig};
use crate::error::{Result, SchemaSyncError};

/// Result of diffing one named pair.
#[derive(Debug, Serialize)]
pub struct ComparisonResult {
    /// Name of the comparison as configured.
    pub name: String,
    /// Whether the pair was diffed without error.
    pub success: bool,
    /// Human-readable summary, or the error message.
    pub message: String,
    /// Generated statements; empty on failure or when aligned.
    pub statements: Vec<String>,
}

/// Aggregate result of a multi-pair run.
#[derive(Debug, Serialize)]
pub struct MultiResult {
    pub results: Vec<ComparisonResult>,
    /// Whether every reported comparison succeeded.
    pub all_succeeded: bool,
}

impl MultiResult {
    /// Whether any successful comparison produced statements.
    pub fn has_changes(&self) -> bool {
        self.results.iter().any(|r| !r.statements.is_empty())
    }
}

/// Pick the comparisons to run, optionally narrowed to one name.
pub fn select<'a>(
    comparisons: &'a [NamedComparison],
    filter: Option<&str>,
) -> Result<Vec<&'a NamedComparison>> {
    if comparisons.is_empty() {
        return Err(SchemaSyncError::ConfigError(
            "No [[comparisons]] configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for c in comparisons {
        if c.name.is_empty() {
            return Err(SchemaSyncError::ConfigError(
                "Every [[comparisons]] entry needs a name".to_string(),
            ));
        }
        if !seen.insert(c.name.as_str()) {
            return Err(SchemaSyncError::ConfigError(format!(
                "Duplicate comparison name '{}'",
                c.name
            )));
        }
    }

    match filter {
        None => Ok(comparisons.iter().collect()),
        Some(name) => match comparisons.iter().find(|c| c.name == name) {
            Some(c) => Ok(vec![c]),
            None => Err(SchemaSyncError::ConfigError(format!(
                "Comparison '{}' not found. Available: {}",
                name,
                comparisons
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        },
    }
}

/// Diff every selected pair concurrently.
///
/// With `fail_fast`, results after the first failure (in configuration
/// order) are not reported.
pub async fn diff_all(
    config: &SchemaSyncConfig,
    filter: Option<&str>,
    fail_fast: bool,
) -> Result<MultiResult> {
    let selected = select(&config.comparisons, filter)?;

    let mut handles = Vec::with_capacity(selected.len());
    for pair in selected {
        let config = config.clone();
        let pair = pair.clone();
        let name = pair.name.clone();
        log::info!("Starting comparison; name={}", name);
        let handle =
            tokio::spawn(async move { diff::compare(&config, &pair.base, &pair.target).await });
        handles.push((name, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    let mut stopped = false;
    for (name, handle) in handles {
        if stopped {
            handle.abort();
            continue;
        }

        let result = match handle.await {
            Ok(Ok(report)) => ComparisonResult {
                message: if report.has_changes {
                    format!("{} statement(s)", report.statements.len())
                } else {
                    "Schemas are aligned".to_string()
                },
                name,
                success: true,
                statements: report.statements,
            },
            Ok(Err(e)) => ComparisonResult {
                name,
                success: false,
                message: e.to_string(),
                statements: Vec::new(),
            },
            Err(e) => ComparisonResult {
                name,
                success: false,
                message: format!("Comparison task failed: {}", e),
                statements: Vec::new(),
            },
        };

        if result.success {
            log::info!("Comparison finished; name={}, {}", result.name, result.message);
        } else {
            log::error!("Comparison failed; name={}, error={}", result.name, result.message);
            stopped = fail_fast;
        }
        results.push(result);
    }

    let all_succeeded = results.iter().all(|r| r.success);
    Ok(MultiResult {
        results,
        all_succeeded,
    })
}
