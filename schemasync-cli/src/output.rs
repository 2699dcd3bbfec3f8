//! Terminal output formatting for schemasync commands.
//! Uses comfy-table for tabular output and colored for
//! change-aware terminal styling.

use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use schemasync_core::{DiffReport, MultiResult, SnapshotInfo, SnapshotReport};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.into_iter().map(Cell::new).collect::<Vec<_>>());
    table
}

fn print_change_line(line: &str) {
    if line.starts_with('+') {
        println!("  {}", line.green());
    } else if line.starts_with('-') {
        println!("  {}", line.red());
    } else {
        println!("  {}", line.yellow());
    }
}

/// Print diff report.
pub fn print_diff_report(report: &DiffReport, quiet: bool) {
    if !report.has_changes {
        if !quiet {
            println!("{}", "No schema differences detected.".green().bold());
        }
        return;
    }

    if !quiet {
        println!(
            "{}",
            format!("Found {} schema difference(s):", report.changes.len())
                .yellow()
                .bold()
        );
        println!();
        for change in &report.changes {
            print_change_line(&change.to_string());
        }
        println!();
        println!("{}", "Generated SQL:".bold());
    }

    // Statements go to stdout undecorated so they can be piped.
    print!("{}", report.sql());
}

/// Print snapshot report.
pub fn print_snapshot_report(report: &SnapshotReport) {
    println!(
        "{}",
        format!(
            "Snapshot '{}' created ({} tables, {} columns)",
            report.snapshot_id, report.tables, report.columns
        )
        .green()
        .bold()
    );
    println!("  {} {}", "→".green(), report.snapshot_path);
}

/// Print list of stored snapshots.
pub fn print_snapshot_list(snapshots: &[SnapshotInfo]) {
    if snapshots.is_empty() {
        println!("{}", "No snapshots found.".yellow());
        return;
    }

    let mut table = new_table(vec!["ID", "Captured", "Source", "Tables", "Size"]);
    for s in snapshots {
        table.add_row(vec![
            Cell::new(&s.id),
            Cell::new(&s.created),
            Cell::new(&s.source),
            Cell::new(s.tables),
            Cell::new(format_size(s.size_bytes)),
        ]);
    }

    println!("{table}");
}

fn format_size(bytes: u64) -> String {
    if bytes > 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes > 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

/// Print multi-pair results as a table, followed by each pair's statements.
pub fn print_multi_result(result: &MultiResult, quiet: bool) {
    if !quiet {
        let mut table = new_table(vec!["Comparison", "Status", "Result"]);
        for r in &result.results {
            let status = if !r.success {
                Cell::new("FAILED").fg(Color::Red)
            } else if r.statements.is_empty() {
                Cell::new("ALIGNED").fg(Color::Green)
            } else {
                Cell::new("CHANGES").fg(Color::Yellow)
            };
            table.add_row(vec![Cell::new(&r.name), status, Cell::new(&r.message)]);
        }
        println!("{table}");
    }

    for r in result.results.iter().filter(|r| !r.statements.is_empty()) {
        println!();
        println!("{}", format!("-- {}", r.name).bold());
        for stmt in &r.statements {
            println!("{}", stmt);
        }
    }

    if quiet {
        return;
    }
    println!();
    if result.all_succeeded {
        println!(
            "{}",
            format!("All {} comparison(s) completed.", result.results.len())
                .green()
                .bold()
        );
    } else {
        let failed = result.results.iter().filter(|r| !r.success).count();
        println!("{}", format!("{} comparison(s) failed.", failed).red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(2048), "2.0KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0MB");
    }
}
