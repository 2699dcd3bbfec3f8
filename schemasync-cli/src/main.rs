//! CLI entry point for the schemasync tool.
//! Provides clap-based command routing, exit code mapping based on
//! error type, and multi-pair dispatch.

mod output;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use schemasync_core::config::{CliOverrides, SchemaSyncConfig};
use schemasync_core::error::SchemaSyncError;
use schemasync_core::{SchemaSync, Side};

/// Top-level CLI definition with global flags and subcommand dispatch.
#[derive(Parser)]
#[command(
    name = "schemasync",
    about = "Compare two database schemas and generate the DDL that aligns them",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file path
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<String>,

    /// Base (desired) database URL (overrides config)
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Target database URL (overrides config)
    #[arg(long, value_name = "URL", global = true)]
    target_url: Option<String>,

    /// Read the base schema from a snapshot file instead of a database
    #[arg(long, value_name = "FILE", global = true)]
    base_snapshot: Option<PathBuf>,

    /// Read the target schema from a snapshot file instead of a database
    #[arg(long, value_name = "FILE", global = true)]
    target_snapshot: Option<PathBuf>,

    /// PostgreSQL schema to read on the base side
    #[arg(long, value_name = "SCHEMA", global = true)]
    base_schema: Option<String>,

    /// PostgreSQL schema to read on the target side
    #[arg(long, value_name = "SCHEMA", global = true)]
    target_schema: Option<String>,

    /// DDL dialect: mysql, postgres (default: base engine)
    #[arg(long, value_name = "DIALECT", global = true)]
    dialect: Option<String>,

    /// Fail on composite primary keys instead of using the first column
    #[arg(long, global = true)]
    strict_primary_keys: bool,

    /// Number of retries when connecting to a database
    #[arg(long, value_name = "N", global = true)]
    connect_retries: Option<u32>,

    /// SSL/TLS mode: disable, prefer, require
    #[arg(long, value_name = "MODE", global = true)]
    ssl_mode: Option<String>,

    /// Connection timeout in seconds (default: 30, 0 = no timeout)
    #[arg(long, value_name = "SECS", global = true)]
    connect_timeout: Option<u32>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose/debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Base,
    Target,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Base => Side::Base,
            SideArg::Target => Side::Target,
        }
    }
}

/// All available schemasync subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Generate DDL that brings the target schema in line with the base
    Diff {
        /// Write generated SQL to file
        #[arg(long, value_name = "PATH")]
        output: Option<String>,
        /// Exit with code 10 when differences are found
        #[arg(long)]
        exit_code: bool,
    },

    /// Capture a schema into the snapshot directory
    Snapshot {
        /// Which side to capture
        #[arg(long, value_enum, default_value = "base")]
        side: SideArg,
    },

    /// List stored snapshots
    Snapshots,

    /// Diff every [[comparisons]] pair from the config file
    DiffAll {
        /// Only run the comparison with this name
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        /// Stop reporting after the first failed comparison
        #[arg(long)]
        fail_fast: bool,
        /// Exit with code 10 when differences are found
        #[arg(long)]
        exit_code: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging (suppress when JSON output is requested)
    let filter = if cli.json {
        "error"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    env_logger::Builder::new()
        .parse_env(env_logger::Env::default().default_filter_or(filter))
        .format_target(false)
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli).await {
        print_error(&e);
        process::exit(exit_code(&e));
    }
}

/// Map error types to differentiated exit codes.
fn exit_code(error: &SchemaSyncError) -> i32 {
    match error {
        SchemaSyncError::ConfigError(_) => 2,
        SchemaSyncError::ConnectionError { .. } => 4,
        SchemaSyncError::QueryError { .. } => 4,
        SchemaSyncError::UnsupportedSchema { .. } => 5,
        SchemaSyncError::SnapshotError { .. } => 6,
        SchemaSyncError::ComparisonsFailed { .. } => 7,
        SchemaSyncError::ChangesDetected { .. } => 10,
        SchemaSyncError::IoError(_) => 1,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), SchemaSyncError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| SchemaSyncError::ConfigError(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Build configuration and dispatch the chosen subcommand.
async fn run(cli: Cli) -> Result<(), SchemaSyncError> {
    let json_output = cli.json;
    let quiet = cli.quiet;

    let overrides = CliOverrides {
        base_url: cli.base_url,
        target_url: cli.target_url,
        base_snapshot: cli.base_snapshot,
        target_snapshot: cli.target_snapshot,
        base_schema: cli.base_schema,
        target_schema: cli.target_schema,
        dialect: cli.dialect,
        strict_primary_keys: if cli.strict_primary_keys {
            Some(true)
        } else {
            None
        },
        connect_retries: cli.connect_retries,
        ssl_mode: cli.ssl_mode,
        connect_timeout: cli.connect_timeout,
    };

    let config = SchemaSyncConfig::load(cli.config.as_deref(), &overrides)?;
    log::debug!(
        "Configuration loaded; base={}, target={}, comparisons={}",
        config.base.describe(),
        config.target.describe(),
        config.comparisons.len()
    );
    let sync = SchemaSync::new(config);

    match cli.command {
        Commands::Diff {
            output: output_file,
            exit_code,
        } => {
            let report = sync.diff().await?;
            if json_output {
                print_json(&report)?;
            } else if output_file.is_none() {
                output::print_diff_report(&report, quiet);
            }

            if let Some(path) = output_file {
                std::fs::write(&path, report.sql())?;
                log::debug!("Wrote migration SQL; path={}", path);
                if !json_output && !quiet {
                    println!(
                        "{}",
                        format!(
                            "{} statement(s) written to {}",
                            report.statements.len(),
                            path
                        )
                        .green()
                    );
                }
            }

            if exit_code && report.has_changes {
                return Err(SchemaSyncError::ChangesDetected {
                    count: report.statements.len(),
                });
            }
        }
        Commands::Snapshot { side } => {
            let report = sync.snapshot(side.into()).await?;
            if json_output {
                print_json(&report)?;
            } else {
                output::print_snapshot_report(&report);
            }
        }
        Commands::Snapshots => {
            let snapshots = sync.snapshots()?;
            if json_output {
                print_json(&snapshots)?;
            } else {
                output::print_snapshot_list(&snapshots);
            }
        }
        Commands::DiffAll {
            name,
            fail_fast,
            exit_code,
        } => {
            let result = sync.diff_all(name.as_deref(), fail_fast).await?;
            if json_output {
                print_json(&result)?;
            } else {
                output::print_multi_result(&result, quiet);
            }

            if !result.all_succeeded {
                let failed: Vec<&str> = result
                    .results
                    .iter()
                    .filter(|r| !r.success)
                    .map(|r| r.name.as_str())
                    .collect();
                return Err(SchemaSyncError::ComparisonsFailed {
                    names: failed.join(", "),
                });
            }
            if exit_code && result.has_changes() {
                return Err(SchemaSyncError::ChangesDetected {
                    count: result.results.iter().map(|r| r.statements.len()).sum(),
                });
            }
        }
    }

    Ok(())
}

/// Print a formatted error message with actionable hints to stderr.
fn print_error(error: &SchemaSyncError) {
    if let SchemaSyncError::ChangesDetected { .. } = error {
        // Not a failure of the tool; the report was already printed.
        return;
    }

    eprintln!("{} {}", "ERROR:".red().bold(), error);

    match error {
        SchemaSyncError::ConfigError(_) => {
            eprintln!(
                "{}",
                "Hint: Check your schemasync.toml or set SCHEMASYNC_BASE_URL / SCHEMASYNC_TARGET_URL."
                    .dimmed()
            );
        }
        SchemaSyncError::ConnectionError { .. } => {
            eprintln!(
                "{}",
                "Hint: Verify the database is running and connection details are correct.".dimmed()
            );
        }
        SchemaSyncError::QueryError { .. } => {
            eprintln!(
                "{}",
                "Hint: A table may have been dropped or renamed while the schema was being read. Re-run the diff."
                    .dimmed()
            );
        }
        SchemaSyncError::UnsupportedSchema { .. } => {
            eprintln!(
                "{}",
                "Hint: Drop --strict-primary-keys to generate DDL using the first primary key column."
                    .dimmed()
            );
        }
        SchemaSyncError::SnapshotError { .. } => {
            eprintln!(
                "{}",
                "Hint: Run 'schemasync snapshots' to see the snapshot files available.".dimmed()
            );
        }
        _ => {}
    }
}
