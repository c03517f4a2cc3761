//! CLI argument definitions for ticksink.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Fetch the latest quote once and upsert it |
//! | `schedule` | Run on a fixed interval with retry on transient failures |
//! | `latest` | Print the newest stored row for a symbol |
//! | `schema` | Print the table DDL |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--store` | `postgres` | Destination store (postgres, duckdb) |
//! | `--duckdb-path` | `$TICKSINK_HOME/ticksink.duckdb` | DuckDB file for `--store duckdb` |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! # One run against the configured PostgreSQL database
//! ticksink run
//!
//! # Hourly runs into a local DuckDB file
//! ticksink --store duckdb schedule --every-secs 3600
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Hourly intraday quote ingestion.
#[derive(Debug, Parser)]
#[command(
    name = "ticksink",
    author,
    version,
    about = "Fetch the latest intraday quote and upsert it into a SQL store"
)]
pub struct Cli {
    /// Destination store.
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::Postgres)]
    pub store: StoreKind,

    /// DuckDB database file, used with `--store duckdb`.
    #[arg(long, global = true)]
    pub duckdb_path: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Store backends selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// PostgreSQL at host `postgres`, credentials from `POSTGRES_*`.
    Postgres,
    /// Embedded DuckDB file.
    #[value(name = "duckdb")]
    DuckDb,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote once and upsert it.
    Run(RunArgs),
    /// Run repeatedly on a fixed interval.
    Schedule(ScheduleArgs),
    /// Print the newest stored row for a symbol.
    Latest(LatestArgs),
    /// Print the DDL that provisions the table.
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Print the run outcome as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    /// Seconds between scheduled runs.
    #[arg(long, default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
    pub every_secs: u64,

    /// Extra attempts for a run that failed with a transient error.
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Seconds to wait before retrying a failed run.
    #[arg(long, default_value_t = 300)]
    pub retry_delay_secs: u64,

    /// Stop after this many scheduled runs.
    #[arg(long)]
    pub max_runs: Option<u64>,
}

#[derive(Debug, Args)]
pub struct LatestArgs {
    /// Symbol to look up; defaults to `STOCK_SYMBOL` or IBM.
    pub symbol: Option<String>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// SQL dialect to print.
    #[arg(long, value_enum, default_value_t = StoreKind::Postgres)]
    pub dialect: StoreKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn schedule_defaults_match_hourly_policy() {
        let cli = Cli::try_parse_from(["ticksink", "schedule"]).expect("parse");
        let Command::Schedule(args) = cli.command else {
            panic!("expected schedule");
        };
        assert_eq!(args.every_secs, 3600);
        assert_eq!(args.retries, 1);
        assert_eq!(args.retry_delay_secs, 300);
        assert_eq!(args.max_runs, None);
        assert_eq!(cli.store, StoreKind::Postgres);
    }

    #[test]
    fn store_flag_is_global() {
        let cli = Cli::try_parse_from(["ticksink", "run", "--store", "duckdb", "--json"])
            .expect("parse");
        assert_eq!(cli.store, StoreKind::DuckDb);
        assert!(matches!(cli.command, Command::Run(RunArgs { json: true })));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Cli::try_parse_from(["ticksink", "schedule", "--every-secs", "0"]).is_err());
    }
}
