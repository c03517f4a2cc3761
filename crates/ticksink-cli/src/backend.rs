//! Store selection for CLI commands.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ticksink_core::config::postgres_config_from_env;
use ticksink_warehouse::{DuckDbStore, PostgresStore, QuoteStore, StoreError, StoredQuote};

use crate::cli::{Cli, StoreKind};
use crate::error::CliError;

/// An opened store, keeping the concrete type for read-back commands.
#[derive(Clone)]
pub enum Backend {
    Postgres(Arc<PostgresStore>),
    DuckDb(Arc<DuckDbStore>),
}

impl Backend {
    /// Open the store chosen on the command line.
    pub fn open(cli: &Cli) -> Result<Self, CliError> {
        match cli.store {
            StoreKind::Postgres => {
                let config = postgres_config_from_env()?;
                Ok(Self::Postgres(Arc::new(PostgresStore::new(&config))))
            }
            StoreKind::DuckDb => {
                let path = cli
                    .duckdb_path
                    .clone()
                    .unwrap_or_else(|| default_duckdb_path(&resolve_ticksink_home()));
                Ok(Self::DuckDb(Arc::new(DuckDbStore::open(path)?)))
            }
        }
    }

    pub fn quote_store(&self) -> Arc<dyn QuoteStore> {
        match self {
            Self::Postgres(store) => Arc::clone(store) as Arc<dyn QuoteStore>,
            Self::DuckDb(store) => Arc::clone(store) as Arc<dyn QuoteStore>,
        }
    }

    pub async fn latest_quote(&self, symbol: &str) -> Result<Option<StoredQuote>, StoreError> {
        match self {
            Self::Postgres(store) => store.latest_quote(symbol).await,
            Self::DuckDb(store) => {
                let store = Arc::clone(store);
                let symbol = symbol.to_owned();
                tokio::task::spawn_blocking(move || store.latest_quote(&symbol))
                    .await
                    .map_err(|error| StoreError::Write(format!("read task failed: {error}")))?
            }
        }
    }
}

/// `<home>/ticksink.duckdb`.
pub fn default_duckdb_path(home: &Path) -> PathBuf {
    home.join("ticksink.duckdb")
}

/// Resolve the ticksink home directory from environment or default.
fn resolve_ticksink_home() -> PathBuf {
    if let Some(path) = env::var_os("TICKSINK_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".ticksink");
    }

    PathBuf::from(".ticksink")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn duckdb_backend_honors_explicit_path() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("local").join("quotes.duckdb");
        let cli = Cli::try_parse_from([
            "ticksink",
            "--store",
            "duckdb",
            "--duckdb-path",
            path.to_str().expect("utf-8 path"),
            "latest",
        ])
        .expect("parse");

        let backend = Backend::open(&cli).expect("open");
        let Backend::DuckDb(store) = &backend else {
            panic!("expected duckdb backend");
        };
        assert_eq!(store.db_path(), Some(path.as_path()));
        assert_eq!(backend.quote_store().dialect().as_str(), "duckdb");
    }

    #[tokio::test]
    async fn latest_on_a_fresh_duckdb_store_is_empty() {
        let backend = Backend::DuckDb(Arc::new(DuckDbStore::open_in_memory().expect("open")));
        assert!(backend.latest_quote("IBM").await.expect("read").is_none());
    }

    #[test]
    fn default_path_lives_under_home() {
        let path = default_duckdb_path(Path::new("/srv/ticksink"));
        assert_eq!(path, PathBuf::from("/srv/ticksink/ticksink.duckdb"));
    }
}
