//! Embedded quote store backed by `DuckDB`.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use ::duckdb::{Connection, OptionalExt, ToSql};
use time::PrimitiveDateTime;
use tracing::{debug, warn};

use crate::duckdb::{DuckDbConnectionManager, DuckDbTarget};
use crate::error::{classify_duckdb, StoreError};
use crate::models::{format_sql_timestamp, parse_sql_decimal, parse_sql_timestamp};
use crate::schema::{Dialect, TABLE_NAME};
use crate::{QuoteRecord, QuoteStore, StoredQuote};

const STORED_COLUMNS: &str = r#"
SELECT
    id,
    symbol,
    CAST("timestamp" AS VARCHAR),
    CAST(open AS VARCHAR),
    CAST(high AS VARCHAR),
    CAST(low AS VARCHAR),
    CAST(close AS VARCHAR),
    volume,
    CAST(fetched_at AS VARCHAR)
FROM stock_data
"#;

/// `DuckDB`-backed store, file or in-memory.
///
/// Writers are serialized through a single gate; `DuckDB` allows one writer per
/// database instance and reports conflicting concurrent updates as errors.
#[derive(Clone)]
pub struct DuckDbStore {
    manager: DuckDbConnectionManager,
    write_gate: Arc<Mutex<()>>,
}

impl DuckDbStore {
    /// Open (or create) a file-backed store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StoreError::connection)?;
            }
        }
        Self::with_target(DuckDbTarget::File(path))
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_target(DuckDbTarget::InMemory)
    }

    fn with_target(target: DuckDbTarget) -> Result<Self, StoreError> {
        let manager = DuckDbConnectionManager::open(target, 4).map_err(StoreError::connection)?;
        Ok(Self {
            manager,
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.manager.db_path()
    }

    /// Provision the table and upsert one record inside a single transaction.
    pub fn upsert_blocking(&self, record: &QuoteRecord) -> Result<(), StoreError> {
        let timestamp = format_sql_timestamp(record.timestamp)?;
        let fetched_at = format_sql_timestamp(record.fetched_at)?;
        let open = record.open.to_string();
        let high = record.high.to_string();
        let low = record.low.to_string();
        let close = record.close.to_string();

        let _writer = self
            .write_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let connection = self.manager.acquire().map_err(StoreError::connection)?;

        connection
            .execute_batch("BEGIN TRANSACTION")
            .map_err(classify_duckdb)?;
        let result = (|| -> Result<(), StoreError> {
            for statement in Dialect::DuckDb.create_statements() {
                connection.execute_batch(statement).map_err(classify_duckdb)?;
            }

            let params: [&dyn ToSql; 8] = [
                &record.symbol,
                &timestamp,
                &open,
                &high,
                &low,
                &close,
                &record.volume,
                &fetched_at,
            ];
            connection
                .execute(Dialect::DuckDb.upsert_statement(), params.as_slice())
                .map_err(classify_duckdb)?;
            Ok(())
        })();

        let outcome = finalize_transaction(&connection, result);
        if outcome.is_ok() {
            debug!(symbol = %record.symbol, timestamp = %timestamp, "duckdb upsert committed");
        }
        outcome
    }

    /// Read the row for one key, if present.
    pub fn find_quote(
        &self,
        symbol: &str,
        timestamp: PrimitiveDateTime,
    ) -> Result<Option<StoredQuote>, StoreError> {
        let connection = self.manager.acquire().map_err(StoreError::connection)?;
        if !table_exists(&connection)? {
            return Ok(None);
        }

        let timestamp = format_sql_timestamp(timestamp)?;
        let sql = format!(
            "{STORED_COLUMNS} WHERE symbol = ? AND \"timestamp\" = CAST(? AS TIMESTAMP)"
        );
        let params: [&dyn ToSql; 2] = [&symbol, &timestamp];
        let raw = connection
            .query_row(sql.as_str(), params.as_slice(), read_raw_row)
            .optional()
            .map_err(classify_duckdb)?;
        raw.map(RawStoredQuote::into_stored).transpose()
    }

    /// Read the newest stored observation for a symbol.
    pub fn latest_quote(&self, symbol: &str) -> Result<Option<StoredQuote>, StoreError> {
        let connection = self.manager.acquire().map_err(StoreError::connection)?;
        if !table_exists(&connection)? {
            return Ok(None);
        }

        let sql = format!("{STORED_COLUMNS} WHERE symbol = ? ORDER BY \"timestamp\" DESC LIMIT 1");
        let params: [&dyn ToSql; 1] = [&symbol];
        let raw = connection
            .query_row(sql.as_str(), params.as_slice(), read_raw_row)
            .optional()
            .map_err(classify_duckdb)?;
        raw.map(RawStoredQuote::into_stored).transpose()
    }

    /// Number of rows stored for one key.
    pub fn count_rows(&self, symbol: &str, timestamp: PrimitiveDateTime) -> Result<i64, StoreError> {
        let connection = self.manager.acquire().map_err(StoreError::connection)?;
        if !table_exists(&connection)? {
            return Ok(0);
        }

        let timestamp = format_sql_timestamp(timestamp)?;
        let params: [&dyn ToSql; 2] = [&symbol, &timestamp];
        connection
            .query_row(
                "SELECT COUNT(*) FROM stock_data WHERE symbol = ? AND \"timestamp\" = CAST(? AS TIMESTAMP)",
                params.as_slice(),
                |row| row.get(0),
            )
            .map_err(classify_duckdb)
    }
}

impl QuoteStore for DuckDbStore {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn upsert_quote<'a>(
        &'a self,
        record: &'a QuoteRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        let store = self.clone();
        let record = record.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || store.upsert_blocking(&record))
                .await
                .map_err(|error| StoreError::Write(format!("upsert task failed: {error}")))?
        })
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
///
/// A failed `COMMIT` is rolled back too, so the pooled connection never goes
/// back idle with a transaction still open.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    let result = result.and_then(|value| {
        connection
            .execute_batch("COMMIT")
            .map_err(classify_duckdb)
            .map(|()| value)
    });
    if result.is_err() {
        if let Err(rollback) = connection.execute_batch("ROLLBACK") {
            warn!(error = %rollback, "duckdb rollback failed");
        }
    }
    result
}

fn table_exists(connection: &Connection) -> Result<bool, StoreError> {
    let params: [&dyn ToSql; 1] = [&TABLE_NAME];
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            params.as_slice(),
            |row| row.get(0),
        )
        .map_err(classify_duckdb)?;
    Ok(count > 0)
}

/// Row as `DuckDB` hands it over, before decimal and timestamp parsing.
struct RawStoredQuote {
    id: i64,
    symbol: String,
    timestamp: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: i64,
    fetched_at: String,
}

impl RawStoredQuote {
    fn into_stored(self) -> Result<StoredQuote, StoreError> {
        Ok(StoredQuote {
            id: self.id,
            symbol: self.symbol,
            timestamp: parse_sql_timestamp(&self.timestamp)?,
            open: parse_sql_decimal("open", &self.open)?,
            high: parse_sql_decimal("high", &self.high)?,
            low: parse_sql_decimal("low", &self.low)?,
            close: parse_sql_decimal("close", &self.close)?,
            volume: self.volume,
            fetched_at: parse_sql_timestamp(&self.fetched_at)?,
        })
    }
}

fn read_raw_row(row: &::duckdb::Row<'_>) -> Result<RawStoredQuote, ::duckdb::Error> {
    Ok(RawStoredQuote {
        id: row.get(0)?,
        symbol: row.get(1)?,
        timestamp: row.get(2)?,
        open: row.get(3)?,
        high: row.get(4)?,
        low: row.get(5)?,
        close: row.get(6)?,
        volume: row.get(7)?,
        fetched_at: row.get(8)?,
    })
}
