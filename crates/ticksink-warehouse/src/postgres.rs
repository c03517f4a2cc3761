//! PostgreSQL quote store.
//!
//! Each upsert opens its own connection, runs provisioning and the upsert in
//! one transaction, and closes the connection before returning, whatever the
//! outcome.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Connection, Row};
use time::PrimitiveDateTime;
use tracing::{debug, warn};

use crate::error::{classify_sqlx, StoreError};
use crate::schema::{Dialect, POSTGRES_PROVISION_LOCK_KEY};
use crate::{QuoteRecord, QuoteStore, StoredQuote};

/// Host of the database service in the reference deployment.
pub const DEFAULT_POSTGRES_HOST: &str = "postgres";
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const UNDEFINED_TABLE: &str = "42P01";

const STORED_COLUMNS: &str = r#"
SELECT id::BIGINT AS id, symbol, "timestamp", open, high, low, close, volume, fetched_at
FROM stock_data
"#;

/// Connection settings for [`PostgresStore`].
#[derive(Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
}

impl PostgresConfig {
    /// Credentials for the default host and port.
    pub fn new(
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: String::from(DEFAULT_POSTGRES_HOST),
            port: DEFAULT_POSTGRES_PORT,
            database: database.into(),
            user: user.into(),
            password: password.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

impl Debug for PostgresConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Production store writing to PostgreSQL.
#[derive(Clone)]
pub struct PostgresStore {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PostgresStore {
    pub fn new(config: &PostgresConfig) -> Self {
        Self {
            options: config.connect_options(),
            connect_timeout: config.connect_timeout,
        }
    }

    /// Build a store from a `postgres://` URL.
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let options = url.parse::<PgConnectOptions>().map_err(StoreError::connection)?;
        Ok(Self {
            options,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    async fn connect(&self) -> Result<PgConnection, StoreError> {
        match tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&self.options))
            .await
        {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(error)) => Err(StoreError::connection(error)),
            Err(_) => Err(StoreError::Connection(format!(
                "connect timed out after {}ms",
                self.connect_timeout.as_millis()
            ))),
        }
    }

    async fn release(connection: PgConnection) {
        if let Err(error) = connection.close().await {
            debug!(error = %error, "postgres connection did not close cleanly");
        }
    }

    /// Provision the table and upsert one record inside a single transaction.
    pub async fn upsert(&self, record: &QuoteRecord) -> Result<(), StoreError> {
        let mut connection = self.connect().await?;
        let result = upsert_in_transaction(&mut connection, record).await;
        Self::release(connection).await;

        if result.is_ok() {
            debug!(symbol = %record.symbol, timestamp = %record.timestamp, "postgres upsert committed");
        }
        result
    }

    /// Read the row for one key, if present.
    pub async fn find_quote(
        &self,
        symbol: &str,
        timestamp: PrimitiveDateTime,
    ) -> Result<Option<StoredQuote>, StoreError> {
        let mut connection = self.connect().await?;
        let sql = format!("{STORED_COLUMNS} WHERE symbol = $1 AND \"timestamp\" = $2");
        let result = sqlx::query(&sql)
            .bind(symbol)
            .bind(timestamp)
            .fetch_optional(&mut connection)
            .await;
        Self::release(connection).await;

        match tolerate_missing_table(result)? {
            Some(Some(row)) => stored_from_row(&row).map(Some),
            _ => Ok(None),
        }
    }

    /// Read the newest stored observation for a symbol.
    pub async fn latest_quote(&self, symbol: &str) -> Result<Option<StoredQuote>, StoreError> {
        let mut connection = self.connect().await?;
        let sql = format!("{STORED_COLUMNS} WHERE symbol = $1 ORDER BY \"timestamp\" DESC LIMIT 1");
        let result = sqlx::query(&sql)
            .bind(symbol)
            .fetch_optional(&mut connection)
            .await;
        Self::release(connection).await;

        match tolerate_missing_table(result)? {
            Some(Some(row)) => stored_from_row(&row).map(Some),
            _ => Ok(None),
        }
    }

    /// Number of rows stored for one key.
    pub async fn count_rows(
        &self,
        symbol: &str,
        timestamp: PrimitiveDateTime,
    ) -> Result<i64, StoreError> {
        let mut connection = self.connect().await?;
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_data WHERE symbol = $1 AND \"timestamp\" = $2",
        )
        .bind(symbol)
        .bind(timestamp)
        .fetch_one(&mut connection)
        .await;
        Self::release(connection).await;

        Ok(tolerate_missing_table(result)?.unwrap_or(0))
    }
}

impl QuoteStore for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn upsert_quote<'a>(
        &'a self,
        record: &'a QuoteRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(self.upsert(record))
    }
}

async fn upsert_in_transaction(
    connection: &mut PgConnection,
    record: &QuoteRecord,
) -> Result<(), StoreError> {
    let mut transaction = connection.begin().await.map_err(classify_sqlx)?;

    match apply_upsert(&mut transaction, record).await {
        Ok(()) => transaction.commit().await.map_err(classify_sqlx),
        Err(error) => {
            if let Err(rollback) = transaction.rollback().await {
                warn!(error = %rollback, "postgres rollback failed");
            }
            Err(error)
        }
    }
}

async fn apply_upsert(connection: &mut PgConnection, record: &QuoteRecord) -> Result<(), StoreError> {
    // Concurrent first runs would otherwise race on the catalog entry for the table.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(POSTGRES_PROVISION_LOCK_KEY)
        .execute(&mut *connection)
        .await
        .map_err(classify_sqlx)?;

    for statement in Dialect::Postgres.create_statements() {
        sqlx::query(statement)
            .execute(&mut *connection)
            .await
            .map_err(classify_sqlx)?;
    }

    sqlx::query(Dialect::Postgres.upsert_statement())
        .bind(&record.symbol)
        .bind(record.timestamp)
        .bind(record.open)
        .bind(record.high)
        .bind(record.low)
        .bind(record.close)
        .bind(record.volume)
        .bind(record.fetched_at)
        .execute(&mut *connection)
        .await
        .map_err(classify_sqlx)?;

    Ok(())
}

/// Treat "relation does not exist" as an empty result for read paths.
fn tolerate_missing_table<T>(result: Result<T, sqlx::Error>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNDEFINED_TABLE) => Ok(None),
        Err(error) => Err(classify_sqlx(error)),
    }
}

fn stored_from_row(row: &PgRow) -> Result<StoredQuote, StoreError> {
    let read = || -> Result<StoredQuote, sqlx::Error> {
        Ok(StoredQuote {
            id: row.try_get("id")?,
            symbol: row.try_get("symbol")?,
            timestamp: row.try_get("timestamp")?,
            open: row.try_get("open")?,
            high: row.try_get("high")?,
            low: row.try_get("low")?,
            close: row.try_get("close")?,
            volume: row.try_get("volume")?,
            fetched_at: row.try_get("fetched_at")?,
        })
    };
    read().map_err(classify_sqlx)
}
