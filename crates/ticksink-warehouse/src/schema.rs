//! DDL and upsert statements for the `stock_data` table.
//!
//! Both dialects provision the same shape: a surrogate key, the quote columns,
//! and a uniqueness constraint on `(symbol, "timestamp")` that the upsert uses
//! as its conflict target. Every statement is create-if-absent so it can run on
//! each invocation.

use serde::Serialize;

/// Name of the destination table.
pub const TABLE_NAME: &str = "stock_data";

/// SQL dialect of a store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Postgres,
    DuckDb,
}

impl Dialect {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::DuckDb => "duckdb",
        }
    }

    /// Statements that provision the table, in execution order.
    pub const fn create_statements(self) -> &'static [&'static str] {
        match self {
            Self::Postgres => &[POSTGRES_CREATE_TABLE],
            Self::DuckDb => &[DUCKDB_CREATE_SEQUENCE, DUCKDB_CREATE_TABLE],
        }
    }

    pub const fn upsert_statement(self) -> &'static str {
        match self {
            Self::Postgres => POSTGRES_UPSERT,
            Self::DuckDb => DUCKDB_UPSERT,
        }
    }

    /// Full provisioning script, one statement per line group.
    pub fn schema_sql(self) -> String {
        self.create_statements()
            .iter()
            .map(|statement| format!("{};", statement.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Key for `pg_advisory_xact_lock`, serializing concurrent first-time provisioning.
pub(crate) const POSTGRES_PROVISION_LOCK_KEY: i64 = 0x7469_636b_7369_6e6b;

pub(crate) const POSTGRES_CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stock_data (
    id SERIAL PRIMARY KEY,
    symbol VARCHAR(10) NOT NULL,
    "timestamp" TIMESTAMP NOT NULL,
    open DECIMAL(10, 4) NOT NULL,
    high DECIMAL(10, 4) NOT NULL,
    low DECIMAL(10, 4) NOT NULL,
    close DECIMAL(10, 4) NOT NULL,
    volume BIGINT NOT NULL,
    fetched_at TIMESTAMP NOT NULL,
    UNIQUE (symbol, "timestamp")
)
"#;

pub(crate) const POSTGRES_UPSERT: &str = r#"
INSERT INTO stock_data (symbol, "timestamp", open, high, low, close, volume, fetched_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (symbol, "timestamp") DO UPDATE SET
    open = EXCLUDED.open,
    high = EXCLUDED.high,
    low = EXCLUDED.low,
    close = EXCLUDED.close,
    volume = EXCLUDED.volume,
    fetched_at = EXCLUDED.fetched_at
"#;

pub(crate) const DUCKDB_CREATE_SEQUENCE: &str = r#"
CREATE SEQUENCE IF NOT EXISTS stock_data_id_seq START 1
"#;

pub(crate) const DUCKDB_CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stock_data (
    id BIGINT PRIMARY KEY DEFAULT nextval('stock_data_id_seq'),
    symbol VARCHAR(10) NOT NULL,
    "timestamp" TIMESTAMP NOT NULL,
    open DECIMAL(10, 4) NOT NULL,
    high DECIMAL(10, 4) NOT NULL,
    low DECIMAL(10, 4) NOT NULL,
    close DECIMAL(10, 4) NOT NULL,
    volume BIGINT NOT NULL,
    fetched_at TIMESTAMP NOT NULL,
    UNIQUE (symbol, "timestamp")
)
"#;

// Decimals and timestamps are bound as text and cast server-side.
pub(crate) const DUCKDB_UPSERT: &str = r#"
INSERT INTO stock_data (symbol, "timestamp", open, high, low, close, volume, fetched_at)
VALUES (
    ?,
    CAST(? AS TIMESTAMP),
    CAST(? AS DECIMAL(10, 4)),
    CAST(? AS DECIMAL(10, 4)),
    CAST(? AS DECIMAL(10, 4)),
    CAST(? AS DECIMAL(10, 4)),
    ?,
    CAST(? AS TIMESTAMP)
)
ON CONFLICT (symbol, "timestamp") DO UPDATE SET
    open = EXCLUDED.open,
    high = EXCLUDED.high,
    low = EXCLUDED.low,
    close = EXCLUDED.close,
    volume = EXCLUDED.volume,
    fetched_at = EXCLUDED.fetched_at
"#;
