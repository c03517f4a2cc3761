use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::error::StoreError;

/// Text layout used when timestamps cross the `DuckDB` parameter boundary.
const SQL_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

/// Layout `DuckDB` produces when a `TIMESTAMP` is cast to `VARCHAR`.
const SQL_TIMESTAMP_READ_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);

/// One row of `stock_data` as written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRecord {
    /// Ticker, at most 10 characters.
    pub symbol: String,
    /// Provider-reported observation time.
    pub timestamp: PrimitiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    /// Wall-clock time the pipeline retrieved the observation.
    pub fetched_at: PrimitiveDateTime,
}

/// A `stock_data` row read back from a store, including its surrogate key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQuote {
    pub id: i64,
    pub symbol: String,
    #[serde(with = "sql_timestamp")]
    pub timestamp: PrimitiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    #[serde(with = "sql_timestamp")]
    pub fetched_at: PrimitiveDateTime,
}

time::serde::format_description!(
    sql_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
);

pub(crate) fn format_sql_timestamp(value: PrimitiveDateTime) -> Result<String, StoreError> {
    value.format(SQL_TIMESTAMP_FORMAT).map_err(StoreError::write)
}

pub(crate) fn parse_sql_timestamp(value: &str) -> Result<PrimitiveDateTime, StoreError> {
    PrimitiveDateTime::parse(value, SQL_TIMESTAMP_READ_FORMAT)
        .map_err(|error| StoreError::Write(format!("unreadable timestamp '{value}': {error}")))
}

pub(crate) fn parse_sql_decimal(column: &str, value: &str) -> Result<Decimal, StoreError> {
    value
        .parse::<Decimal>()
        .map_err(|error| StoreError::Write(format!("unreadable {column} '{value}': {error}")))
}
