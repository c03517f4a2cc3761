//! # Ticksink Warehouse
//!
//! Idempotent storage for intraday quotes.
//!
//! Every write provisions the `stock_data` table if it is absent and then
//! upserts one row keyed on `(symbol, "timestamp")`, both inside a single
//! transaction. Two backends implement [`QuoteStore`]:
//!
//! - [`PostgresStore`]: the production store, one connection per write.
//! - [`DuckDbStore`]: an embedded store for local runs and tests.
//!
//! ```rust,no_run
//! use ticksink_warehouse::{DuckDbStore, QuoteStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DuckDbStore::open("quotes.duckdb")?;
//!     println!("writing through {}", store.dialect().as_str());
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod duckdb;
mod embedded;
mod error;
mod models;
mod postgres;
pub mod schema;

pub use embedded::DuckDbStore;
pub use error::StoreError;
pub use models::{QuoteRecord, StoredQuote};
pub use postgres::{PostgresConfig, PostgresStore, DEFAULT_POSTGRES_HOST, DEFAULT_POSTGRES_PORT};
pub use schema::{Dialect, TABLE_NAME};

/// Destination for normalized quotes.
///
/// `upsert_quote` must be idempotent: writing the same record twice leaves one
/// row whose non-key columns hold the last written values.
pub trait QuoteStore: Send + Sync {
    fn dialect(&self) -> Dialect;

    fn upsert_quote<'a>(
        &'a self,
        record: &'a QuoteRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;
}
