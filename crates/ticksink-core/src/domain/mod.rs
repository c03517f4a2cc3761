//! # Domain Models
//!
//! Validated value types for one ingestion run.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Ticker, at most 10 characters |
//! | [`Quote`] | OHLCV observation with fixed-point prices |
//!
//! Both validate their invariants at construction time, so a [`Quote`] that
//! exists always fits the `stock_data` columns.

mod quote;
mod symbol;
pub mod timestamp;

pub use quote::Quote;
pub use symbol::{Symbol, MAX_SYMBOL_LEN};
