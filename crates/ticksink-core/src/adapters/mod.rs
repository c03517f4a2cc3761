//! Market-data provider adapters.

pub mod alphavantage;

pub use alphavantage::{parse_intraday_response, AlphaVantageFetcher};
