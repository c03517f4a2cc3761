use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ticksink_warehouse::QuoteRecord;
use time::PrimitiveDateTime;

use crate::domain::timestamp::{provider_timestamp, wall_clock_timestamp};
use crate::{Symbol, ValidationError};

/// Exclusive bound on the magnitude of a `DECIMAL(10, 4)`: six integer digits.
const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// One OHLCV observation for a symbol at an exchange-reported time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    #[serde(with = "provider_timestamp")]
    pub timestamp: PrimitiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
    #[serde(with = "wall_clock_timestamp")]
    pub fetched_at: PrimitiveDateTime,
}

impl Quote {
    /// Build a quote from provider values.
    ///
    /// Only what the `stock_data` columns cannot hold is rejected: prices
    /// outside `DECIMAL(10, 4)` and volumes beyond `BIGINT`. A bar whose
    /// prices disagree with each other is kept as reported; see
    /// [`Quote::range_anomaly`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        timestamp: PrimitiveDateTime,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
        fetched_at: PrimitiveDateTime,
    ) -> Result<Self, ValidationError> {
        validate_price("open", open)?;
        validate_price("high", high)?;
        validate_price("low", low)?;
        validate_price("close", close)?;

        if i64::try_from(volume).is_err() {
            return Err(ValidationError::VolumeOutOfRange { value: volume });
        }

        Ok(Self {
            symbol,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            fetched_at,
        })
    }

    /// First OHLC relation this bar breaks, if any.
    pub fn range_anomaly(&self) -> Option<&'static str> {
        if self.high < self.low {
            return Some("high is below low");
        }
        if self.open < self.low || self.open > self.high {
            return Some("open is outside the high/low range");
        }
        if self.close < self.low || self.close > self.high {
            return Some("close is outside the high/low range");
        }
        if [self.open, self.high, self.low, self.close]
            .iter()
            .any(|price| price.is_sign_negative() && !price.is_zero())
        {
            return Some("negative price");
        }
        None
    }
}

impl From<&Quote> for QuoteRecord {
    fn from(quote: &Quote) -> Self {
        Self {
            symbol: quote.symbol.as_str().to_owned(),
            timestamp: quote.timestamp,
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            // Checked in `Quote::new`.
            volume: i64::try_from(quote.volume).unwrap_or(i64::MAX),
            fetched_at: quote.fetched_at,
        }
    }
}

fn validate_price(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.abs() >= MAX_PRICE {
        return Err(ValidationError::PriceOutOfRange { field });
    }
    Ok(())
}
