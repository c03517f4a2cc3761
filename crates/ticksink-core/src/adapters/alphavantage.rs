use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use time::PrimitiveDateTime;
use tracing::{debug, warn};

use crate::config::FetcherConfig;
use crate::data_source::{FetchError, FetchOutcome};
use crate::domain::timestamp::{
    is_sortable_timestamp_key, latest_timestamp_key, now_utc_wall_clock, parse_observation_time,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{Quote, Symbol};

/// Bar granularity requested from the provider.
pub const INTRADAY_INTERVAL: &str = "60min";

/// Response field holding the series for [`INTRADAY_INTERVAL`].
pub const SERIES_KEY: &str = "Time Series (60min)";

/// Fields the provider uses to explain an absent series.
const ADVISORY_KEYS: [&str; 3] = ["Note", "Information", "Error Message"];

/// Fetches the newest hourly bar for a symbol from Alpha Vantage.
#[derive(Clone)]
pub struct AlphaVantageFetcher {
    http_client: Arc<dyn HttpClient>,
    config: FetcherConfig,
    clock: fn() -> PrimitiveDateTime,
}

impl AlphaVantageFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>, config: FetcherConfig) -> Self {
        Self {
            http_client,
            config,
            clock: now_utc_wall_clock,
        }
    }

    /// Replace the clock used to stamp `fetched_at`.
    pub fn with_clock(mut self, clock: fn() -> PrimitiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn build_request(&self, symbol: &Symbol) -> HttpRequest {
        HttpRequest::get(format!("{}/query", self.config.base_url))
            .with_query("function", "TIME_SERIES_INTRADAY")
            .with_query("symbol", symbol.as_str())
            .with_query("interval", INTRADAY_INTERVAL)
            .with_query("apikey", self.config.api_key.expose())
            .with_timeout_ms(self.config.timeout_ms)
    }

    /// Issue one request and extract the latest observation.
    pub async fn fetch_latest_quote(&self, symbol: &Symbol) -> Result<FetchOutcome, FetchError> {
        let request = self.build_request(symbol);
        debug!(url = %request.redacted_url(), "requesting intraday series");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| FetchError::transport(format!("alphavantage: {}", e.message())))?;

        if !response.is_success() {
            return Err(FetchError::Transport {
                message: format!("alphavantage returned status {}", response.status),
                status: Some(response.status),
            });
        }

        parse_intraday_response_with_clock(symbol, &response.body, self.clock)
    }
}

/// Parse an intraday-series body, stamping `fetched_at` with the current time.
pub fn parse_intraday_response(symbol: &Symbol, body: &str) -> Result<FetchOutcome, FetchError> {
    parse_intraday_response_with_clock(symbol, body, now_utc_wall_clock)
}

/// Parse an intraday-series body; `clock` is read once the bar has parsed.
pub fn parse_intraday_response_with_clock<C>(
    symbol: &Symbol,
    body: &str,
    clock: C,
) -> Result<FetchOutcome, FetchError>
where
    C: FnOnce() -> PrimitiveDateTime,
{
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::parse(format!("body is not JSON: {e}")))?;
    let Value::Object(mut root) = value else {
        return Err(FetchError::parse("body is not a JSON object"));
    };

    let series = match root.remove(SERIES_KEY) {
        None | Some(Value::Null) => {
            log_advisories(symbol, &root);
            return Ok(FetchOutcome::NoData);
        }
        Some(Value::Object(series)) => series,
        Some(_) => return Err(FetchError::parse(format!("'{SERIES_KEY}' is not an object"))),
    };

    if let Some(key) = series.keys().find(|key| !is_sortable_timestamp_key(key)) {
        return Err(FetchError::parse(format!(
            "series key '{key}' is not a YYYY-MM-DD HH:MM:SS timestamp"
        )));
    }

    let Some(latest) = latest_timestamp_key(series.keys().map(String::as_str)) else {
        return Ok(FetchOutcome::NoData);
    };

    let timestamp = parse_observation_time(latest)
        .map_err(|e| FetchError::parse(format!("series key '{latest}': {e}")))?;
    let bar = series
        .get(latest)
        .cloned()
        .ok_or_else(|| FetchError::parse(format!("series entry '{latest}' disappeared")))?;
    let bar: IntradayBar = serde_json::from_value(bar)
        .map_err(|e| FetchError::parse(format!("series entry '{latest}': {e}")))?;

    let quote = Quote::new(
        symbol.clone(),
        timestamp,
        parse_price("1. open", &bar.open)?,
        parse_price("2. high", &bar.high)?,
        parse_price("3. low", &bar.low)?,
        parse_price("4. close", &bar.close)?,
        parse_volume(&bar.volume)?,
        clock(),
    )
    .map_err(|e| FetchError::parse(format!("series entry '{latest}': {e}")))?;

    if let Some(anomaly) = quote.range_anomaly() {
        warn!(symbol = %symbol, timestamp = latest, anomaly, "storing bar as reported");
    }

    Ok(FetchOutcome::Quote(quote))
}

fn log_advisories(symbol: &Symbol, root: &Map<String, Value>) {
    for key in ADVISORY_KEYS {
        if let Some(advisory) = root.get(key) {
            let text = advisory.as_str().map_or_else(|| advisory.to_string(), str::to_owned);
            warn!(symbol = %symbol, key, advisory = %text, "provider returned no series");
        }
    }
}

fn parse_price(field: &str, raw: &str) -> Result<Decimal, FetchError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| FetchError::parse(format!("field '{field}' value '{raw}': {e}")))
}

fn parse_volume(raw: &str) -> Result<u64, FetchError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| FetchError::parse(format!("field '5. volume' value '{raw}': {e}")))
}

#[derive(Debug, Clone, Deserialize)]
struct IntradayBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}
