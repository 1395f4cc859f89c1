// =============================================================================
// Market Data Client — Binance public kline endpoint
// =============================================================================
//
// Only public market data is consumed, so no request signing is needed.  The
// klines response is Binance's array-of-arrays format:
//
//   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume,
//   [6] closeTime, ... (further fields unused)
//
// Numeric fields arrive as JSON strings; the parser accepts both string and
// number encodings.  Malformed entries are skipped with a warning rather than
// failing the whole fetch.
// =============================================================================

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::types::Candle;

/// HTTP client for the upstream market-data API.
#[derive(Clone)]
pub struct MarketDataClient {
    base_url: String,
    client: reqwest::Client,
}

impl MarketDataClient {
    /// Create a new client from the API configuration.
    pub fn new(cfg: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .expect("failed to build reqwest client");

        debug!(base_url = %cfg.binance_base_url, "MarketDataClient initialised");

        Self {
            base_url: cfg.binance_base_url.clone(),
            client,
        }
    }

    /// GET /klines — fetch up to `limit` candles for `symbol` at `interval`.
    #[instrument(skip(self), name = "market_data::get_klines")]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /klines request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse klines response")?;

        if !status.is_success() {
            anyhow::bail!("GET /klines returned {}: {}", status, body);
        }

        let raw = body.as_array().context("klines response is not an array")?;

        let candles = parse_klines(raw);
        debug!(symbol, interval, count = candles.len(), "klines fetched");
        Ok(candles)
    }
}

/// Parse an array of raw kline entries, skipping malformed ones.
pub fn parse_klines(raw: &[Value]) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(raw.len());

    for entry in raw {
        let Some(arr) = entry.as_array() else {
            warn!("skipping non-array kline entry");
            continue;
        };
        if arr.len() < 7 {
            warn!("skipping malformed kline entry with {} elements", arr.len());
            continue;
        }

        let fields = (
            arr[0].as_i64(),
            value_as_f64(&arr[1]),
            value_as_f64(&arr[2]),
            value_as_f64(&arr[3]),
            value_as_f64(&arr[4]),
            value_as_f64(&arr[5]),
            arr[6].as_i64(),
        );

        match fields {
            (
                Some(open_time),
                Some(open),
                Some(high),
                Some(low),
                Some(close),
                Some(volume),
                Some(close_time),
            ) => candles.push(Candle {
                open_time,
                open,
                high,
                low,
                close,
                volume,
                close_time,
            }),
            _ => warn!("skipping kline entry with unparsable fields"),
        }
    }

    candles
}

/// Binance encodes prices as JSON strings; tolerate plain numbers too.
fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Extract the close price of every candle, in order.
pub fn close_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Extract a UTC `YYYY-MM-DD` label from every candle's open time.
pub fn day_labels(candles: &[Candle]) -> Vec<String> {
    candles
        .iter()
        .map(|c| {
            Utc.timestamp_millis_opt(c.open_time)
                .single()
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .collect()
}
