// =============================================================================
// Shared types used across the chart service
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single OHLCV candle parsed from a Binance kline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in milliseconds since the UNIX epoch.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Close time in milliseconds since the UNIX epoch.
    pub close_time: i64,
}

/// One Chart.js dataset: a labelled line with per-point values where `None`
/// marks "indicator undefined at this time step" (serialised as JSON null).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<Option<f64>>,
    #[serde(rename = "borderColor")]
    pub border_color: String,
    pub fill: bool,
}

/// The full chart payload: date labels plus one dataset per series, all of
/// the same length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPayload {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}
