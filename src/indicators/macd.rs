// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// MACD line  = EMA(fast) − EMA(slow), elementwise on the common suffix.
// Signal     = EMA(signal_period) of the MACD line itself (not of prices).
// Histogram  = MACD − Signal on their common suffix.
//
// The slow EMA is the shorter series, so the fast EMA drops its leading
// elements before the subtraction; both are right-aligned to the same input
// suffix.  A MACD line too short to seed the signal EMA produces an EMPTY
// signal and histogram — a valid, displayable partial result, not an error.
// =============================================================================

use super::ema::calculate_ema;
use super::IndicatorError;

/// The three MACD output series, each right-aligned to the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    /// Fast EMA − slow EMA, length = `closes.len() − slow + 1`.
    pub macd: Vec<f64>,
    /// EMA of the MACD line; empty when the MACD line is shorter than
    /// `signal_period`.
    pub signal: Vec<f64>,
    /// MACD − signal on their common suffix; same length as `signal`.
    pub histogram: Vec<f64>,
}

/// Compute the MACD line, signal line, and histogram.
///
/// # Errors
/// Propagates [`calculate_ema`] errors: zero periods, empty input, or
/// `closes.len() < slow` (the slow EMA cannot be seeded).
pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<MacdSeries, IndicatorError> {
    if signal_period == 0 {
        return Err(IndicatorError::NonPositivePeriod);
    }

    let fast_ema = calculate_ema(closes, fast)?;
    let slow_ema = calculate_ema(closes, slow)?;

    // The slow EMA starts later; drop the fast EMA's leading elements so
    // both series cover the same input suffix.
    let offset = fast_ema.len().saturating_sub(slow_ema.len());
    let macd: Vec<f64> = fast_ema[offset..]
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    // Softer contract than the EMA engine's own: a MACD line too short for
    // the signal EMA yields empty signal/histogram series.
    let signal = if macd.len() >= signal_period {
        calculate_ema(&macd, signal_period)?
    } else {
        Vec::new()
    };

    let offset = macd.len() - signal.len();
    let histogram: Vec<f64> = macd[offset..]
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| m - s)
        .collect();

    Ok(MacdSeries {
        macd,
        signal,
        histogram,
    })
}
