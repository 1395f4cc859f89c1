// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period`
// closes, so the output is right-aligned to the input suffix starting at
// index `period - 1`.
// =============================================================================

use super::IndicatorError;

/// Compute the EMA series for the given `closes` slice and look-back `period`.
///
/// The returned vector has `closes.len() - period + 1` elements; element 0 is
/// the SMA seed and corresponds to the close at index `period - 1`.
///
/// # Errors
/// - [`IndicatorError::EmptySeries`] when `closes` is empty.
/// - [`IndicatorError::NonPositivePeriod`] when `period == 0`.
/// - [`IndicatorError::InsufficientData`] when `closes.len() < period`.
pub fn calculate_ema(closes: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    if closes.is_empty() {
        return Err(IndicatorError::EmptySeries);
    }
    if period == 0 {
        return Err(IndicatorError::NonPositivePeriod);
    }
    if closes.len() < period {
        return Err(IndicatorError::InsufficientData {
            required: period,
            actual: closes.len(),
        });
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Seed: SMA of the first `period` values.
    let sma: f64 = closes[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(closes.len() - period + 1);
    result.push(sma);

    let mut prev_ema = sma;
    for &close in &closes[period..] {
        let ema = close * multiplier + prev_ema * (1.0 - multiplier);
        result.push(ema);
        prev_ema = ema;
    }

    Ok(result)
}
