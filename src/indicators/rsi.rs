// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses.
// Step 3 — Apply Wilder's exponential smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// When the average loss is zero (no down moves in the window) the RSI is
// pinned to 100 exactly — the RS ratio would be a division by zero.
// =============================================================================

use super::IndicatorError;

/// Compute the full RSI series for the given `closes` and `period`.
///
/// The returned vector has one RSI value for each close starting at index
/// `period` (the first `period` closes are consumed to seed the averages),
/// i.e. `closes.len() - period` elements.
///
/// # Errors
/// - [`IndicatorError::NonPositivePeriod`] when `period == 0`.
/// - [`IndicatorError::InsufficientData`] when `closes.len() < period + 1`
///   (at least `period` deltas are needed to seed the averages).
pub fn calculate_rsi(closes: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::NonPositivePeriod);
    }
    if closes.len() < period + 1 {
        return Err(IndicatorError::InsufficientData {
            required: period + 1,
            actual: closes.len(),
        });
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // Seed averages with the SMA of the first `period` deltas.
    let (sum_gain, sum_loss) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    let mut result = Vec::with_capacity(deltas.len() - period + 1);
    result.push(rsi_from_averages(avg_gain, avg_loss));

    // Wilder's smoothing for subsequent values.
    for &delta in &deltas[period..] {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        result.push(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(result)
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// A zero average loss pins RSI at 100 (only gains in the window).
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorError;

    #[test]
    fn rsi_empty_input() {
        assert!(matches!(
            calculate_rsi(&[], 14),
            Err(IndicatorError::InsufficientData { .. })
        ));
    }

    #[test]
    fn rsi_period_zero() {
        assert_eq!(
            calculate_rsi(&[1.0, 2.0, 3.0], 0),
            Err(IndicatorError::NonPositivePeriod)
        );
    }

    #[test]
    fn rsi_insufficient_data() {
        // Need period+1 closes (period deltas). 14 closes => 13 deltas < 14.
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert_eq!(
            calculate_rsi(&closes, 14),
            Err(IndicatorError::InsufficientData {
                required: 15,
                actual: 14
            })
        );
    }

    #[test]
    fn rsi_output_length() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14).unwrap();
        assert_eq!(series.len(), 30 - 14);
    }

    #[test]
    fn rsi_all_gains_is_exactly_100() {
        // Strictly ascending prices => zero losses => RSI pinned at 100.
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14).unwrap();
        assert!(!series.is_empty());
        for &v in &series {
            assert_eq!(v, 100.0);
        }
    }

    #[test]
    fn rsi_all_losses() {
        // Strictly descending prices => zero gains => RSI = 0.
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14).unwrap();
        for &v in &series {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_market_is_100() {
        // No change at all: avg_loss == 0 triggers the zero-division rule.
        let closes = vec![100.0; 30];
        let series = calculate_rsi(&closes, 14).unwrap();
        for &v in &series {
            assert_eq!(v, 100.0);
        }
    }

    #[test]
    fn rsi_range_check() {
        // Arbitrary data — RSI must always be in [0, 100].
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let series = calculate_rsi(&closes, 14).unwrap();
        for &v in &series {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }

    #[test]
    fn rsi_wilder_smoothing_known_value() {
        // Hand-computed with period 2: closes [1, 2, 3, 2].
        // Seed deltas [+1, +1] => avg_gain 1.0, avg_loss 0.0 => RSI 100.
        // Next delta -1 => avg_gain (1*1+0)/2 = 0.5, avg_loss (0*1+1)/2 = 0.5
        // => RS 1.0 => RSI 50.
        let series = calculate_rsi(&[1.0, 2.0, 3.0, 2.0], 2).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], 100.0);
        assert!((series[1] - 50.0).abs() < 1e-10);
    }
}
