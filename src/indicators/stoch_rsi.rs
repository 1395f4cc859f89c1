// =============================================================================
// Stochastic RSI — stochastic oscillator applied to RSI values
// =============================================================================
//
// For each sliding window of `k_period` consecutive RSI values the current
// RSI is normalised against the window's min/max range and scaled to
// [0, 100].  A flat window (hi == lo) yields 0 — a deliberate value for the
// degenerate case, never an error.
//
// `d_period` is accepted for interface completeness (a %D smoothing pass is
// conventional) but is not applied: only the %K-equivalent series is
// returned.  Changing that would change the numeric contract of the chart
// feed, so it stays as-is.
// =============================================================================

use super::rsi::calculate_rsi;
use super::IndicatorError;

/// Compute the Stochastic RSI series over `closes`.
///
/// Output length = RSI length − `k_period` + 1, right-aligned.
///
/// # Errors
/// - Anything [`calculate_rsi`] rejects.
/// - [`IndicatorError::NonPositivePeriod`] when `k_period == 0`.
/// - [`IndicatorError::InsufficientData`] when fewer than `k_period` RSI
///   values are available.
pub fn calculate_stoch_rsi(
    closes: &[f64],
    rsi_period: usize,
    k_period: usize,
    _d_period: usize,
) -> Result<Vec<f64>, IndicatorError> {
    if k_period == 0 {
        return Err(IndicatorError::NonPositivePeriod);
    }

    let rsi_values = calculate_rsi(closes, rsi_period)?;

    if rsi_values.len() < k_period {
        return Err(IndicatorError::InsufficientData {
            required: k_period,
            actual: rsi_values.len(),
        });
    }

    let mut stoch = Vec::with_capacity(rsi_values.len() - k_period + 1);
    for (i, window) in rsi_values.windows(k_period).enumerate() {
        let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        if hi == lo {
            stoch.push(0.0);
        } else {
            let current = rsi_values[i + k_period - 1];
            stoch.push((current - lo) / (hi - lo) * 100.0);
        }
    }

    Ok(stoch)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorError;

    #[test]
    fn stoch_rsi_k_period_zero() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert_eq!(
            calculate_stoch_rsi(&closes, 14, 0, 3),
            Err(IndicatorError::NonPositivePeriod)
        );
    }

    #[test]
    fn stoch_rsi_propagates_rsi_error() {
        // 10 closes cannot seed a 14-period RSI.
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        assert!(matches!(
            calculate_stoch_rsi(&closes, 14, 3, 3),
            Err(IndicatorError::InsufficientData { .. })
        ));
    }

    #[test]
    fn stoch_rsi_too_few_rsi_values() {
        // 16 closes => 2 RSI values with period 14, below k_period 3.
        let closes: Vec<f64> = (1..=16).map(|x| (x * x) as f64).collect();
        assert_eq!(
            calculate_stoch_rsi(&closes, 14, 3, 3),
            Err(IndicatorError::InsufficientData {
                required: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn stoch_rsi_output_length() {
        let closes: Vec<f64> = (1..=50).map(|x| ((x * 7) % 13) as f64 + 100.0).collect();
        let stoch = calculate_stoch_rsi(&closes, 14, 3, 3).unwrap();
        // RSI length 50 - 14 = 36; StochRSI length 36 - 3 + 1 = 34.
        assert_eq!(stoch.len(), 34);
    }

    #[test]
    fn stoch_rsi_flat_rsi_window_yields_zero() {
        // Strictly ascending prices pin every RSI value at 100, so every
        // window is flat — output must be 0, never a division error.
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let stoch = calculate_stoch_rsi(&closes, 14, 3, 3).unwrap();
        assert!(!stoch.is_empty());
        for &v in &stoch {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn stoch_rsi_range_check() {
        let closes: Vec<f64> = (0..60)
            .map(|x| 100.0 + (x as f64 * 0.7).sin() * 10.0)
            .collect();
        let stoch = calculate_stoch_rsi(&closes, 14, 3, 3).unwrap();
        for &v in &stoch {
            assert!((0.0..=100.0).contains(&v), "StochRSI {v} out of range");
        }
    }

    #[test]
    fn stoch_rsi_extremes() {
        // The current RSI equals the window max => 100; equals the min => 0.
        // Build a price path whose RSI oscillates: rise then fall.
        let mut closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        closes.extend((1..=20).rev().map(|x| x as f64));
        let stoch = calculate_stoch_rsi(&closes, 14, 3, 3).unwrap();
        // After the turn the RSI is strictly falling, so the current value is
        // the window minimum.
        assert_eq!(*stoch.last().unwrap(), 0.0);
    }
}
