// =============================================================================
// Indicator Pipeline — one price series in, a full named-series bundle out
// =============================================================================
//
// Runs every configured engine against the same close series and collects the
// raw, right-aligned outputs.  No engine is optional: any failure fails the
// whole pipeline (no partial bundles).  The one sanctioned partial state is
// MACD's empty signal/histogram, which the MACD engine itself reports as a
// valid non-error result.
//
// The pipeline is a pure function of (closes, config): same input, same
// bundle, every time.
// =============================================================================

use super::ema::calculate_ema;
use super::macd::calculate_macd;
use super::stoch_rsi::calculate_stoch_rsi;
use super::IndicatorError;
use crate::config::IndicatorsConfig;

/// All computed series for one price sequence, keyed by fixed fields rather
/// than a map so the set of outputs is part of the type.
///
/// Every series except `close` is right-aligned to `close`; padding to the
/// full chart length happens in the formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorBundle {
    pub close: Vec<f64>,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub stoch_rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Run all indicator engines against `closes` with the given periods.
///
/// # Errors
/// - [`IndicatorError::EmptySeries`] when `closes` is empty.
/// - [`IndicatorError::NonFinite`] when any close is NaN or infinite.
/// - Any engine error (bad periods, insufficient data) propagates unchanged.
pub fn calculate_bundle(
    closes: &[f64],
    cfg: &IndicatorsConfig,
) -> Result<IndicatorBundle, IndicatorError> {
    if closes.is_empty() {
        return Err(IndicatorError::EmptySeries);
    }
    if let Some(index) = closes.iter().position(|v| !v.is_finite()) {
        return Err(IndicatorError::NonFinite { index });
    }

    let ema_fast = calculate_ema(closes, cfg.ema.fast_period)?;
    let ema_slow = calculate_ema(closes, cfg.ema.slow_period)?;

    let stoch_rsi = calculate_stoch_rsi(
        closes,
        cfg.stoch_rsi.rsi_period,
        cfg.stoch_rsi.k_period,
        cfg.stoch_rsi.d_period,
    )?;

    let macd = calculate_macd(
        closes,
        cfg.macd.fast_period,
        cfg.macd.slow_period,
        cfg.macd.signal_period,
    )?;

    Ok(IndicatorBundle {
        close: closes.to_vec(),
        ema_fast,
        ema_slow,
        stoch_rsi,
        macd: macd.macd,
        signal: macd.signal,
        histogram: macd.histogram,
    })
}
