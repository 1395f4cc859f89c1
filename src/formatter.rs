// =============================================================================
// Alignment / Formatter — null-padded, Chart.js-ready datasets
// =============================================================================
//
// Indicator series come out of the engines raw and right-aligned, shorter
// than the price series that produced them.  For display every dataset must
// share the chart's timestamp axis, so the missing head of each series is
// filled with nulls.  A null means "indicator undefined at this time step";
// it is never interchangeable with zero.
//
// Two padding modes, matching how each indicator's start offset is known:
//   - EMA overlays: the offset is structural — an EMA-25 always starts at
//     index 24, so exactly `period - 1` nulls are prepended regardless of the
//     measured output length.
//   - Everything else (StochRSI, MACD family): the offset is derived from the
//     measured output length against the full chart length.
// =============================================================================

use crate::config::AppConfig;
use crate::indicators::pipeline::IndicatorBundle;
use crate::types::{ChartPayload, Dataset};

/// Left-pad `series` with nulls up to `full_length` entries.
///
/// With `Some(offset)` exactly `offset` nulls are prepended (the structural
/// mode).  With `None` the padding is `full_length - series.len()`, and a
/// series longer than `full_length` is truncated to its first `full_length`
/// elements; the output is then always exactly `full_length` long.
pub fn align_series(
    series: &[f64],
    full_length: usize,
    explicit_left_offset: Option<usize>,
) -> Vec<Option<f64>> {
    if let Some(offset) = explicit_left_offset {
        let mut out: Vec<Option<f64>> = Vec::with_capacity(offset + series.len());
        out.resize(offset, None);
        out.extend(series.iter().map(|&v| Some(v)));
        return out;
    }

    if series.len() >= full_length {
        return series[..full_length].iter().map(|&v| Some(v)).collect();
    }

    let padding = full_length - series.len();
    let mut out: Vec<Option<f64>> = Vec::with_capacity(full_length);
    out.resize(padding, None);
    out.extend(series.iter().map(|&v| Some(v)));
    out
}

/// Assemble the Chart.js payload from labels and a computed bundle.
///
/// Datasets are emitted in a fixed order: Close, EMA-fast, EMA-slow,
/// StochRSI, MACD, Signal, Histogram.  The EMA datasets pad with their
/// structural `period - 1` offset; all others pad dynamically.
pub fn build_chart_payload(
    labels: Vec<String>,
    bundle: &IndicatorBundle,
    cfg: &AppConfig,
) -> ChartPayload {
    let n = bundle.close.len();
    let colors = &cfg.chart.colors;
    let ema = &cfg.indicators.ema;

    let datasets = vec![
        Dataset {
            label: "Close".to_string(),
            data: bundle.close.iter().map(|&v| Some(v)).collect(),
            border_color: colors.close.clone(),
            fill: false,
        },
        Dataset {
            label: format!("EMA {}", ema.fast_period),
            data: align_series(&bundle.ema_fast, n, Some(ema.fast_period - 1)),
            border_color: colors.ema_fast.clone(),
            fill: false,
        },
        Dataset {
            label: format!("EMA {}", ema.slow_period),
            data: align_series(&bundle.ema_slow, n, Some(ema.slow_period - 1)),
            border_color: colors.ema_slow.clone(),
            fill: false,
        },
        Dataset {
            label: "StochRSI".to_string(),
            data: align_series(&bundle.stoch_rsi, n, None),
            border_color: colors.stoch_rsi.clone(),
            fill: false,
        },
        Dataset {
            label: "MACD".to_string(),
            data: align_series(&bundle.macd, n, None),
            border_color: colors.macd.clone(),
            fill: false,
        },
        Dataset {
            label: "Signal Line".to_string(),
            data: align_series(&bundle.signal, n, None),
            border_color: colors.signal.clone(),
            fill: false,
        },
        Dataset {
            label: "Histogram".to_string(),
            data: align_series(&bundle.histogram, n, None),
            border_color: colors.histogram.clone(),
            fill: false,
        },
    ];

    ChartPayload { labels, datasets }
}
