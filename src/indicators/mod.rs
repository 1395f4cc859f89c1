// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators served by the
// chart API.  Every public function returns `Result<_, IndicatorError>` so
// callers are forced to handle insufficient-data and bad-parameter cases;
// there is no silent recovery and no partial output on contract violation.
//
// Alignment convention: every returned series is RIGHT-aligned to its input —
// the last output element corresponds to the last input element, and any
// length deficit is absorbed at the start.  Null-padding for display happens
// in the formatter, never here.

pub mod ema;
pub mod macd;
pub mod pipeline;
pub mod rsi;
pub mod stoch_rsi;

use thiserror::Error;

/// Contract violations reported by the indicator engines.
///
/// All of these indicate caller error (bad series or bad parameters), never a
/// transient condition — the engines perform no I/O and nothing is retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("input series is empty")]
    EmptySeries,

    #[error("period must be a positive integer")]
    NonPositivePeriod,

    #[error("insufficient data: need at least {required} values, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("non-finite price at index {index}")]
    NonFinite { index: usize },
}
