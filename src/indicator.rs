pub mod atr;
pub mod bollinger;
pub mod ma;
pub mod macd;
pub mod rsi;
pub mod snapshot;

use error_stack::Report;

use crate::error::IndicatorError;
use crate::model::Bar;

/// A technical analysis indicator that operates on a slice of bars.
///
/// Bars must be in ascending chronological order (oldest first).
pub trait Indicator: Send {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Minimum number of bars required to produce at least one output value.
    fn required_bars(&self) -> usize;

    /// Calculate indicator values from bars.
    ///
    /// The first value belongs to bar `required_bars() - 1` and every later
    /// bar gets exactly one value, so the output is `len - required_bars() + 1`
    /// long.
    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>>;
}

/// Extract close prices from a slice of bars.
pub fn close_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Exponentially weighted mean with `alpha`, seeded with the first value and
/// updated as `prev + alpha * (x - prev)`.
///
/// Returns one value per input; callers drop the warm-up prefix.
pub(crate) fn ewm(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut iter = values.iter();
    let Some(&first) = iter.next() else {
        return out;
    };
    let mut mean = first;
    out.push(mean);
    for &value in iter {
        mean = (1.0 - alpha) * mean + alpha * value;
        out.push(mean);
    }
    out
}
