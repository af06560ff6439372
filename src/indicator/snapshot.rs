use error_stack::Report;
use tracing::trace;

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::atr::Atr;
use crate::indicator::bollinger::BollingerBands;
use crate::indicator::ma::Sma;
use crate::indicator::macd::Macd;
use crate::indicator::rsi::Rsi;
use crate::model::Bar;

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_STD_DEV: f64 = 2.0;
const ATR_PERIOD: usize = 14;
const TREND_SMA_PERIOD: usize = 50;

/// Indicator columns aligned 1:1 with the input bars.
///
/// A column holds `None` until the indicator has enough history.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
    pub sma50: Vec<Option<f64>>,
}

/// Values of every column at the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorValues {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
    pub sma50: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn compute(bars: &[Bar]) -> Result<Self, Report<IndicatorError>> {
        let len = bars.len();

        let rsi = indicator_column(&Rsi::new(RSI_PERIOD)?, bars)?;
        let atr = indicator_column(&Atr::new(ATR_PERIOD)?, bars)?;
        let sma50 = indicator_column(&Sma::new(TREND_SMA_PERIOD)?, bars)?;

        let (macd, macd_signal) = if len >= MACD_SLOW {
            let lines = Macd::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)?.calculate_lines(bars)?;
            (align_series(len, lines.macd), align_series(len, lines.signal))
        } else {
            (vec![None; len], vec![None; len])
        };

        let (bb_upper, bb_middle, bb_lower) = if len >= BOLLINGER_PERIOD {
            let bands =
                BollingerBands::new(BOLLINGER_PERIOD, BOLLINGER_STD_DEV)?.calculate_bands(bars)?;
            (
                align_series(len, bands.iter().map(|b| b.upper).collect()),
                align_series(len, bands.iter().map(|b| b.middle).collect()),
                align_series(len, bands.iter().map(|b| b.lower).collect()),
            )
        } else {
            (vec![None; len], vec![None; len], vec![None; len])
        };

        Ok(Self {
            rsi,
            macd,
            macd_signal,
            bb_upper,
            bb_middle,
            bb_lower,
            atr,
            sma50,
        })
    }

    pub fn latest(&self) -> IndicatorValues {
        fn last(column: &[Option<f64>]) -> Option<f64> {
            column.last().copied().flatten()
        }

        IndicatorValues {
            rsi: last(&self.rsi),
            macd: last(&self.macd),
            macd_signal: last(&self.macd_signal),
            bb_upper: last(&self.bb_upper),
            bb_middle: last(&self.bb_middle),
            bb_lower: last(&self.bb_lower),
            atr: last(&self.atr),
            sma50: last(&self.sma50),
        }
    }
}

fn indicator_column(
    indicator: &dyn Indicator,
    bars: &[Bar],
) -> Result<Vec<Option<f64>>, Report<IndicatorError>> {
    if bars.len() < indicator.required_bars() {
        return Ok(vec![None; bars.len()]);
    }
    let values = indicator.calculate(bars)?;
    trace!(indicator = indicator.name(), values = values.len(), "indicator column computed");
    Ok(align_series(bars.len(), values))
}

/// Right-align `values` against `total_len` bars, padding the front with `None`.
fn align_series(total_len: usize, values: Vec<f64>) -> Vec<Option<f64>> {
    let offset = total_len.saturating_sub(values.len());
    let mut output = vec![None; total_len];
    for (index, value) in values.into_iter().enumerate() {
        output[offset + index] = Some(value);
    }
    output
}
