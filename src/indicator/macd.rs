use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::ma::Ema;
use crate::indicator::{Indicator, close_prices};
use crate::model::Bar;

pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

/// MACD line and its signal line, aligned to the same bars.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    /// Starts at bar `slow_period - 1`.
    pub macd: Vec<f64>,
    /// Starts at bar `slow_period + signal_period - 2`.
    pub signal: Vec<f64>,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidParameter {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
        })
    }

    /// Calculate the MACD and signal lines.
    ///
    /// Needs only `slow_period` bars for the MACD line; the signal line stays
    /// empty until `slow_period + signal_period - 1` bars exist.
    pub fn calculate_lines(&self, bars: &[Bar]) -> Result<MacdSeries, Report<IndicatorError>> {
        let prices = close_prices(bars);
        if prices.len() < self.slow_period {
            bail!(IndicatorError::InsufficientData {
                required: self.slow_period,
                available: prices.len(),
            });
        }

        let fast_ema = Ema::new(self.fast_period)?.calculate_prices(&prices)?;
        let slow_ema = Ema::new(self.slow_period)?.calculate_prices(&prices)?;

        // Align: slow_ema is shorter by (slow_period - fast_period) elements
        let offset = self.slow_period - self.fast_period;
        let macd: Vec<f64> = fast_ema[offset..]
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal = if macd.len() >= self.signal_period {
            Ema::new(self.signal_period)?.calculate_prices(&macd)?
        } else {
            Vec::new()
        };

        Ok(MacdSeries { macd, signal })
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn required_bars(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    /// Returns MACD line values from the first bar that also has a signal value.
    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if bars.len() < self.required_bars() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: bars.len(),
            });
        }
        let lines = self.calculate_lines(bars)?;
        Ok(lines.macd[self.signal_period - 1..].to_vec())
    }
}
