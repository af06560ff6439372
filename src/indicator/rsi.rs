use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices, ewm};
use crate::model::Bar;

/// RSI (Relative Strength Index) using Wilder's smoothing factor `1 / period`.
///
/// Gains and losses are exponentially averaged from the first bar, whose
/// change counts as zero, and the first value is reported once `period`
/// observations exist.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        let prices = close_prices(bars);
        if prices.len() < self.required_bars() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: prices.len(),
            });
        }

        let deltas: Vec<f64> = std::iter::once(0.0)
            .chain(prices.windows(2).map(|w| w[1] - w[0]))
            .collect();
        let gains: Vec<f64> = deltas.iter().map(|&d| d.max(0.0)).collect();
        let losses: Vec<f64> = deltas.iter().map(|&d| (-d).max(0.0)).collect();

        let alpha = 1.0 / self.period as f64;
        let avg_gains = ewm(&gains, alpha);
        let avg_losses = ewm(&losses, alpha);

        Ok(avg_gains
            .iter()
            .zip(avg_losses.iter())
            .skip(self.period - 1)
            .map(|(&gain, &loss)| rsi_value(gain, loss))
            .collect())
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
