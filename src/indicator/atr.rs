use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::model::Bar;

/// ATR (Average True Range) with Wilder smoothing.
///
/// The first bar's true range is its high-low span. The first ATR is the
/// plain mean of the first `period` true ranges, then
/// `atr = (prev * (period - 1) + tr) / period`.
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

fn true_range(bar: &Bar, prev_close: Option<f64>) -> f64 {
    let span = bar.high - bar.low;
    match prev_close {
        Some(prev) => span
            .max((bar.high - prev).abs())
            .max((bar.low - prev).abs()),
        None => span,
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        "atr"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if bars.len() < self.required_bars() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: bars.len(),
            });
        }

        let ranges: Vec<f64> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| true_range(bar, i.checked_sub(1).map(|p| bars[p].close)))
            .collect();

        let period = self.period as f64;
        let mut atr = ranges[..self.period].iter().sum::<f64>() / period;
        let mut results = vec![atr];

        for &tr in &ranges[self.period..] {
            atr = (atr * (period - 1.0) + tr) / period;
            results.push(atr);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{bar_at, bars_from_closes};

    #[test]
    fn atr_period_zero_invalid() {
        assert!(Atr::new(0).is_err());
    }

    #[test]
    fn atr_insufficient_data() {
        let atr = Atr::new(14).unwrap();
        assert!(atr.calculate(&bars_from_closes(&[10.0; 13])).is_err());
    }

    #[test]
    fn atr_constant_span() {
        // fixtures span close - 1 .. close + 1, flat closes -> every TR is 2
        let atr = Atr::new(3).unwrap();
        let values = atr.calculate(&bars_from_closes(&[10.0; 6])).unwrap();
        assert_eq!(values.len(), 4);
        for v in &values {
            assert!((v - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn atr_gap_uses_previous_close() {
        let bars = vec![
            bar_at(0, 10.0, 10.0, 10.0, 10.0),
            bar_at(1, 10.0, 10.0, 10.0, 10.0),
            // gap up: high - low = 1, |high - prev close| = 6
            bar_at(2, 15.0, 16.0, 15.0, 15.5),
        ];
        let atr = Atr::new(2).unwrap();
        let values = atr.calculate(&bars).unwrap();
        // seed: (0 + 0) / 2 = 0; next: (0 * 1 + 6) / 2 = 3
        assert_eq!(values, vec![0.0, 3.0]);
    }
}
