use error_stack::Report;
use tracing::debug;

use crate::error::IndicatorError;
use crate::indicator::snapshot::IndicatorSnapshot;
use crate::model::{Action, Bar, StockAnalysis, TradeSignal, Trend};
use crate::strategy::{SignalInputs, SignalRules};

/// Fewer well-formed bars than this yields an ERROR record.
pub const MIN_BARS: usize = 20;

pub const REASON_INSUFFICIENT: &str = "Insufficient Data";

/// Round to 2 decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Derive a trade recommendation from one symbol's ascending bar series.
///
/// History and news are left empty; the caller attaches them.
pub fn analyze(symbol: &str, bars: &[Bar]) -> Result<StockAnalysis, Report<IndicatorError>> {
    let bars: Vec<Bar> = bars.iter().filter(|b| b.is_well_formed()).copied().collect();
    let Some(last) = bars.last().filter(|_| bars.len() >= MIN_BARS) else {
        debug!(symbol, available = bars.len(), "not enough bars for analysis");
        return Ok(insufficient_data(symbol));
    };
    let current_price = last.close;

    let snapshot = IndicatorSnapshot::compute(&bars)?;
    let latest = snapshot.latest();
    debug!(
        symbol,
        bars = bars.len(),
        rsi = ?latest.rsi,
        macd = ?latest.macd,
        macd_signal = ?latest.macd_signal,
        bb_upper = ?latest.bb_upper,
        bb_middle = ?latest.bb_middle,
        bb_lower = ?latest.bb_lower,
        atr = ?latest.atr,
        sma50 = ?latest.sma50,
        "indicator snapshot"
    );

    let outcome = SignalRules::default().evaluate(&SignalInputs::from_latest(current_price, &latest));

    Ok(StockAnalysis {
        symbol: symbol.to_string(),
        current_price: round2(current_price),
        signal: TradeSignal {
            confidence: round2(outcome.signal.confidence),
            ..outcome.signal
        },
        entry_price: round2(outcome.entry_price),
        target_price: round2(outcome.target_price),
        stop_loss: round2(outcome.stop_loss),
        rsi: round2(latest.rsi.unwrap_or(0.0)),
        macd: round2(latest.macd.unwrap_or(0.0)),
        trend: outcome.trend,
        history: Vec::new(),
        news: Vec::new(),
    })
}

fn insufficient_data(symbol: &str) -> StockAnalysis {
    StockAnalysis {
        symbol: symbol.to_string(),
        current_price: 0.0,
        signal: TradeSignal {
            action: Action::Error,
            confidence: 0.0,
            reason: REASON_INSUFFICIENT.to_string(),
        },
        entry_price: 0.0,
        target_price: 0.0,
        stop_loss: 0.0,
        rsi: 0.0,
        macd: 0.0,
        trend: Trend::Unknown,
        history: Vec::new(),
        news: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{
        REASON_BEARISH_CROSS, REASON_BULLISH_CROSS, REASON_NO_SIGNAL, REASON_OVERBOUGHT,
        REASON_OVERSOLD,
    };
    use crate::testutil::bars_from_closes;

    fn decline(len: usize) -> Vec<f64> {
        (0..len).map(|i| 200.0 - i as f64).collect()
    }

    /// Steep move followed by a flattening one in the same direction.
    fn decelerating(start: f64, step: f64) -> Vec<f64> {
        let mut closes: Vec<f64> = (0..50).map(|i| start + step * i as f64).collect();
        let pivot = closes[49];
        closes.extend((1..=10).map(|i| pivot + step * 0.05 * i as f64));
        closes
    }

    fn assert_error_record(analysis: &StockAnalysis) {
        assert_eq!(analysis.signal.action, Action::Error);
        assert_eq!(analysis.signal.confidence, 0.0);
        assert_eq!(analysis.signal.reason, REASON_INSUFFICIENT);
        assert_eq!(analysis.current_price, 0.0);
        assert_eq!(analysis.entry_price, 0.0);
        assert_eq!(analysis.target_price, 0.0);
        assert_eq!(analysis.stop_loss, 0.0);
        assert_eq!(analysis.rsi, 0.0);
        assert_eq!(analysis.macd, 0.0);
        assert_eq!(analysis.trend, Trend::Unknown);
    }

    #[test]
    fn round2_is_idempotent() {
        for value in [0.0, 1.005, -3.14159, 1234.5678, 99.995, 1e-9] {
            let once = round2(value);
            assert_eq!(round2(once), once);
        }
        assert_eq!(round2(2.346), 2.35);
        assert_eq!(round2(-2.346), -2.35);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(101.125), 101.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn empty_series_is_insufficient() {
        let analysis = analyze("INFY.NS", &[]).unwrap();
        assert_eq!(analysis.symbol, "INFY.NS");
        assert_error_record(&analysis);
    }

    #[test]
    fn nineteen_bars_is_insufficient() {
        let analysis = analyze("INFY.NS", &bars_from_closes(&decline(19))).unwrap();
        assert_error_record(&analysis);
    }

    #[test]
    fn malformed_bars_do_not_count() {
        let mut bars = bars_from_closes(&decline(25));
        for bar in bars.iter_mut().take(10) {
            bar.close = f64::NAN;
        }
        let analysis = analyze("TCS.NS", &bars).unwrap();
        assert_error_record(&analysis);
    }

    #[test]
    fn twenty_bar_decline_is_oversold_buy() {
        let analysis = analyze("TCS.NS", &bars_from_closes(&decline(20))).unwrap();
        assert_eq!(analysis.signal.action, Action::Buy);
        assert_eq!(analysis.signal.reason, REASON_OVERSOLD);
        assert_eq!(analysis.signal.confidence, 0.5);
        assert_eq!(analysis.rsi, 0.0);
        assert_eq!(analysis.current_price, 181.0);
        assert_eq!(analysis.entry_price, 181.0);
        assert!(analysis.stop_loss < analysis.current_price);
        assert!(analysis.current_price < analysis.target_price);
        // MACD needs 26 bars, SMA-50 needs 50
        assert_eq!(analysis.macd, 0.0);
        assert_eq!(analysis.trend, Trend::Unknown);
    }

    #[test]
    fn oversold_with_bullish_crossover_is_confirmed() {
        let analysis = analyze("SBIN.NS", &bars_from_closes(&decelerating(200.0, -1.0))).unwrap();
        assert_eq!(analysis.signal.action, Action::Buy);
        assert_eq!(
            analysis.signal.reason,
            format!("{REASON_OVERSOLD}, {REASON_BULLISH_CROSS}")
        );
        assert_eq!(analysis.signal.confidence, 0.8);
        assert!(analysis.macd < 0.0);
        assert_eq!(analysis.trend, Trend::Down);
    }

    #[test]
    fn overbought_with_bearish_crossover_is_confirmed() {
        let analysis = analyze("ITC.NS", &bars_from_closes(&decelerating(100.0, 1.0))).unwrap();
        assert_eq!(analysis.signal.action, Action::Sell);
        assert_eq!(
            analysis.signal.reason,
            format!("{REASON_OVERBOUGHT}, {REASON_BEARISH_CROSS}")
        );
        assert_eq!(analysis.signal.confidence, 0.8);
        assert_eq!(analysis.rsi, 100.0);
        assert!(analysis.target_price < analysis.current_price);
        assert!(analysis.current_price < analysis.stop_loss);
        assert_eq!(analysis.trend, Trend::Up);
    }

    #[test]
    fn choppy_series_holds_with_zero_prices() {
        let closes: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let analysis = analyze("HDFCBANK.NS", &bars_from_closes(&closes)).unwrap();
        assert_eq!(analysis.signal.action, Action::Hold);
        assert_eq!(analysis.signal.reason, REASON_NO_SIGNAL);
        assert_eq!(analysis.signal.confidence, 0.5);
        assert!(analysis.rsi > 30.0 && analysis.rsi < 70.0);
        assert_eq!(analysis.entry_price, 0.0);
        assert_eq!(analysis.target_price, 0.0);
        assert_eq!(analysis.stop_loss, 0.0);
    }

    #[test]
    fn outputs_are_rounded() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.37).sin() * 3.333).collect();
        let analysis = analyze("WIPRO.NS", &bars_from_closes(&closes)).unwrap();
        for value in [
            analysis.current_price,
            analysis.entry_price,
            analysis.target_price,
            analysis.stop_loss,
            analysis.rsi,
            analysis.macd,
        ] {
            assert_eq!(round2(value), value);
        }
    }
}
