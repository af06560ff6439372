use crate::indicator::snapshot::IndicatorValues;
use crate::model::{Action, TradeSignal, Trend};

pub const REASON_OVERSOLD: &str = "RSI Oversold (<30)";
pub const REASON_OVERBOUGHT: &str = "RSI Overbought (>70)";
pub const REASON_BULLISH_CROSS: &str = "MACD Bullish Crossover";
pub const REASON_BEARISH_CROSS: &str = "MACD Bearish Crossover";
pub const REASON_NO_SIGNAL: &str = "No clear signal";

const CONFIRMED_CONFIDENCE: f64 = 0.8;
const BASE_CONFIDENCE: f64 = 0.5;

/// Latest market state the rules read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInputs {
    pub current_price: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub atr: Option<f64>,
    pub sma50: Option<f64>,
}

impl SignalInputs {
    pub fn from_latest(current_price: f64, latest: &IndicatorValues) -> Self {
        Self {
            current_price,
            rsi: latest.rsi,
            macd: latest.macd,
            macd_signal: latest.macd_signal,
            atr: latest.atr,
            sma50: latest.sma50,
        }
    }
}

/// Unrounded rule output.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalOutcome {
    pub signal: TradeSignal,
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub trend: Trend,
}

/// RSI mean-reversion rules confirmed by MACD, with ATR-based exits.
#[derive(Debug, Clone, Copy)]
pub struct SignalRules {
    pub oversold: f64,
    pub overbought: f64,
    pub stop_atr_multiple: f64,
    pub target_atr_multiple: f64,
}

impl Default for SignalRules {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
            stop_atr_multiple: 1.5,
            target_atr_multiple: 2.0,
        }
    }
}

impl SignalRules {
    pub fn evaluate(&self, inputs: &SignalInputs) -> SignalOutcome {
        let mut reasons: Vec<&str> = Vec::new();

        let action = match inputs.rsi {
            Some(rsi) if rsi < self.oversold => {
                reasons.push(REASON_OVERSOLD);
                Action::Buy
            }
            Some(rsi) if rsi > self.overbought => {
                reasons.push(REASON_OVERBOUGHT);
                Action::Sell
            }
            _ => Action::Hold,
        };

        // Confirmation only; MACD alone never turns HOLD into a trade
        if let (Some(macd), Some(signal)) = (inputs.macd, inputs.macd_signal) {
            match action {
                Action::Buy if macd > signal => reasons.push(REASON_BULLISH_CROSS),
                Action::Sell if macd < signal => reasons.push(REASON_BEARISH_CROSS),
                _ => {}
            }
        }

        let confidence = if reasons.len() >= 2 {
            CONFIRMED_CONFIDENCE
        } else {
            BASE_CONFIDENCE
        };
        let reason = if reasons.is_empty() {
            REASON_NO_SIGNAL.to_string()
        } else {
            reasons.join(", ")
        };

        let trend = match inputs.sma50 {
            Some(sma) if inputs.current_price > sma => Trend::Up,
            Some(_) => Trend::Down,
            None => Trend::Unknown,
        };

        let price = inputs.current_price;
        let atr = inputs.atr.unwrap_or(0.0);
        let (entry_price, stop_loss, target_price) = match action {
            Action::Buy => (
                price,
                price - self.stop_atr_multiple * atr,
                price + self.target_atr_multiple * atr,
            ),
            Action::Sell => (
                price,
                price + self.stop_atr_multiple * atr,
                price - self.target_atr_multiple * atr,
            ),
            Action::Hold | Action::Error => (0.0, 0.0, 0.0),
        };

        SignalOutcome {
            signal: TradeSignal {
                action,
                confidence,
                reason,
            },
            entry_price,
            target_price,
            stop_loss,
            trend,
        }
    }
}
