use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::MarketDataError;
use crate::market_data::MarketData;
use crate::model::{Bar, Interval, NewsItem, Period};

/// 09:15 IST on 2024-01-01, the first bar of every fixture.
pub fn session_open() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(19_800)
        .unwrap()
        .with_ymd_and_hms(2024, 1, 1, 9, 15, 0)
        .unwrap()
}

/// Bar number `index` of a 15-minute fixture series.
pub fn bar_at(index: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: session_open() + Duration::minutes(15 * index as i64),
        open,
        high,
        low,
        close,
        volume: 1.0,
    }
}

/// Bars spanning `close - 1 .. close + 1` around each close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| bar_at(i, close, close + 1.0, close - 1.0, close))
        .collect()
}

/// Steady decline: RSI 0, oversold BUY once 20 bars exist.
pub fn declining_bars(len: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..len).map(|i| 200.0 - i as f64).collect();
    bars_from_closes(&closes)
}

/// Steady rise: RSI 100, overbought SELL.
pub fn rising_bars(len: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
    bars_from_closes(&closes)
}

/// Alternating closes: RSI near 50, HOLD.
pub fn choppy_bars(len: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..len).map(|i| 100.0 + (i % 2) as f64).collect();
    bars_from_closes(&closes)
}

/// In-memory `MarketData` keyed by symbol.
#[derive(Default)]
pub struct StubMarket {
    pub bars: HashMap<String, Vec<Bar>>,
    pub news: HashMap<String, Vec<NewsItem>>,
    pub failing: HashSet<String>,
    pub failing_news: HashSet<String>,
    pub requests: Mutex<Vec<(String, Period, Interval)>>,
}

impl StubMarket {
    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_news(mut self, symbol: &str, news: Vec<NewsItem>) -> Self {
        self.news.insert(symbol.to_string(), news);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn failing_news(mut self, symbol: &str) -> Self {
        self.failing_news.insert(symbol.to_string());
        self
    }

    pub fn requests(&self) -> Vec<(String, Period, Interval)> {
        self.requests.lock().unwrap().clone()
    }
}

fn stub_error() -> Report<MarketDataError> {
    Report::new(MarketDataError::Request {
        provider: "stub".into(),
    })
}

impl MarketData for StubMarket {
    fn fetch_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> BoxFuture<'_, Result<Vec<Bar>, Report<MarketDataError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap()
                .push((symbol.clone(), period, interval));
            if self.failing.contains(&symbol) {
                return Err(stub_error());
            }
            Ok(self.bars.get(&symbol).cloned().unwrap_or_default())
        })
    }

    fn fetch_news(
        &self,
        symbol: &str,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<NewsItem>, Report<MarketDataError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            if self.failing_news.contains(&symbol) {
                return Err(stub_error());
            }
            let news = self.news.get(&symbol).cloned().unwrap_or_default();
            Ok(news.into_iter().take(limit).collect())
        })
    }
}
