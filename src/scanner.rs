use std::sync::Arc;

use chrono::Utc;
use error_stack::{Report, ResultExt};
use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::analyze;
use crate::config::{ScanConfig, parse_interval, parse_period};
use crate::error::{ConfigError, ScanError};
use crate::history::format_window;
use crate::market_data::MarketData;
use crate::model::{Action, Bar, Interval, Period, StockAnalysis, Trend};

const EXCHANGE_SUFFIXES: &[&str] = &[".NS", ".BO"];
const DEFAULT_SUFFIX: &str = ".NS";
/// Recommendation scans also keep anything below this RSI.
const RECOMMENDATION_RSI_CEILING: f64 = 35.0;

/// Upper-case a ticker and default it to the NSE listing.
pub fn normalize_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().to_uppercase();
    if EXCHANGE_SUFFIXES.iter().any(|s| symbol.ends_with(s)) {
        symbol
    } else {
        format!("{symbol}{DEFAULT_SUFFIX}")
    }
}

/// Parsed `[scan]` configuration.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub symbols: Vec<String>,
    pub interval: Interval,
    pub period: Period,
    pub recommendation_interval: Interval,
    pub recommendation_period: Period,
    pub history_window: usize,
    pub news_limit: usize,
}

impl ScanSettings {
    pub fn from_config(config: &ScanConfig) -> Result<Self, Report<ConfigError>> {
        Ok(Self {
            symbols: config.symbols.iter().map(|s| normalize_symbol(s)).collect(),
            interval: parse_interval("interval", &config.interval)?,
            period: parse_period("period", &config.period)?,
            recommendation_interval: parse_interval(
                "recommendation_interval",
                &config.recommendation_interval,
            )?,
            recommendation_period: parse_period(
                "recommendation_period",
                &config.recommendation_period,
            )?,
            history_window: config.history_window,
            news_limit: config.news_limit,
        })
    }
}

/// Runs analyses against a market-data source.
pub struct Scanner {
    market: Arc<dyn MarketData>,
    settings: ScanSettings,
}

impl Scanner {
    pub fn new(market: Arc<dyn MarketData>, settings: ScanSettings) -> Self {
        Self { market, settings }
    }

    /// Analyze one symbol with news attached.
    ///
    /// `Ok(None)` means the provider has no data for the symbol.
    pub async fn analyze_symbol(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Option<StockAnalysis>, Report<ScanError>> {
        let symbol = normalize_symbol(symbol);
        let Some(mut analysis) = self
            .analyze_window(&symbol, interval.default_period(), interval)
            .await?
        else {
            return Ok(None);
        };

        analysis.news = match self.market.fetch_news(&symbol, self.settings.news_limit).await {
            Ok(news) => news,
            Err(e) => {
                warn!(symbol = %symbol, error = ?e, "news fetch failed (continuing without news)");
                Vec::new()
            }
        };

        Ok(Some(analysis))
    }

    /// Analyze every configured symbol on the scan interval.
    pub async fn scan_market(&self) -> Vec<StockAnalysis> {
        self.scan(self.settings.interval, self.settings.period).await
    }

    /// Daily-bar scan filtered to oversold names and BUY signals in an uptrend.
    pub async fn recommendations(&self) -> Vec<StockAnalysis> {
        self.scan(
            self.settings.recommendation_interval,
            self.settings.recommendation_period,
        )
        .await
        .into_iter()
        .filter(is_recommended)
        .collect()
    }

    async fn scan(&self, interval: Interval, period: Period) -> Vec<StockAnalysis> {
        let scan_id = Uuid::new_v4().to_string();
        info!(
            scan_id = %scan_id,
            symbols = self.settings.symbols.len(),
            interval = %interval,
            period = %period,
            "market scan started"
        );

        let jobs = self.settings.symbols.iter().map(|symbol| async move {
            let result = self.analyze_window(symbol, period, interval).await;
            (symbol, result)
        });
        let results = join_all(jobs).await;

        let analyses = results
            .into_iter()
            .fold(Vec::new(), |mut analyses, (symbol, result)| {
                match result {
                    Ok(Some(analysis)) => analyses.push(analysis),
                    Ok(None) => debug!(scan_id = %scan_id, symbol = %symbol, "no data, skipping"),
                    Err(e) => {
                        warn!(scan_id = %scan_id, symbol = %symbol, error = ?e, "analysis failed (continuing)")
                    }
                }
                analyses
            });

        info!(
            scan_id = %scan_id,
            analyzed = analyses.len(),
            "market scan complete"
        );
        analyses
    }

    /// Fetch, analyze and attach the display window for one normalized symbol.
    async fn analyze_window(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Option<StockAnalysis>, Report<ScanError>> {
        let bars = self
            .market
            .fetch_bars(symbol, period, interval)
            .await
            .change_context_lazy(|| ScanError::Fetch {
                symbol: symbol.to_string(),
            })?;
        if bars.is_empty() {
            return Ok(None);
        }
        let bars: Vec<Bar> = bars.into_iter().filter(Bar::is_well_formed).collect();

        let mut analysis = analyze(symbol, &bars).change_context_lazy(|| ScanError::Analysis {
            symbol: symbol.to_string(),
        })?;
        analysis.history = format_window(&bars, self.settings.history_window, Utc::now());
        Ok(Some(analysis))
    }
}

fn is_recommended(analysis: &StockAnalysis) -> bool {
    match analysis.signal.action {
        Action::Error => false,
        Action::Buy if analysis.trend == Trend::Up => true,
        _ => analysis.rsi < RECOMMENDATION_RSI_CEILING,
    }
}
