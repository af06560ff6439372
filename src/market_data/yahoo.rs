use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::MarketDataConfig;
use crate::error::MarketDataError;
use crate::market_data::MarketData;
use crate::model::{Bar, Interval, NewsItem, Period};

const PROVIDER: &str = "yahoo";
/// Error code Yahoo returns for unknown or delisted symbols.
const NOT_FOUND_CODE: &str = "Not Found";

fn request_error() -> MarketDataError {
    MarketDataError::Request {
        provider: PROVIDER.into(),
    }
}

fn parse_error() -> MarketDataError {
    MarketDataError::ResponseParse {
        provider: PROVIDER.into(),
    }
}

/// Yahoo Finance chart and search endpoints.
pub struct YahooFinance {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    chart_url: String,
    search_url: String,
}

impl YahooFinance {
    pub fn new(config: &MarketDataConfig) -> Result<Self, Report<MarketDataError>> {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(1u32));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .change_context_lazy(request_error)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
            chart_url: config.chart_url.trim_end_matches('/').to_string(),
            search_url: config.search_url.clone(),
        })
    }

    async fn get_json<T, Q>(&self, url: &str, query: &Q) -> Result<T, Report<MarketDataError>>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .change_context_lazy(request_error)
            .attach_with(|| format!("url: {url}"))?;

        let status = response.status();
        let body = response.text().await.change_context_lazy(request_error)?;

        // Yahoo reports unknown symbols as a 404 with a regular chart body
        match serde_json::from_str(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => {
                Err(Report::new(request_error()).attach(format!("HTTP status: {status}")))
            }
            Err(err) => Err(Report::new(err).change_context(parse_error())),
        }
    }
}

impl MarketData for YahooFinance {
    fn fetch_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> BoxFuture<'_, Result<Vec<Bar>, Report<MarketDataError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            let url = format!("{}/{}", self.chart_url, symbol);
            let params = [("range", period.as_str()), ("interval", interval.as_str())];

            let response: ChartResponse = self
                .get_json(&url, &params)
                .await
                .attach_with(|| format!("symbol: {symbol}"))?;
            let bars = response.into_bars()?;

            info!(
                symbol = %symbol,
                period = %period,
                interval = %interval,
                fetched = bars.len(),
                "yahoo bar fetch complete"
            );
            Ok(bars)
        })
    }

    fn fetch_news(
        &self,
        symbol: &str,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<NewsItem>, Report<MarketDataError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            let limit_str = limit.to_string();
            let params = [
                ("q", symbol.as_str()),
                ("newsCount", limit_str.as_str()),
                ("quotesCount", "0"),
            ];

            let response: SearchResponse = self.get_json(&self.search_url, &params).await?;
            let news = response.into_news(limit);

            debug!(symbol = %symbol, fetched = news.len(), "yahoo news fetch complete");
            Ok(news)
        })
    }
}

// ── Chart payload ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

fn value_at(column: &Option<Vec<Option<f64>>>, index: usize) -> Option<f64> {
    column.as_ref()?.get(index).copied().flatten()
}

impl ChartResponse {
    /// Convert to ascending, de-duplicated bars. Missing symbols and empty
    /// results become an empty vector.
    fn into_bars(self) -> Result<Vec<Bar>, Report<MarketDataError>> {
        if let Some(error) = self.chart.error {
            if error.code == NOT_FOUND_CODE {
                return Ok(Vec::new());
            }
            return Err(Report::new(MarketDataError::Api {
                provider: PROVIDER.into(),
                code: error.code,
            })
            .attach(error.description));
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };
        let Some(timestamps) = result.timestamp else {
            return Ok(Vec::new());
        };
        let offset = FixedOffset::east_opt(result.meta.gmtoffset)
            .ok_or_else(|| Report::new(parse_error()))
            .attach_with(|| format!("gmtoffset out of range: {}", result.meta.gmtoffset))?;
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars: Vec<Bar> = timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                Some(Bar {
                    timestamp: DateTime::from_timestamp(ts, 0)?.with_timezone(&offset),
                    open: value_at(&quote.open, i)?,
                    high: value_at(&quote.high, i)?,
                    low: value_at(&quote.low, i)?,
                    close: value_at(&quote.close, i)?,
                    volume: value_at(&quote.volume, i).unwrap_or(0.0),
                })
            })
            .collect();

        bars.sort_by_key(|b| b.timestamp);
        // Keep the last row for a repeated timestamp
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => deduped.push(bar),
            }
        }
        Ok(deduped)
    }
}

// ── Search payload ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
struct SearchNews {
    title: String,
    link: String,
    #[serde(default)]
    publisher: String,
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    resolutions: Vec<ThumbnailResolution>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailResolution {
    url: String,
}

impl SearchResponse {
    fn into_news(self, limit: usize) -> Vec<NewsItem> {
        self.news
            .into_iter()
            .take(limit)
            .map(|n| NewsItem {
                title: n.title,
                link: n.link,
                publisher: n.publisher,
                thumbnail: n
                    .thumbnail
                    .and_then(|t| t.resolutions.into_iter().next())
                    .map(|r| r.url),
            })
            .collect()
    }
}
