pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::MarketDataError;
use crate::model::{Bar, Interval, NewsItem, Period};

/// Source of price history and headlines for equity symbols.
///
/// Uses `BoxFuture` so the trait stays object-safe (`dyn MarketData`).
pub trait MarketData: Send + Sync {
    /// Fetch bars for `symbol`, oldest first. An empty vector means the
    /// provider has no data for the symbol.
    fn fetch_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> BoxFuture<'_, Result<Vec<Bar>, Report<MarketDataError>>>;

    /// Fetch up to `limit` recent headlines for `symbol`.
    fn fetch_news(
        &self,
        symbol: &str,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<NewsItem>, Report<MarketDataError>>>;
}
