use chrono::{DateTime, Utc};

use crate::analysis::round2;
use crate::model::{Bar, HistoryPoint};

/// Render the trailing `window` bars for display, oldest first.
///
/// Bars stamped on today's date (in the bar's own offset) get a bare `HH:MM`
/// label; older bars carry the date as well.
pub fn format_window(bars: &[Bar], window: usize, now: DateTime<Utc>) -> Vec<HistoryPoint> {
    let start = bars.len().saturating_sub(window);
    bars[start..]
        .iter()
        .map(|bar| {
            let today = now.with_timezone(bar.timestamp.offset()).date_naive();
            let time = if bar.timestamp.date_naive() == today {
                bar.timestamp.format("%H:%M").to_string()
            } else {
                bar.timestamp.format("%Y-%m-%d %H:%M").to_string()
            };
            HistoryPoint {
                time,
                open: round2(bar.open),
                high: round2(bar.high),
                low: round2(bar.low),
                close: round2(bar.close),
            }
        })
        .collect()
}
