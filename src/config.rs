use std::collections::HashSet;
use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{Interval, Period};
use crate::scanner::normalize_symbol;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> String {
    "./static".into()
}

fn default_chart_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".into()
}

fn default_search_url() -> String {
    "https://query1.finance.yahoo.com/v1/finance/search".into()
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)".into()
}

fn default_symbols() -> Vec<String> {
    [
        "RELIANCE.NS",
        "TCS.NS",
        "HDFCBANK.NS",
        "INFY.NS",
        "ICICIBANK.NS",
        "HINDUNILVR.NS",
        "SBIN.NS",
        "BHARTIARTL.NS",
        "ITC.NS",
        "KOTAKBANK.NS",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_interval() -> String {
    "15m".into()
}

fn default_period() -> String {
    "5d".into()
}

fn default_recommendation_interval() -> String {
    "1d".into()
}

fn default_recommendation_period() -> String {
    "6mo".into()
}

fn default_history_window() -> usize {
    50
}

fn default_news_limit() -> usize {
    3
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub market_data: MarketDataConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding `index.html` and the assets served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketDataConfig {
    #[serde(default = "default_chart_url")]
    pub chart_url: String,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            chart_url: default_chart_url(),
            search_url: default_search_url(),
            requests_per_second: default_requests_per_second(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_recommendation_interval")]
    pub recommendation_interval: String,
    #[serde(default = "default_recommendation_period")]
    pub recommendation_period: String,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_news_limit")]
    pub news_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            interval: default_interval(),
            period: default_period(),
            recommendation_interval: default_recommendation_interval(),
            recommendation_period: default_recommendation_period(),
            history_window: default_history_window(),
            news_limit: default_news_limit(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(&config.general)?;
    validate_market_data(&config.market_data)?;
    validate_scan_timing(&config.scan)?;
    validate_symbols(&config.scan)?;
    Ok(())
}

fn validate_general(general: &GeneralConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" must be \"text\" or \"json\"",
            general.log_format
        )));
    }
    Ok(())
}

fn validate_market_data(market: &MarketDataConfig) -> Result<(), Report<ConfigError>> {
    if market.requests_per_second == 0 {
        return Err(invalid("market_data.requests_per_second must be > 0".into()));
    }
    if market.timeout_secs == 0 {
        return Err(invalid("market_data.timeout_secs must be > 0".into()));
    }
    Ok(())
}

/// Parse a `[scan]` interval field.
pub fn parse_interval(field: &str, value: &str) -> Result<Interval, Report<ConfigError>> {
    Interval::from_str(value)
        .ok_or_else(|| invalid(format!("scan.{field}: unknown interval \"{value}\"")))
}

/// Parse a `[scan]` period field.
pub fn parse_period(field: &str, value: &str) -> Result<Period, Report<ConfigError>> {
    Period::from_str(value)
        .ok_or_else(|| invalid(format!("scan.{field}: unknown period \"{value}\"")))
}

fn validate_scan_timing(scan: &ScanConfig) -> Result<(), Report<ConfigError>> {
    parse_interval("interval", &scan.interval)?;
    parse_interval("recommendation_interval", &scan.recommendation_interval)?;
    parse_period("period", &scan.period)?;
    parse_period("recommendation_period", &scan.recommendation_period)?;
    if scan.history_window == 0 {
        return Err(invalid("scan.history_window must be > 0".into()));
    }
    Ok(())
}

fn validate_symbols(scan: &ScanConfig) -> Result<(), Report<ConfigError>> {
    let mut seen = HashSet::new();
    for symbol in &scan.symbols {
        if symbol.trim().is_empty() {
            return Err(invalid("scan.symbols: empty symbol".into()));
        }
        if !seen.insert(normalize_symbol(symbol)) {
            return Err(invalid(format!("scan.symbols: duplicate symbol \"{symbol}\"")));
        }
    }
    Ok(())
}
