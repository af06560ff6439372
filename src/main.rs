mod analysis;
mod config;
mod error;
mod history;
mod indicator;
mod market_data;
mod model;
mod scanner;
mod server;
mod strategy;
#[cfg(test)]
mod testutil;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use market_data::MarketData;
use market_data::yahoo::YahooFinance;
use scanner::{ScanSettings, Scanner};
use server::AppState;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("market data client error")]
    MarketData,
    #[display("http server error")]
    Server,
    #[display("runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(name = "stock-signals", about = "Technical-analysis trade signals for equities")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    // ── Market data ───────────────────────────────────────────────────────────
    let market: Arc<dyn MarketData> = Arc::new(
        YahooFinance::new(&config.market_data).change_context(AppError::MarketData)?,
    );

    // ── Scanner ───────────────────────────────────────────────────────────────
    let settings = ScanSettings::from_config(&config.scan).change_context(AppError::Config)?;
    info!(
        symbols = settings.symbols.len(),
        interval = %settings.interval,
        period = %settings.period,
        "scanner configured"
    );
    let state = AppState {
        scanner: Arc::new(Scanner::new(market, settings)),
    };

    // ── HTTP server ───────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .change_context(AppError::Server)
        .attach_with(|| format!("addr: {addr}"))?;
    let router = server::create_router(state, &config.server.static_dir);

    let cancel = CancellationToken::new();
    let server_handle = tokio::spawn(server::serve(listener, router, cancel.clone()));

    // ── Shutdown ──────────────────────────────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .change_context(AppError::Runtime)?;

    info!("ctrl+c received, shutting down");
    cancel.cancel();

    server_handle
        .await
        .change_context(AppError::Runtime)?
        .change_context(AppError::Server)?;

    info!("shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
