use std::path::Path as FsPath;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info};

use crate::error::ApiError;
use crate::model::{Interval, StockAnalysis};
use crate::scanner::Scanner;

#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
}

#[derive(Debug, Deserialize)]
struct StockQuery {
    interval: Option<String>,
}

#[derive(Debug, Serialize)]
struct StockListResponse {
    stocks: Vec<StockAnalysis>,
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_stocks(State(state): State<AppState>) -> Json<StockListResponse> {
    let stocks = state.scanner.scan_market().await;
    Json(StockListResponse { stocks })
}

/// Analyze one symbol. Unknown intervals fall back to 15m.
async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<StockQuery>,
) -> Result<Json<StockAnalysis>, ApiError> {
    let interval = query
        .interval
        .as_deref()
        .and_then(Interval::from_str)
        .unwrap_or_default();

    match state.scanner.analyze_symbol(&symbol, interval).await {
        Ok(Some(analysis)) if analysis.current_price != 0.0 => Ok(Json(analysis)),
        Ok(_) => Err(ApiError::NotFound),
        Err(report) => {
            error!(symbol = %symbol, interval = %interval, error = ?report, "stock analysis failed");
            Err(ApiError::Internal {
                message: report.current_context().to_string(),
            })
        }
    }
}

async fn get_recommendations(State(state): State<AppState>) -> Json<StockListResponse> {
    let stocks = state.scanner.recommendations().await;
    Json(StockListResponse { stocks })
}

pub fn create_router(state: AppState, static_dir: &str) -> Router {
    let static_root = FsPath::new(static_dir);
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/stocks", get(list_stocks))
        .route("/api/stocks/{symbol}", get(get_stock))
        .route("/api/recommendations", get(get_recommendations))
        .route_service("/", ServeFile::new(static_root.join("index.html")))
        .nest_service("/static", ServeDir::new(static_root))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serve `router` on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "http server listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}
