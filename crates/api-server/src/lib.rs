//! Stock analyzer HTTP service.
//!
//! Wires the Yahoo market data client and the sector valuation engine behind
//! a small axum router.

pub mod analyze_routes;
pub mod config;
pub mod request_id;
pub mod security_headers;

use std::sync::Arc;

use analysis_core::{FetchError, IdealRatios, MarketDataProvider, Recommendation, StockAnalysis};
use anyhow::Context;
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use fundamental_analysis::ValuationEngine;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use yahoo_client::YahooClient;

use config::ServerConfig;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
    pub engine: ValuationEngine,
}

impl AppState {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            engine: ValuationEngine::new(),
        }
    }
}

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing symbol parameter")]
    MissingSymbol,

    /// Cause is logged at the call site; clients only see the generic message
    #[error("Unable to fetch stock data.")]
    Fetch(#[from] FetchError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingSymbol => StatusCode::BAD_REQUEST,
            AppError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Stock Analyzer API", description = "Sector-aware valuation for NSE-listed stocks"),
    paths(analyze_routes::analyze_stock, health),
    components(schemas(StockAnalysis, IdealRatios, Recommendation, ErrorBody)),
    tags(
        (name = "Analysis", description = "Valuation and recommendation"),
        (name = "System", description = "Service health")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "System"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .merge(analyze_routes::analyze_routes())
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            config.enable_hsts,
            security_headers::security_headers_middleware,
        ))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_id::make_request_span))
        .layer(CorsLayer::permissive())
}

/// Plain or JSON log lines depending on `RUST_LOG_FORMAT`; filter from `RUST_LOG`
pub fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "api_server=info,fundamental_analysis=info,yahoo_client=info,tower_http=info".into()
    });

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        "Configuration loaded (provider timeout {}s, HSTS {})",
        config.provider_timeout.as_secs(),
        if config.enable_hsts { "on" } else { "off" }
    );

    let provider: Arc<dyn MarketDataProvider> = Arc::new(YahooClient::new(config.provider_timeout));
    let app = build_router(AppState::new(provider), &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Stock Analyzer running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Stock Analyzer shut down.");
    Ok(())
}
