//! Stock Analysis Route
//!
//! `GET /analyze?symbol=<ticker>&sector=<optional override>`

use analysis_core::StockAnalysis;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::{AppError, AppState};

#[cfg(test)]
#[path = "analyze_tests.rs"]
mod analyze_tests;

/// Exchange suffix appended to bare tickers (NSE India)
pub const MARKET_SUFFIX: &str = ".NS";

#[derive(Debug, Default, PartialEq, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyzeQuery {
    /// Ticker symbol; `.NS` is appended when missing
    pub symbol: Option<String>,
    /// Sector override used instead of the provider's label
    pub sector: Option<String>,
}

impl AnalyzeQuery {
    /// Build from raw query pairs. Repeated keys keep their first value and
    /// unknown keys are ignored, so the query string itself never fails.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "symbol" => &mut query.symbol,
                "sector" => &mut query.sector,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", get(analyze_stock))
}

pub fn normalize_symbol(symbol: &str) -> String {
    if symbol.ends_with(MARKET_SUFFIX) {
        symbol.to_string()
    } else {
        format!("{}{}", symbol, MARKET_SUFFIX)
    }
}

#[utoipa::path(
    get,
    path = "/analyze",
    params(AnalyzeQuery),
    responses(
        (status = 200, description = "Valuation and recommendation", body = StockAnalysis),
        (status = 400, description = "Missing symbol parameter", body = crate::ErrorBody),
        (status = 500, description = "Market data lookup failed", body = crate::ErrorBody)
    ),
    tag = "Analysis"
)]
pub async fn analyze_stock(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<StockAnalysis>, AppError> {
    let query = AnalyzeQuery::from_pairs(pairs);
    let symbol = query
        .symbol
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(normalize_symbol)
        .ok_or(AppError::MissingSymbol)?;

    let snapshot = state.provider.fetch_snapshot(&symbol).await.map_err(|e| {
        tracing::error!("Could not analyze stock {}: {}", symbol, e);
        AppError::Fetch(e)
    })?;

    let analysis = state
        .engine
        .analyze(&symbol, &snapshot, query.sector.as_deref());

    Ok(Json(analysis))
}
