#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::{build_router, config::ServerConfig};
    use analysis_core::{FetchError, MarketDataProvider, MarketSnapshot};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Provider double: returns a canned snapshot (or fails) and records requested symbols
    struct StubProvider {
        snapshot: Option<MarketSnapshot>,
        requested: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn returning(snapshot: MarketSnapshot) -> Arc<Self> {
            Arc::new(Self {
                snapshot: Some(snapshot),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                snapshot: None,
                requested: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MarketDataProvider for StubProvider {
        async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, FetchError> {
            self.requested.lock().unwrap().push(symbol.to_string());
            self.snapshot
                .clone()
                .ok_or_else(|| FetchError::Http("connection refused".to_string()))
        }
    }

    fn app(provider: Arc<StubProvider>) -> Router {
        build_router(AppState::new(provider), &ServerConfig::default())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn bank_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            price: Some(90.0),
            trailing_pe: Some(8.0),
            price_to_book: Some(1.234),
            return_on_equity: Some(0.1712),
            trailing_eps: Some(11.111),
            market_cap: Some(5.5e11),
            debt_to_equity: None,
            current_ratio: Some(1.456),
            profit_margin: Some(0.2),
            free_cash_flow: None,
            sector: Some("Financial Services".to_string()),
            extra: [("netInterestMargin".to_string(), 3.4)].into_iter().collect(),
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("RELIANCE"), "RELIANCE.NS");
        assert_eq!(normalize_symbol("RELIANCE.NS"), "RELIANCE.NS");
        assert_eq!(normalize_symbol("reliance.ns"), "reliance.ns.NS");
    }

    #[tokio::test]
    async fn test_missing_symbol_is_400() {
        let provider = StubProvider::failing();
        let (status, body) = get(app(provider.clone()), "/analyze").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "Missing symbol parameter"}));
        assert!(provider.requested().is_empty());
    }

    #[tokio::test]
    async fn test_empty_symbol_is_400() {
        let (status, body) = get(app(StubProvider::failing()), "/analyze?symbol=&sector=bank").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing symbol parameter");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_500() {
        let provider = StubProvider::failing();
        let (status, body) = get(app(provider.clone()), "/analyze?symbol=NOPE").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Unable to fetch stock data."}));
        assert_eq!(provider.requested(), vec!["NOPE.NS".to_string()]);
    }

    #[test]
    fn test_query_pairs_keep_first_value() {
        let pairs = |raw: &[(&str, &str)]| {
            raw.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        };

        let query = AnalyzeQuery::from_pairs(pairs(&[
            ("symbol", "TCS"),
            ("utm_source", "x"),
            ("symbol", "INFY"),
            ("sector", "software"),
        ]));
        assert_eq!(query.symbol.as_deref(), Some("TCS"));
        assert_eq!(query.sector.as_deref(), Some("software"));

        assert_eq!(AnalyzeQuery::from_pairs(Vec::new()), AnalyzeQuery::default());
    }

    #[tokio::test]
    async fn test_repeated_symbol_uses_first() {
        let provider = StubProvider::returning(bank_snapshot());
        let (status, body) = get(app(provider.clone()), "/analyze?symbol=HDFCBANK&symbol=TCS").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(provider.requested(), vec!["HDFCBANK.NS".to_string()]);
        assert_eq!(body["symbol"], "HDFCBANK.NS");
    }

    #[tokio::test]
    async fn test_repeated_sector_uses_first() {
        let provider = StubProvider::returning(bank_snapshot());
        let (status, body) = get(
            app(provider),
            "/analyze?symbol=HDFCBANK&sector=bank&sector=auto",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sector"], "bank");
        assert_eq!(body["sector_ideal_ratios"]["ideal_pe"], 10.0);
    }

    #[tokio::test]
    async fn test_repeated_empty_symbol_is_400() {
        let (status, body) = get(app(StubProvider::failing()), "/analyze?symbol=&symbol=TCS").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "Missing symbol parameter"}));
    }

    #[tokio::test]
    async fn test_successful_analysis() {
        let provider = StubProvider::returning(bank_snapshot());
        let (status, body) = get(app(provider.clone()), "/analyze?symbol=HDFCBANK&sector=Bank").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(provider.requested(), vec!["HDFCBANK.NS".to_string()]);

        assert_eq!(body["symbol"], "HDFCBANK.NS");
        assert_eq!(body["sector"], "bank");
        assert_eq!(body["price"], 90.0);
        assert_eq!(body["pe"], 8.0);
        assert_eq!(body["pb"], 1.23);
        assert_eq!(body["roe"], 17.12);
        assert_eq!(body["eps"], 11.11);
        assert_eq!(body["market_cap"], 5.5e11);
        assert_eq!(body["debt_to_equity"], 0.0);
        assert_eq!(body["current_ratio"], 1.46);
        assert_eq!(body["profit_margin"], 20.0);
        assert_eq!(body["free_cash_flow"], 0.0);

        // pe 8 < ideal 10 => intrinsic 117, buy below 93.6
        assert_eq!(body["intrinsic"], 117.0);
        assert_eq!(body["buy_below"], 93.6);
        assert_eq!(body["sell_above"], 128.7);
        assert_eq!(body["recommendation"], "BUY");
        assert_eq!(
            body["reason"],
            "Stock is trading significantly below its estimated intrinsic value."
        );

        assert_eq!(
            body["sector_ideal_ratios"],
            serde_json::json!({"ideal_pe": 10.0, "ideal_pb": 1.5, "ideal_roe": 15.0, "ideal_eps": 40.0})
        );
        assert_eq!(
            body["sector_metrics"],
            serde_json::json!({
                "Net_Interest_Margin": 3.4,
                "Gross_NPA": "N/A",
                "Capital_Adequacy_Ratio": "N/A",
                "Loan_to_Deposit_Ratio": "N/A"
            })
        );
    }

    #[tokio::test]
    async fn test_provider_sector_used_without_override() {
        let provider = StubProvider::returning(bank_snapshot());
        let (status, body) = get(app(provider), "/analyze?symbol=HDFCBANK.NS").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "HDFCBANK.NS");
        // "financial services" matches no keyword
        assert_eq!(body["sector"], "financial services");
        assert_eq!(body["sector_ideal_ratios"]["ideal_pe"], 15.0);
        assert_eq!(body["sector_metrics"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_sell_recommendation() {
        let snapshot = MarketSnapshot {
            price: Some(150.0),
            trailing_pe: Some(20.0),
            ..Default::default()
        };
        let (status, body) = get(app(StubProvider::returning(snapshot)), "/analyze?symbol=X").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sector"], "");
        assert_eq!(body["intrinsic"], 135.0);
        assert_eq!(body["buy_below"], 108.0);
        assert_eq!(body["sell_above"], 148.5);
        assert_eq!(body["recommendation"], "SELL");
    }

    #[tokio::test]
    async fn test_response_headers() {
        let response = app(StubProvider::failing())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["x-request-id"], "req-123");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["cache-control"], "no-store");
        assert!(headers.get("strict-transport-security").is_none());
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let response = app(StubProvider::failing())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert_eq!(id.len(), 36);
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (status, body) = get(app(StubProvider::failing()), "/api-docs/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/analyze").is_some());
        assert!(body["paths"].get("/health").is_some());
    }

    #[test]
    fn test_app_error_status() {
        assert_eq!(AppError::MissingSymbol.status(), StatusCode::BAD_REQUEST);
        let err: AppError = FetchError::SymbolNotFound("X.NS".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Unable to fetch stock data.");
    }
}
