//! Yahoo Finance market data client.
//!
//! Fetches a single quoteSummary snapshot per call. Yahoo requires a session
//! cookie plus a matching "crumb" token on every quoteSummary request; the
//! pair is cached for the life of the client and dropped on HTTP 401.

pub mod models;

use analysis_core::{FetchError, MarketDataProvider, MarketSnapshot};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use models::{flatten_modules, sector_label, QuoteSummaryResponse, MODULES};

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo endpoints, overridable so tests can point the client at a local server
#[derive(Debug, Clone)]
pub struct YahooEndpoints {
    pub cookie_url: String,
    pub crumb_url: String,
    pub quote_summary_url: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            cookie_url: COOKIE_URL.to_string(),
            crumb_url: CRUMB_URL.to_string(),
            quote_summary_url: QUOTE_SUMMARY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Crumb {
    cookie: String,
    token: String,
}

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    endpoints: YahooEndpoints,
    crumb: Arc<RwLock<Option<Crumb>>>,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoints(YahooEndpoints::default(), timeout)
    }

    pub fn with_endpoints(endpoints: YahooEndpoints, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoints,
            crumb: Arc::new(RwLock::new(None)),
        }
    }

    async fn ensure_crumb(&self) -> Result<Crumb, FetchError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = self.fetch_crumb().await?;
        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_crumb(&self) -> Result<Crumb, FetchError> {
        tracing::debug!("Refreshing Yahoo cookie and crumb");

        // fc.yahoo.com answers 404 but still sets the session cookie
        let response = self
            .client
            .get(&self.endpoints.cookie_url)
            .send()
            .await
            .map_err(|e| FetchError::Http(format!("Failed to get cookie: {}", e)))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(';').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FetchError::Auth("Yahoo did not set a session cookie".to_string()))?;

        let response = self
            .client
            .get(&self.endpoints.crumb_url)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| FetchError::Http(format!("Failed to get crumb: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::Auth(format!(
                "Crumb request returned HTTP {}",
                response.status()
            )));
        }

        let token = response
            .text()
            .await
            .map_err(|e| FetchError::Http(format!("Failed to read crumb: {}", e)))?
            .trim()
            .to_string();

        if token.is_empty() || token.contains('<') || token.len() > 64 {
            return Err(FetchError::Auth("Yahoo returned an invalid crumb".to_string()));
        }

        Ok(Crumb { cookie, token })
    }

    async fn clear_crumb(&self) {
        *self.crumb.write().await = None;
    }

    /// Fetch the quoteSummary modules for `symbol` and flatten them into a snapshot
    pub async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, FetchError> {
        let crumb = self.ensure_crumb().await?;

        let url = format!(
            "{}/{}",
            self.endpoints.quote_summary_url,
            urlencoding::encode(symbol)
        );
        let modules = MODULES.join(",");

        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, &crumb.cookie)
            .query(&[("modules", modules.as_str()), ("crumb", crumb.token.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::warn!("Yahoo rejected crumb for {}, clearing cached session", symbol);
                self.clear_crumb().await;
                return Err(FetchError::Auth("Yahoo authentication expired".to_string()));
            }
            StatusCode::NOT_FOUND => {
                return Err(FetchError::SymbolNotFound(symbol.to_string()));
            }
            status if !status.is_success() => {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }
            _ => {}
        }

        let summary: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        if let Some(error) = summary.quote_summary.error {
            tracing::debug!(
                "quoteSummary error for {}: {:?} {:?}",
                symbol,
                error.code,
                error.description
            );
            return Err(FetchError::SymbolNotFound(symbol.to_string()));
        }

        let result = summary
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;

        let extra = flatten_modules(&result);
        let sector = sector_label(&result);

        Ok(MarketSnapshot {
            price: extra.get("regularMarketPrice").copied(),
            trailing_pe: extra.get("trailingPE").copied(),
            price_to_book: extra.get("priceToBook").copied(),
            return_on_equity: extra.get("returnOnEquity").copied(),
            trailing_eps: extra.get("trailingEps").copied(),
            market_cap: extra.get("marketCap").copied(),
            debt_to_equity: extra.get("debtToEquity").copied(),
            current_ratio: extra.get("currentRatio").copied(),
            profit_margin: extra.get("profitMargins").copied(),
            free_cash_flow: extra.get("freeCashflow").copied(),
            sector,
            extra,
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, FetchError> {
        self.get_snapshot(symbol).await
    }
}
