use async_trait::async_trait;
use crate::{FetchError, MarketSnapshot};

/// Trait for market data sources that can produce a point-in-time snapshot
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, FetchError>;
}
