pub mod sectors;

use analysis_core::{
    MarketSnapshot, MetricSource, MetricValue, Recommendation, SectorMetric, SectorMetrics,
    SectorRule, StockAnalysis, Valuation,
};

pub use sectors::classify_sector;

/// Fallbacks used when the provider omits a field (or reports zero for a ratio)
const DEFAULT_PE: f64 = 20.0;
const DEFAULT_PB: f64 = 2.5;

const UNDERVALUED_MULTIPLE: f64 = 1.3;
const OVERVALUED_MULTIPLE: f64 = 0.9;
const BUY_DISCOUNT: f64 = 0.8;
const SELL_PREMIUM: f64 = 1.1;

/// Round to 2 decimal places for presentation, halves to even
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Treat missing and zero alike, matching how sparse provider data is usually reported
fn or_default(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => v,
        _ => default,
    }
}

/// Intrinsic value heuristic.
///
/// A stock trading below its sector's ideal P/E is assumed to be worth 30%
/// more than its price, otherwise 10% less. BUY below 80% of that estimate,
/// SELL above 110%, HOLD in between.
pub fn evaluate(price: f64, pe: f64, rule: &SectorRule) -> Valuation {
    let intrinsic = if pe < rule.ideal.pe {
        price * UNDERVALUED_MULTIPLE
    } else {
        price * OVERVALUED_MULTIPLE
    };
    let buy_below = intrinsic * BUY_DISCOUNT;
    let sell_above = intrinsic * SELL_PREMIUM;

    let recommendation = if price < buy_below {
        Recommendation::Buy
    } else if price > sell_above {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    };

    Valuation {
        intrinsic,
        buy_below,
        sell_above,
        recommendation,
    }
}

/// Snapshot fields with neutral defaults applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFundamentals {
    pub price: f64,
    pub pe: f64,
    pub pb: f64,
    /// Percent
    pub roe: f64,
    pub eps: f64,
    pub market_cap: f64,
    pub debt_to_equity: f64,
    pub current_ratio: f64,
    /// Percent
    pub profit_margin: f64,
    pub free_cash_flow: f64,
}

impl NormalizedFundamentals {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        Self {
            price: snapshot.price.unwrap_or(0.0),
            pe: or_default(snapshot.trailing_pe, DEFAULT_PE),
            pb: or_default(snapshot.price_to_book, DEFAULT_PB),
            roe: snapshot.return_on_equity.unwrap_or(0.0) * 100.0,
            eps: snapshot.trailing_eps.unwrap_or(0.0),
            market_cap: snapshot.market_cap.unwrap_or(0.0),
            debt_to_equity: snapshot.debt_to_equity.unwrap_or(0.0),
            current_ratio: snapshot.current_ratio.unwrap_or(0.0),
            profit_margin: snapshot.profit_margin.unwrap_or(0.0) * 100.0,
            free_cash_flow: snapshot.free_cash_flow.unwrap_or(0.0),
        }
    }
}

/// Resolve the sector string: a non-empty override wins over the provider label.
/// Whitespace is kept, so a blank override still counts as an override.
pub fn resolve_sector(override_sector: Option<&str>, snapshot: &MarketSnapshot) -> String {
    match override_sector.filter(|s| !s.is_empty()) {
        Some(sector) => sector.to_lowercase(),
        None => snapshot
            .sector
            .as_deref()
            .unwrap_or_default()
            .to_lowercase(),
    }
}

fn resolve_metrics(
    rule: &SectorRule,
    snapshot: &MarketSnapshot,
    fundamentals: &NormalizedFundamentals,
) -> SectorMetrics {
    SectorMetrics(
        rule.metrics
            .iter()
            .map(|def| {
                let value = match def.source {
                    MetricSource::Field(name) => snapshot
                        .field(name)
                        .map(MetricValue::Number)
                        .unwrap_or(MetricValue::NotAvailable),
                    MetricSource::DebtToEquity => MetricValue::Number(fundamentals.debt_to_equity),
                    MetricSource::Note(text) => MetricValue::Text(text.to_string()),
                };
                SectorMetric {
                    label: def.label.to_string(),
                    value,
                }
            })
            .collect(),
    )
}

/// Combines sector classification and the valuation heuristic into a full analysis
#[derive(Debug, Clone, Copy)]
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Analyze a fetched snapshot. Total: every missing input has a default.
    pub fn analyze(
        &self,
        symbol: &str,
        snapshot: &MarketSnapshot,
        sector_override: Option<&str>,
    ) -> StockAnalysis {
        let sector = resolve_sector(sector_override, snapshot);
        tracing::info!("Detected sector for {}: {}", symbol, sector);

        let rule = classify_sector(&sector);
        let fundamentals = NormalizedFundamentals::from_snapshot(snapshot);
        let valuation = evaluate(fundamentals.price, fundamentals.pe, rule);
        let sector_metrics = resolve_metrics(rule, snapshot, &fundamentals);

        tracing::debug!(
            symbol,
            rule = rule.name,
            intrinsic = valuation.intrinsic,
            recommendation = %valuation.recommendation,
            "Valuation computed"
        );

        StockAnalysis {
            symbol: symbol.to_string(),
            sector,
            price: round2(fundamentals.price),
            pe: round2(fundamentals.pe),
            pb: round2(fundamentals.pb),
            roe: round2(fundamentals.roe),
            eps: round2(fundamentals.eps),
            market_cap: fundamentals.market_cap,
            debt_to_equity: round2(fundamentals.debt_to_equity),
            current_ratio: round2(fundamentals.current_ratio),
            profit_margin: round2(fundamentals.profit_margin),
            free_cash_flow: fundamentals.free_cash_flow,
            intrinsic: round2(valuation.intrinsic),
            buy_below: round2(valuation.buy_below),
            sell_above: round2(valuation.sell_above),
            recommendation: valuation.recommendation,
            reason: valuation.recommendation.reason().to_string(),
            sector_metrics,
            sector_ideal_ratios: rule.ideal,
        }
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new()
    }
}
