use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Point-in-time market data for one listed stock, as returned by a provider.
///
/// Every field is optional; providers routinely omit ratios for thinly
/// covered names. Normalization to neutral defaults happens in the
/// valuation engine, never here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    /// Fraction, e.g. 0.18 for 18%
    pub return_on_equity: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub market_cap: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    /// Fraction, e.g. 0.12 for 12%
    pub profit_margin: Option<f64>,
    pub free_cash_flow: Option<f64>,
    /// Raw sector label as reported by the provider
    pub sector: Option<String>,
    /// Every numeric field the provider returned, keyed by provider field name
    #[serde(default)]
    pub extra: HashMap<String, f64>,
}

impl MarketSnapshot {
    /// Look up an auxiliary provider field by name
    pub fn field(&self, name: &str) -> Option<f64> {
        self.extra.get(name).copied()
    }
}

/// Ideal valuation ratios for a sector bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IdealRatios {
    #[serde(rename = "ideal_pe")]
    pub pe: f64,
    #[serde(rename = "ideal_pb")]
    pub pb: f64,
    #[serde(rename = "ideal_roe")]
    pub roe: f64,
    #[serde(rename = "ideal_eps")]
    pub eps: f64,
}

/// Where a sector-specific metric gets its value from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricSource {
    /// Auxiliary provider field; reported as N/A when absent
    Field(&'static str),
    /// The snapshot's (defaulted) debt-to-equity ratio
    DebtToEquity,
    /// Fixed advisory text for metrics no provider reports
    Note(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorMetricDef {
    pub label: &'static str,
    pub source: MetricSource,
}

/// Static valuation rule set for one sector bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorRule {
    pub name: &'static str,
    /// Lowercase keywords; any one appearing in the sector string selects this rule
    pub keywords: &'static [&'static str],
    pub ideal: IdealRatios,
    pub metrics: &'static [SectorMetricDef],
}

impl SectorRule {
    pub fn matches(&self, sector: &str) -> bool {
        self.keywords.iter().any(|kw| sector.contains(kw))
    }
}

/// A resolved sector metric value
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    NotAvailable,
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Number(v) => serializer.serialize_f64(*v),
            MetricValue::Text(t) => serializer.serialize_str(t),
            MetricValue::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorMetric {
    pub label: String,
    pub value: MetricValue,
}

/// Sector metrics in rule-table order; serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorMetrics(pub Vec<SectorMetric>);

impl SectorMetrics {
    pub fn get(&self, label: &str) -> Option<&MetricValue> {
        self.0.iter().find(|m| m.label == label).map(|m| &m.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SectorMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for metric in &self.0 {
            map.serialize_entry(&metric.label, &metric.value)?;
        }
        map.end()
    }
}

/// Trade recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    /// Fixed explanation attached to each recommendation
    pub fn reason(&self) -> &'static str {
        match self {
            Recommendation::Buy => {
                "Stock is trading significantly below its estimated intrinsic value."
            }
            Recommendation::Sell => {
                "Stock is trading significantly above its estimated intrinsic value."
            }
            Recommendation::Hold => "Stock is trading near its fair value.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the intrinsic value heuristic
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Valuation {
    pub intrinsic: f64,
    pub buy_below: f64,
    pub sell_above: f64,
    pub recommendation: Recommendation,
}

/// Full analysis returned to API clients
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StockAnalysis {
    pub symbol: String,
    pub sector: String,
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
    pub intrinsic: f64,
    pub buy_below: f64,
    pub sell_above: f64,
    pub recommendation: Recommendation,
    pub reason: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub sector_metrics: SectorMetrics,
    pub sector_ideal_ratios: IdealRatios,
}
