//! Sector Rule Table
//!
//! Ideal valuation ratios per Indian-market sector bucket, with the auxiliary
//! metrics worth checking for each. Rules are matched by keyword in table
//! order; the first hit wins, so overlapping labels (e.g. "capital goods"
//! contains "it") resolve to the earlier bucket.

use analysis_core::{IdealRatios, MetricSource, SectorMetricDef, SectorRule};

const fn metric(label: &'static str, source: MetricSource) -> SectorMetricDef {
    SectorMetricDef { label, source }
}

pub const BANKING: SectorRule = SectorRule {
    name: "Banking & Finance",
    keywords: &["bank", "finance"],
    ideal: IdealRatios { pe: 10.0, pb: 1.5, roe: 15.0, eps: 40.0 },
    metrics: &[
        metric("Net_Interest_Margin", MetricSource::Field("netInterestMargin")),
        metric("Gross_NPA", MetricSource::Field("grossNPA")),
        metric("Capital_Adequacy_Ratio", MetricSource::Field("capitalAdequacy")),
        metric("Loan_to_Deposit_Ratio", MetricSource::Field("loanToDepositRatio")),
    ],
};

pub const IT_SOFTWARE: SectorRule = SectorRule {
    name: "IT & Software",
    keywords: &["it", "software"],
    ideal: IdealRatios { pe: 25.0, pb: 5.0, roe: 20.0, eps: 60.0 },
    metrics: &[
        metric("EBIT_Margin", MetricSource::Field("ebitMargins")),
        metric("Revenue_from_Digital", MetricSource::Field("revenueGrowth")),
        metric("Employee_Count", MetricSource::Field("fullTimeEmployees")),
    ],
};

pub const PHARMA: SectorRule = SectorRule {
    name: "Pharma",
    keywords: &["pharma"],
    ideal: IdealRatios { pe: 20.0, pb: 3.0, roe: 18.0, eps: 30.0 },
    metrics: &[
        metric("R&D_to_Sales", MetricSource::Field("researchDevelopment")),
        metric("Regulatory_Approvals", MetricSource::Note("Check news manually")),
        metric("Export_Revenue", MetricSource::Note("Check manually")),
    ],
};

pub const CONSUMER: SectorRule = SectorRule {
    name: "FMCG, Retail & Consumer",
    keywords: &["fmcg", "retail", "consumer"],
    ideal: IdealRatios { pe: 40.0, pb: 10.0, roe: 25.0, eps: 20.0 },
    metrics: &[
        metric("Inventory_Turnover", MetricSource::Field("inventoryTurnover")),
        metric("Revenue_Growth", MetricSource::Field("revenueGrowth")),
    ],
};

pub const AUTO: SectorRule = SectorRule {
    name: "Auto",
    keywords: &["auto"],
    ideal: IdealRatios { pe: 20.0, pb: 3.0, roe: 15.0, eps: 30.0 },
    metrics: &[
        metric("Volume_Growth", MetricSource::Note("Check company reports")),
        metric("Export_Contribution", MetricSource::Note("Check manually")),
    ],
};

pub const REAL_ESTATE: SectorRule = SectorRule {
    name: "Real Estate",
    keywords: &["real estate"],
    ideal: IdealRatios { pe: 10.0, pb: 1.5, roe: 10.0, eps: 15.0 },
    metrics: &[
        metric("Debt_Level", MetricSource::DebtToEquity),
        metric("Order_Book_Value", MetricSource::Note("Check investor presentation")),
    ],
};

pub const ENERGY: SectorRule = SectorRule {
    name: "Oil, Gas & Energy",
    keywords: &["oil", "gas", "energy"],
    ideal: IdealRatios { pe: 8.0, pb: 1.5, roe: 12.0, eps: 20.0 },
    metrics: &[
        metric("Crude_Price_Impact", MetricSource::Note("High")),
        metric("Refining_Margin", MetricSource::Note("Check industry data")),
    ],
};

pub const CAPITAL_GOODS: SectorRule = SectorRule {
    name: "Capital Goods & Engineering",
    keywords: &["capital goods", "engineering"],
    ideal: IdealRatios { pe: 15.0, pb: 3.0, roe: 12.0, eps: 25.0 },
    metrics: &[
        metric("Order_Backlog", MetricSource::Note("Check latest filings")),
        metric("Execution_Cycle", MetricSource::Note("Check annual report")),
    ],
};

pub const TELECOM: SectorRule = SectorRule {
    name: "Telecom",
    keywords: &["telecom"],
    ideal: IdealRatios { pe: 20.0, pb: 2.5, roe: 10.0, eps: 20.0 },
    metrics: &[
        metric("ARPU", MetricSource::Note("Check investor deck")),
        metric("Subscriber_Growth", MetricSource::Note("Check TRAI reports")),
    ],
};

/// Applied when no keyword matches
pub const DEFAULT: SectorRule = SectorRule {
    name: "Default",
    keywords: &[],
    ideal: IdealRatios { pe: 15.0, pb: 3.0, roe: 12.0, eps: 25.0 },
    metrics: &[],
};

/// Keyword-matched rules in priority order
pub static SECTOR_RULES: &[SectorRule] = &[
    BANKING,
    IT_SOFTWARE,
    PHARMA,
    CONSUMER,
    AUTO,
    REAL_ESTATE,
    ENERGY,
    CAPITAL_GOODS,
    TELECOM,
];

/// Resolve a sector label to its rule set.
///
/// Matching is case-insensitive substring search in table order. Empty or
/// unrecognized labels get [`DEFAULT`].
pub fn classify_sector(sector: &str) -> &'static SectorRule {
    let sector = sector.to_lowercase();
    if sector.is_empty() {
        return &DEFAULT;
    }

    SECTOR_RULES
        .iter()
        .find(|rule| rule.matches(&sector))
        .unwrap_or(&DEFAULT)
}
