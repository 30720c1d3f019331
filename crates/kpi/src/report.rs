use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A complete, standardized report of a business's financial health.
///
/// This struct is the final output of the `KpiEngine` and the data transfer
/// object handed to report rendering, persistence and the recommendation
/// collaborator. Every field serializes to a plain JSON primitive, object or
/// array; the engine guarantees the structure is always fully populated, so
/// consumers never have to handle a partial report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    // I. Aggregates
    pub total_revenue: f64,
    pub total_cost: f64,
    pub net_profit: f64,
    pub profit_margin: f64,
    pub gross_profit: f64,

    // II. Derived Financials
    pub ebitda: f64,
    pub operating_profit: f64,
    pub burn_rate: f64,
    pub runway_months: Runway,
    pub break_even_point: f64,
    pub roi: f64,
    pub revenue_growth_rate: f64,
    pub expense_ratio: f64,

    // III. Product Analysis
    pub product_wise_analysis: BTreeMap<String, ProductPerformance>,
    pub best_product: Option<ProductHighlight>,
    pub worst_product: Option<ProductHighlight>,

    // IV. Expense Breakdown
    pub expense_breakdown: BTreeMap<ExpenseCategory, f64>,
    pub highest_expense: Option<ExpenseHighlight>,

    // V. Trend Analysis
    pub monthly_revenue: BTreeMap<String, f64>,
    pub monthly_profit: BTreeMap<String, f64>,
    pub growth_trajectory: Trajectory,
    pub seasonal_analysis: BTreeMap<String, f64>,

    // VI. Investment Readiness
    pub scalability_score: f64,
    pub risk_score: f64,
    pub ipo_readiness: f64,
    pub shark_tank_score: u32,
    pub expansion_recommendation: ExpansionRecommendation,

    // VII. Additional Metrics
    pub customer_acquisition_cost: f64,
    pub avg_revenue_per_unit: f64,
    pub operating_efficiency: f64,
    pub cash_flow_health: CashFlowHealth,
    pub market_position: MarketPosition,
}

/// Months of operation left at the current burn rate. A business with no
/// expenses has no meaningful runway, which the report expresses as a
/// literal label rather than a number.
#[derive(Debug, Clone, PartialEq)]
pub enum Runway {
    Months(f64),
    Infinite,
}

impl Runway {
    pub fn as_months(&self) -> Option<f64> {
        match self {
            Runway::Months(m) => Some(*m),
            Runway::Infinite => None,
        }
    }
}

impl Serialize for Runway {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Runway::Months(m) => serializer.serialize_f64(*m),
            Runway::Infinite => serializer.serialize_str("Infinite (No Expenses)"),
        }
    }
}

/// Revenue, directly attributable cost and profit for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPerformance {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

/// The best or worst performing product by profit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductHighlight {
    pub product: String,
    pub profit: f64,
}

/// The four expense categories that make up total cost. Operating expenses
/// are tracked separately (they feed operating profit, not total cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ExpenseCategory {
    #[serde(rename = "Costs_Of_Goods")]
    CostsOfGoods,
    #[serde(rename = "Marketing_Cost")]
    MarketingCost,
    #[serde(rename = "Logistic_Cost")]
    LogisticCost,
    #[serde(rename = "Other_Cost")]
    OtherCost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseHighlight {
    pub category: ExpenseCategory,
    pub percentage: f64,
}

/// Direction of the monthly-revenue series, judged by comparing the mean of
/// its first half against the mean of its second half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trajectory {
    #[serde(rename = "Strong Growth")]
    StrongGrowth,
    #[serde(rename = "Moderate Growth")]
    ModerateGrowth,
    #[serde(rename = "Declining")]
    Declining,
    #[serde(rename = "Stable")]
    Stable,
}

impl std::fmt::Display for Trajectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Trajectory::StrongGrowth => "Strong Growth",
            Trajectory::ModerateGrowth => "Moderate Growth",
            Trajectory::Declining => "Declining",
            Trajectory::Stable => "Stable",
        };
        f.write_str(label)
    }
}

/// Verdict of the expansion recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Yes,
    No,
    Maybe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionRecommendation {
    pub recommendation: Verdict,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CashFlowHealth {
    #[serde(rename = "Excellent Flow")]
    ExcellentFlow,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Fair")]
    Fair,
    #[serde(rename = "Poor")]
    Poor,
}

impl std::fmt::Display for CashFlowHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CashFlowHealth::ExcellentFlow => "Excellent Flow",
            CashFlowHealth::Good => "Good",
            CashFlowHealth::Fair => "Fair",
            CashFlowHealth::Poor => "Poor",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketPosition {
    #[serde(rename = "Market Leader")]
    MarketLeader,
    #[serde(rename = "Strong Competitor")]
    StrongCompetitor,
    #[serde(rename = "Growing Player")]
    GrowingPlayer,
    #[serde(rename = "Struggling/Emerging")]
    StrugglingEmerging,
}

impl std::fmt::Display for MarketPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MarketPosition::MarketLeader => "Market Leader",
            MarketPosition::StrongCompetitor => "Strong Competitor",
            MarketPosition::GrowingPlayer => "Growing Player",
            MarketPosition::StrugglingEmerging => "Struggling/Emerging",
        };
        f.write_str(label)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Yes => "YES",
            Verdict::No => "NO",
            Verdict::Maybe => "MAYBE",
        };
        f.write_str(label)
    }
}
