use crate::report::{
    CashFlowHealth, ExpansionRecommendation, ExpenseCategory, ExpenseHighlight, KpiReport,
    MarketPosition, ProductHighlight, ProductPerformance, Runway, Trajectory, Verdict,
};
use chrono::Datelike;
use core_types::Transaction;
use std::collections::BTreeMap;

/// Average Gregorian month length, used to turn a date span into months.
const AVERAGE_DAYS_PER_MONTH: f64 = 30.44;

/// External capital assumptions the report depends on. These are injected
/// per call rather than read from ambient state, so concurrent analyses can
/// use different assumptions safely.
#[derive(Debug, Clone, Copy)]
pub struct Assumptions {
    /// Cash balance assumed for the runway calculation.
    pub current_cash: f64,
    /// Initial investment assumed for the ROI calculation.
    pub initial_investment: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            current_cash: 50_000.0,
            initial_investment: 100_000.0,
        }
    }
}

/// A stateless calculator that derives the full KPI report from a cleaned
/// transaction table.
///
/// Contract: `calculate` never fails for a structurally valid table. Every
/// degeneracy (empty table, zero revenue, a single month of data) resolves
/// to a documented sentinel, because the report consumers cannot handle
/// partial results.
#[derive(Debug, Default)]
pub struct KpiEngine {}

impl KpiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes all KPIs, in dependency order: later metrics reuse earlier
    /// ones instead of re-aggregating the table.
    pub fn calculate(&self, table: &[Transaction], assumptions: &Assumptions) -> KpiReport {
        let sums = ColumnSums::from_table(table);

        // --- Aggregates ---
        let total_revenue = sums.revenue;
        // Deliberately excludes operating expenses; those feed operating
        // profit instead.
        let total_cost =
            sums.costs_of_goods + sums.marketing_cost + sums.logistic_cost + sums.other_cost;
        let net_profit = total_revenue - total_cost;
        let profit_margin = pct_or_zero(net_profit, total_revenue);
        let gross_profit = total_revenue - sums.costs_of_goods;

        // --- Derived financials ---
        // Non-standard EBITDA: cost of goods is subtracted a second time on
        // top of gross profit. Kept for numeric compatibility with
        // historical reports; see DESIGN.md.
        let ebitda =
            gross_profit - (sums.costs_of_goods + sums.marketing_cost + sums.logistic_cost);
        let operating_profit = gross_profit - sums.operating_expenses;

        let burn_rate = round2(total_cost / elapsed_months(table));
        let runway = if burn_rate <= 0.0 {
            Runway::Infinite
        } else {
            Runway::Months(round2(assumptions.current_cash / burn_rate))
        };
        let break_even_point = round2(total_cost);
        let roi = if assumptions.initial_investment == 0.0 {
            0.0
        } else {
            round2(net_profit / assumptions.initial_investment * 100.0)
        };

        let monthly_revenue = monthly_sums(table, |t| t.revenue);
        let revenue_growth_rate = growth_rate(&monthly_revenue);
        let expense_ratio = round2(pct_or_zero(total_cost, total_revenue));

        // --- Product analysis ---
        let product_wise_analysis = product_analysis(table);
        let (best_product, worst_product) = best_and_worst(&product_wise_analysis);

        // --- Expense breakdown ---
        let expense_breakdown = expense_breakdown(&sums, total_cost);
        let highest_expense = highest_expense(&expense_breakdown);

        // --- Trend analysis ---
        let monthly_cost = monthly_sums(table, |t| {
            t.costs_of_goods + t.marketing_cost + t.logistic_cost + t.other_cost
        });
        let monthly_profit: BTreeMap<String, f64> = monthly_revenue
            .iter()
            .map(|(month, revenue)| {
                let cost = monthly_cost.get(month).copied().unwrap_or(0.0);
                (month.clone(), round2(revenue - cost))
            })
            .collect();
        let growth_trajectory = trajectory(&monthly_revenue);
        let seasonal_analysis = quarterly_sums(table);

        // --- Investment readiness ---
        let scalability_score = scalability_score(revenue_growth_rate, profit_margin, expense_ratio);
        let risk_score = risk_score(profit_margin, burn_rate, total_revenue, growth_trajectory);
        let ipo_readiness =
            ipo_readiness(profit_margin, total_revenue, revenue_growth_rate, growth_trajectory);
        let shark_tank_score =
            shark_tank_score(profit_margin, revenue_growth_rate, scalability_score, risk_score);
        let expansion_recommendation = expansion_recommendation(
            profit_margin,
            revenue_growth_rate,
            risk_score,
            growth_trajectory,
        );

        // --- Additional metrics ---
        let customer_acquisition_cost = round2(ratio_or_zero(sums.marketing_cost, sums.units_sold));
        let avg_revenue_per_unit = round2(ratio_or_zero(total_revenue, sums.units_sold));
        let operating_efficiency = round2(pct_or_zero(operating_profit, total_revenue));
        let cash_flow_health = cash_flow_health(net_profit, burn_rate);
        let market_position = market_position(revenue_growth_rate, profit_margin);

        tracing::debug!(
            total_revenue,
            net_profit,
            profit_margin,
            trajectory = %growth_trajectory,
            "KPI report computed"
        );

        KpiReport {
            total_revenue,
            total_cost,
            net_profit,
            profit_margin,
            gross_profit,
            ebitda,
            operating_profit,
            burn_rate,
            runway_months: runway,
            break_even_point,
            roi,
            revenue_growth_rate,
            expense_ratio,
            product_wise_analysis,
            best_product,
            worst_product,
            expense_breakdown,
            highest_expense,
            monthly_revenue: monthly_revenue
                .into_iter()
                .map(|(k, v)| (k, round2(v)))
                .collect(),
            monthly_profit,
            growth_trajectory,
            seasonal_analysis,
            scalability_score,
            risk_score,
            ipo_readiness,
            shark_tank_score,
            expansion_recommendation,
            customer_acquisition_cost,
            avg_revenue_per_unit,
            operating_efficiency,
            cash_flow_health,
            market_position,
        }
    }
}

/// Per-column totals, aggregated in a single pass.
#[derive(Debug, Default)]
struct ColumnSums {
    revenue: f64,
    costs_of_goods: f64,
    marketing_cost: f64,
    logistic_cost: f64,
    operating_expenses: f64,
    other_cost: f64,
    units_sold: f64,
}

impl ColumnSums {
    fn from_table(table: &[Transaction]) -> Self {
        let mut sums = Self::default();
        for t in table {
            sums.revenue += t.revenue;
            sums.costs_of_goods += t.costs_of_goods;
            sums.marketing_cost += t.marketing_cost;
            sums.logistic_cost += t.logistic_cost;
            sums.operating_expenses += t.operating_expenses;
            sums.other_cost += t.other_cost;
            sums.units_sold += t.units_sold;
        }
        sums
    }
}

/// Date span of the table in months, floored at one month so the burn rate
/// is defined even for a single day of data or a table without dates.
fn elapsed_months(table: &[Transaction]) -> f64 {
    let mut dates = table.iter().filter_map(|t| t.date);
    let Some(first) = dates.next() else {
        return 1.0;
    };
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    let days = (max - min).num_days() as f64;
    (days / AVERAGE_DAYS_PER_MONTH).max(1.0)
}

/// Sums `value` per calendar month (`YYYY-MM` keys, chronological order).
/// Rows without a parseable date are excluded from trend metrics.
fn monthly_sums(table: &[Transaction], value: impl Fn(&Transaction) -> f64) -> BTreeMap<String, f64> {
    let mut months = BTreeMap::new();
    for t in table {
        if let Some(date) = t.date {
            let key = format!("{}-{:02}", date.year(), date.month());
            *months.entry(key).or_insert(0.0) += value(t);
        }
    }
    months
}

/// Revenue summed per calendar quarter (`Q1`..`Q4`).
fn quarterly_sums(table: &[Transaction]) -> BTreeMap<String, f64> {
    let mut quarters = BTreeMap::new();
    for t in table {
        if let Some(date) = t.date {
            let quarter = (date.month() - 1) / 3 + 1;
            *quarters.entry(format!("Q{quarter}")).or_insert(0.0) += t.revenue;
        }
    }
    quarters.into_iter().map(|(k, v)| (k, round2(v))).collect()
}

/// Percent change between the first and last calendar month's revenue.
/// Fewer than two months of data, or a zero first month, yields 0.
fn growth_rate(monthly_revenue: &BTreeMap<String, f64>) -> f64 {
    if monthly_revenue.len() < 2 {
        return 0.0;
    }
    let first = monthly_revenue.values().next().copied().unwrap_or(0.0);
    let last = monthly_revenue.values().next_back().copied().unwrap_or(0.0);
    if first == 0.0 {
        return 0.0;
    }
    round2((last - first) / first * 100.0)
}

/// Classifies the monthly-revenue series by comparing the mean of its first
/// half against the mean of its second half. Fewer than two months is
/// reported as "Stable" rather than failing.
fn trajectory(monthly_revenue: &BTreeMap<String, f64>) -> Trajectory {
    let values: Vec<f64> = monthly_revenue.values().map(|v| round2(*v)).collect();
    if values.len() < 2 {
        return Trajectory::Stable;
    }
    let mid = values.len() / 2;
    let first_avg = mean(&values[..mid]);
    let second_avg = mean(&values[mid..]);

    if second_avg > first_avg * 1.1 {
        Trajectory::StrongGrowth
    } else if second_avg > first_avg {
        Trajectory::ModerateGrowth
    } else if second_avg < first_avg * 0.9 {
        Trajectory::Declining
    } else {
        Trajectory::Stable
    }
}

/// Per-product revenue, cost and profit. Product cost counts cost of goods
/// and marketing only (directly attributable spend).
fn product_analysis(table: &[Transaction]) -> BTreeMap<String, ProductPerformance> {
    let mut products: BTreeMap<String, ProductPerformance> = BTreeMap::new();
    for t in table {
        let entry = products
            .entry(t.product.clone())
            .or_insert(ProductPerformance {
                revenue: 0.0,
                cost: 0.0,
                profit: 0.0,
            });
        entry.revenue += t.revenue;
        entry.cost += t.costs_of_goods + t.marketing_cost;
    }
    for perf in products.values_mut() {
        perf.profit = perf.revenue - perf.cost;
    }
    products
}

/// Best and worst product by profit. Ties keep the first product in key
/// order, which is the documented tie-break.
fn best_and_worst(
    products: &BTreeMap<String, ProductPerformance>,
) -> (Option<ProductHighlight>, Option<ProductHighlight>) {
    let mut best: Option<ProductHighlight> = None;
    let mut worst: Option<ProductHighlight> = None;

    for (name, perf) in products {
        if best.as_ref().is_none_or(|b| perf.profit > b.profit) {
            best = Some(ProductHighlight {
                product: name.clone(),
                profit: perf.profit,
            });
        }
        if worst.as_ref().is_none_or(|w| perf.profit < w.profit) {
            worst = Some(ProductHighlight {
                product: name.clone(),
                profit: perf.profit,
            });
        }
    }
    (best, worst)
}

/// Each cost category as a percentage of total cost; empty when there are
/// no costs at all.
fn expense_breakdown(sums: &ColumnSums, total_cost: f64) -> BTreeMap<ExpenseCategory, f64> {
    if total_cost == 0.0 {
        return BTreeMap::new();
    }
    BTreeMap::from([
        (
            ExpenseCategory::CostsOfGoods,
            round2(sums.costs_of_goods / total_cost * 100.0),
        ),
        (
            ExpenseCategory::MarketingCost,
            round2(sums.marketing_cost / total_cost * 100.0),
        ),
        (
            ExpenseCategory::LogisticCost,
            round2(sums.logistic_cost / total_cost * 100.0),
        ),
        (
            ExpenseCategory::OtherCost,
            round2(sums.other_cost / total_cost * 100.0),
        ),
    ])
}

fn highest_expense(breakdown: &BTreeMap<ExpenseCategory, f64>) -> Option<ExpenseHighlight> {
    let mut highest: Option<ExpenseHighlight> = None;
    for (&category, &percentage) in breakdown {
        if highest.as_ref().is_none_or(|h| percentage > h.percentage) {
            highest = Some(ExpenseHighlight {
                category,
                percentage,
            });
        }
    }
    highest
}

/// Scalability score in [0, 100]: additive buckets on growth rate, profit
/// margin and expense ratio.
fn scalability_score(growth: f64, margin: f64, expense_ratio: f64) -> f64 {
    let mut score: f64 = 0.0;

    if growth > 20.0 {
        score += 30.0;
    } else if growth > 10.0 {
        score += 20.0;
    } else if growth > 0.0 {
        score += 10.0;
    }

    if margin > 20.0 {
        score += 30.0;
    } else if margin > 10.0 {
        score += 20.0;
    } else if margin > 0.0 {
        score += 10.0;
    }

    if expense_ratio < 70.0 {
        score += 40.0;
    } else if expense_ratio < 85.0 {
        score += 25.0;
    } else {
        score += 10.0;
    }

    score.min(100.0)
}

/// Risk score in [0, 100]; lower is better.
fn risk_score(margin: f64, burn_rate: f64, revenue: f64, trajectory: Trajectory) -> f64 {
    let mut risk: f64 = 50.0;

    if margin < 0.0 {
        risk += 30.0; // loss-making
    } else if margin < 10.0 {
        risk += 15.0;
    } else {
        risk -= 10.0;
    }

    if burn_rate > revenue / 2.0 {
        risk += 20.0;
    }

    match trajectory {
        Trajectory::Declining => risk += 20.0,
        Trajectory::StrongGrowth => risk -= 15.0,
        _ => {}
    }

    risk.clamp(0.0, 100.0)
}

/// IPO readiness in [0, 100]. The >10M and >5M revenue bonuses are additive:
/// a profitable business above 10M collects both. Inherited behavior, kept
/// as-is; see DESIGN.md.
fn ipo_readiness(margin: f64, revenue: f64, growth: f64, trajectory: Trajectory) -> f64 {
    let mut score: f64 = 0.0;

    if margin > 0.0 && revenue > 10_000_000.0 {
        score += 40.0;
    }
    if margin > 0.0 && revenue > 5_000_000.0 {
        score += 25.0;
    } else if margin > 0.0 {
        score += 10.0;
    }

    if growth > 50.0 {
        score += 30.0;
    } else if growth > 25.0 {
        score += 20.0;
    } else if growth > 10.0 {
        score += 10.0;
    }

    match trajectory {
        Trajectory::StrongGrowth => score += 30.0,
        Trajectory::ModerateGrowth => score += 15.0,
        _ => {}
    }

    score.min(100.0)
}

/// Shark-tank score in [0, 100], truncated to an integer.
fn shark_tank_score(margin: f64, growth: f64, scalability: f64, risk: f64) -> u32 {
    let mut score: f64 = 0.0;

    if margin > 20.0 {
        score += 25.0;
    } else if margin > 10.0 {
        score += 15.0;
    } else if margin > 0.0 {
        score += 5.0;
    }

    if growth > 30.0 {
        score += 25.0;
    } else if growth > 15.0 {
        score += 15.0;
    }

    score += scalability * 0.3;

    if risk < 40.0 {
        score += 20.0;
    }

    (score as u32).min(100)
}

fn expansion_recommendation(
    margin: f64,
    growth: f64,
    risk: f64,
    trajectory: Trajectory,
) -> ExpansionRecommendation {
    if margin <= 0.0 {
        return ExpansionRecommendation {
            recommendation: Verdict::No,
            reasons: vec![
                "Company is not profitable yet".to_string(),
                "Focus on achieving profitability first".to_string(),
            ],
        };
    }

    let mut reasons = Vec::new();
    if margin > 15.0 {
        reasons.push(format!("Healthy profit margin of {margin:.1}%"));
    }
    if growth > 20.0 {
        reasons.push(format!("Strong revenue growth of {growth:.1}%"));
    }
    if risk < 50.0 {
        reasons.push("Low risk profile".to_string());
    }
    if matches!(trajectory, Trajectory::StrongGrowth | Trajectory::ModerateGrowth) {
        reasons.push(format!("{trajectory} trajectory indicates market demand"));
    }

    if reasons.len() >= 3 {
        ExpansionRecommendation {
            recommendation: Verdict::Yes,
            reasons,
        }
    } else if !reasons.is_empty() {
        reasons.push("Monitor performance for 2-3 more quarters before expanding".to_string());
        ExpansionRecommendation {
            recommendation: Verdict::Maybe,
            reasons,
        }
    } else {
        ExpansionRecommendation {
            recommendation: Verdict::No,
            reasons: vec!["Improve profitability and growth metrics first".to_string()],
        }
    }
}

fn cash_flow_health(net_profit: f64, burn_rate: f64) -> CashFlowHealth {
    if net_profit > burn_rate * 2.0 {
        CashFlowHealth::ExcellentFlow
    } else if net_profit > burn_rate {
        CashFlowHealth::Good
    } else if net_profit > 0.0 {
        CashFlowHealth::Fair
    } else {
        CashFlowHealth::Poor
    }
}

fn market_position(growth: f64, margin: f64) -> MarketPosition {
    if growth > 30.0 && margin > 20.0 {
        MarketPosition::MarketLeader
    } else if growth > 15.0 && margin > 10.0 {
        MarketPosition::StrongCompetitor
    } else if growth > 10.0 && margin > 0.0 {
        MarketPosition::GrowingPlayer
    } else {
        MarketPosition::StrugglingEmerging
    }
}

/// `numerator / denominator * 100`, 0 when the denominator is 0.
fn pct_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// `numerator / denominator`, 0 when the denominator is 0.
fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EPS: f64 = 1e-9;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        Some(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn tx(d: Option<NaiveDate>, product: &str, revenue: f64) -> Transaction {
        Transaction {
            date: d,
            product: product.to_string(),
            units_sold: 10.0,
            unit_price: revenue / 10.0,
            revenue,
            costs_of_goods: revenue * 0.3,
            marketing_cost: revenue * 0.1,
            logistic_cost: revenue * 0.1,
            operating_expenses: revenue * 0.05,
            other_cost: revenue * 0.1,
        }
    }

    /// One row per month for 2023, constant revenue 10,000 and constant
    /// per-row cost components summing to 6,000.
    fn constant_year() -> Vec<Transaction> {
        (1..=12)
            .map(|m| Transaction {
                date: date(2023, m, 15),
                product: "Widget".to_string(),
                units_sold: 10.0,
                unit_price: 1_000.0,
                revenue: 10_000.0,
                costs_of_goods: 3_000.0,
                marketing_cost: 1_000.0,
                logistic_cost: 1_000.0,
                operating_expenses: 500.0,
                other_cost: 1_000.0,
            })
            .collect()
    }

    #[test]
    fn constant_year_headline_metrics() {
        let report = KpiEngine::new().calculate(&constant_year(), &Assumptions::default());

        assert!((report.total_revenue - 120_000.0).abs() < EPS);
        assert!((report.total_cost - 72_000.0).abs() < EPS);
        assert!((report.net_profit - 48_000.0).abs() < EPS);
        assert!((report.profit_margin - 40.0).abs() < EPS);
        assert!((report.gross_profit - 84_000.0).abs() < EPS);
        assert_eq!(report.growth_trajectory, Trajectory::Stable);
        // 72,000 of cost against 120,000 of revenue.
        assert!((report.expense_ratio - 60.0).abs() < EPS);
        // Flat revenue month over month.
        assert!((report.revenue_growth_rate - 0.0).abs() < EPS);
        assert_eq!(report.monthly_revenue.len(), 12);
        assert_eq!(report.monthly_revenue["2023-01"], 10_000.0);
        assert_eq!(report.seasonal_analysis["Q1"], 30_000.0);
    }

    #[test]
    fn net_profit_identity_holds() {
        let table = vec![
            tx(date(2023, 1, 1), "A", 5_000.0),
            tx(date(2023, 2, 1), "B", 7_500.0),
            tx(date(2023, 3, 1), "A", 2_500.0),
        ];
        let report = KpiEngine::new().calculate(&table, &Assumptions::default());
        assert!((report.total_revenue - report.total_cost - report.net_profit).abs() < EPS);
    }

    #[test]
    fn zero_revenue_yields_zero_ratios() {
        let table = vec![Transaction {
            revenue: 0.0,
            units_sold: 0.0,
            ..tx(date(2023, 1, 1), "A", 0.0)
        }];
        let report = KpiEngine::new().calculate(&table, &Assumptions::default());
        assert_eq!(report.profit_margin, 0.0);
        assert_eq!(report.expense_ratio, 0.0);
        assert_eq!(report.customer_acquisition_cost, 0.0);
        assert_eq!(report.avg_revenue_per_unit, 0.0);
        assert_eq!(report.operating_efficiency, 0.0);
    }

    #[test]
    fn empty_table_never_fails() {
        let report = KpiEngine::new().calculate(&[], &Assumptions::default());
        assert_eq!(report.total_revenue, 0.0);
        assert_eq!(report.runway_months, Runway::Infinite);
        assert!(report.product_wise_analysis.is_empty());
        assert!(report.best_product.is_none());
        assert_eq!(report.growth_trajectory, Trajectory::Stable);
    }

    #[test]
    fn second_half_ten_percent_above_first_half_is_strong_growth() {
        let mut table: Vec<Transaction> = (1..=6).map(|m| tx(date(2023, m, 1), "A", 1_000.0)).collect();
        table.extend((7..=12).map(|m| tx(date(2023, m, 1), "A", 1_300.0)));

        let report = KpiEngine::new().calculate(&table, &Assumptions::default());
        assert_eq!(report.growth_trajectory, Trajectory::StrongGrowth);
    }

    #[test]
    fn declining_revenue_is_classified_declining() {
        let mut table: Vec<Transaction> = (1..=6).map(|m| tx(date(2023, m, 1), "A", 2_000.0)).collect();
        table.extend((7..=12).map(|m| tx(date(2023, m, 1), "A", 1_000.0)));

        let report = KpiEngine::new().calculate(&table, &Assumptions::default());
        assert_eq!(report.growth_trajectory, Trajectory::Declining);
    }

    #[test]
    fn zero_burn_means_infinite_runway() {
        let table = vec![Transaction {
            costs_of_goods: 0.0,
            marketing_cost: 0.0,
            logistic_cost: 0.0,
            other_cost: 0.0,
            ..tx(date(2023, 1, 1), "A", 5_000.0)
        }];
        let report = KpiEngine::new().calculate(&table, &Assumptions::default());
        assert_eq!(report.burn_rate, 0.0);
        assert_eq!(report.runway_months, Runway::Infinite);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["runway_months"], "Infinite (No Expenses)");
    }

    #[test]
    fn best_product_profit_is_at_least_worst_product_profit() {
        let table = vec![
            tx(date(2023, 1, 1), "Alpha", 9_000.0),
            tx(date(2023, 1, 2), "Beta", 1_000.0),
            tx(date(2023, 1, 3), "Gamma", 4_000.0),
        ];
        let report = KpiEngine::new().calculate(&table, &Assumptions::default());
        let best = report.best_product.unwrap();
        let worst = report.worst_product.unwrap();
        assert!(best.profit >= worst.profit);
        assert_eq!(best.product, "Alpha");
        assert_eq!(worst.product, "Beta");
    }

    #[test]
    fn scores_stay_in_bounds_for_extreme_inputs() {
        let extremes = vec![
            // Massive loss.
            vec![Transaction {
                revenue: 1.0,
                costs_of_goods: 1e12,
                ..tx(date(2023, 1, 1), "A", 1.0)
            }],
            // Negative revenue.
            vec![Transaction {
                revenue: -1e9,
                ..tx(date(2023, 1, 1), "A", 100.0)
            }],
            // Explosive growth on a profitable base.
            vec![
                tx(date(2023, 1, 1), "A", 100.0),
                tx(date(2023, 12, 1), "A", 1e9),
            ],
            // No dates at all.
            vec![tx(None, "A", 1_000.0)],
        ];

        let engine = KpiEngine::new();
        for table in extremes {
            let report = engine.calculate(&table, &Assumptions::default());
            assert!((0.0..=100.0).contains(&report.scalability_score));
            assert!((0.0..=100.0).contains(&report.risk_score));
            assert!((0.0..=100.0).contains(&report.ipo_readiness));
            assert!(report.shark_tank_score <= 100);
        }
    }

    #[test]
    fn unprofitable_business_gets_fixed_no_recommendation() {
        let table = vec![Transaction {
            revenue: 1_000.0,
            costs_of_goods: 5_000.0,
            ..tx(date(2023, 1, 1), "A", 1_000.0)
        }];
        let report = KpiEngine::new().calculate(&table, &Assumptions::default());
        let rec = report.expansion_recommendation;
        assert_eq!(rec.recommendation, Verdict::No);
        assert_eq!(
            rec.reasons,
            vec![
                "Company is not profitable yet".to_string(),
                "Focus on achieving profitability first".to_string(),
            ]
        );
    }

    #[test]
    fn healthy_growing_business_gets_yes_recommendation() {
        // Profitable, strongly growing, low-risk table.
        let mut table: Vec<Transaction> = (1..=6).map(|m| tx(date(2023, m, 1), "A", 10_000.0)).collect();
        table.extend((7..=12).map(|m| tx(date(2023, m, 1), "A", 20_000.0)));

        let report = KpiEngine::new().calculate(&table, &Assumptions::default());
        assert!(report.profit_margin > 15.0);
        assert!(report.revenue_growth_rate > 20.0);
        let rec = report.expansion_recommendation;
        assert_eq!(rec.recommendation, Verdict::Yes);
        assert!(rec.reasons.len() >= 3);
    }

    #[test]
    fn report_serializes_to_plain_json() {
        let report = KpiEngine::new().calculate(&constant_year(), &Assumptions::default());
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["total_revenue"].is_number());
        assert!(json["monthly_revenue"]["2023-06"].is_number());
        assert!(json["expense_breakdown"]["Costs_Of_Goods"].is_number());
        assert_eq!(json["growth_trajectory"], "Stable");
        assert_eq!(json["cash_flow_health"].as_str().unwrap(), "Excellent Flow");
        let verdict = json["expansion_recommendation"]["recommendation"]
            .as_str()
            .unwrap();
        assert!(["YES", "NO", "MAYBE"].contains(&verdict));
    }
}
