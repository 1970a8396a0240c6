//! Layer 1: metric aggregation.
//!
//! Turns a portfolio snapshot into the full set of benchmarked base
//! metrics. Every division with a potentially-zero denominator resolves to
//! a documented sentinel value so a report can never carry NaN or
//! infinity, no matter how sparse the snapshot is.

use finhealth_core::error::Result;
use finhealth_core::stage::{EngineStage, StageLayer, StageMetadata};
use tracing::debug;

use crate::config::EngineConfig;
use crate::input::{FinancialHealthInput, InvestmentKind, PortfolioSnapshot, PropertyKind};
use crate::types::{AggregatedMetrics, BaseMetric, MetricGroup, MetricId, NamedMetric};

// ============================================================================
// Metric Aggregation Stage
// ============================================================================

/// Metric aggregation stage.
///
/// Pure: identical input yields identical output, and nothing outside the
/// returned value is touched.
#[derive(Debug, Clone)]
pub struct MetricAggregator {
    metadata: StageMetadata,
}

impl Default for MetricAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricAggregator {
    /// Create the stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: StageMetadata::new("health/metric-aggregation", StageLayer::Metrics)
                .with_description("Snapshot to benchmarked base metrics"),
        }
    }

    /// Aggregate the snapshot into benchmarked metrics.
    ///
    /// Validates preconditions first; downstream layers trust the
    /// structural completeness of the result and do not re-validate.
    ///
    /// # Errors
    /// Precondition violations from `FinancialHealthInput::validate`.
    pub fn aggregate(
        input: &FinancialHealthInput,
        config: &EngineConfig,
    ) -> Result<AggregatedMetrics> {
        input.validate()?;

        let view = SnapshotView::build(&input.portfolio);
        let growth_target = config
            .benchmarks
            .growth_target(input.user_goals.as_ref().and_then(|g| g.risk_tolerance));

        let groups = config
            .categories
            .iter()
            .map(|def| MetricGroup {
                category: def.category,
                metrics: def
                    .metrics
                    .iter()
                    .map(|mw| {
                        let value = raw_value(mw.id, &view, input, config);
                        let benchmark = match mw.id {
                            MetricId::GrowthAllocation => growth_target,
                            id => config.benchmarks.benchmark(id),
                        };
                        NamedMetric {
                            id: mw.id,
                            metric: BaseMetric::evaluate(
                                value,
                                benchmark,
                                mw.id.direction(),
                                mw.id.base_confidence(),
                            ),
                        }
                    })
                    .collect(),
            })
            .collect();

        let data_confidence = data_confidence(input);
        debug!(
            user_id = %input.user_id,
            data_confidence,
            "aggregated base metrics"
        );

        Ok(AggregatedMetrics {
            groups,
            data_confidence,
        })
    }
}

impl EngineStage for MetricAggregator {
    fn metadata(&self) -> &StageMetadata {
        &self.metadata
    }
}

// ============================================================================
// Snapshot View
// ============================================================================

/// Aggregates computed once over the snapshot collections.
#[derive(Debug, Default)]
struct SnapshotView {
    monthly_income: f64,
    recurring_income: f64,
    largest_income: f64,
    monthly_expenses: f64,
    discretionary_expenses: f64,
    liquid_assets: f64,
    total_debt: f64,
    consumer_debt: f64,
    monthly_repayments: f64,
    annual_interest: f64,
    property_value: f64,
    investment_property_value: f64,
    insured_property_value: f64,
    monthly_rent: f64,
    property_loans: f64,
    property_loan_repayments: f64,
    investment_value: f64,
    growth_value: f64,
    investment_income: f64,
    distinct_investment_types: f64,
    largest_asset: f64,
    net_worth: f64,
    total_assets: f64,
    total_liabilities: f64,
}

impl SnapshotView {
    fn build(snap: &PortfolioSnapshot) -> Self {
        let mut v = SnapshotView {
            net_worth: snap.net_worth,
            total_assets: snap.total_assets,
            total_liabilities: snap.total_liabilities,
            ..SnapshotView::default()
        };

        for i in &snap.income {
            v.monthly_income += i.monthly_amount;
            if i.recurring {
                v.recurring_income += i.monthly_amount;
            }
            v.largest_income = v.largest_income.max(i.monthly_amount);
        }
        for e in &snap.expenses {
            v.monthly_expenses += e.monthly_amount;
            if e.discretionary {
                v.discretionary_expenses += e.monthly_amount;
            }
        }
        for a in &snap.accounts {
            v.liquid_assets += a.balance;
            v.largest_asset = v.largest_asset.max(a.balance);
        }
        v.liquid_assets = v.liquid_assets.max(0.0);

        for l in &snap.loans {
            v.total_debt += l.principal;
            v.monthly_repayments += l.monthly_repayment;
            v.annual_interest += l.principal * l.interest_rate;
            if l.secured_by_property {
                v.property_loans += l.principal;
                v.property_loan_repayments += l.monthly_repayment;
            } else {
                v.consumer_debt += l.principal;
            }
        }

        for p in &snap.properties {
            v.property_value += p.value;
            v.monthly_rent += p.monthly_rent;
            if p.insured {
                v.insured_property_value += p.value;
            }
            if p.kind == PropertyKind::Investment {
                v.investment_property_value += p.value;
            }
            v.largest_asset = v.largest_asset.max(p.value);
        }

        let mut kinds = std::collections::HashSet::new();
        for i in &snap.investments {
            v.investment_value += i.value;
            v.investment_income += i.annual_income;
            if i.growth_oriented {
                v.growth_value += i.value;
            }
            // Cash-like wrappers count toward liquidity as well
            if i.kind == InvestmentKind::Cash {
                v.liquid_assets += i.value;
            }
            kinds.insert(i.kind);
            v.largest_asset = v.largest_asset.max(i.value);
        }
        v.distinct_investment_types = kinds.len() as f64;

        v
    }

    fn annual_income(&self) -> f64 {
        self.monthly_income * 12.0
    }

    fn annual_expenses(&self) -> f64 {
        self.monthly_expenses * 12.0
    }

    fn surplus(&self) -> f64 {
        self.monthly_income - self.monthly_expenses
    }
}

/// Divide, or fall back when the denominator is not positive.
fn ratio_or(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        fallback
    }
}

/// Raw value for one metric, with every zero-denominator case resolved to
/// its documented sentinel.
fn raw_value(
    id: MetricId,
    v: &SnapshotView,
    input: &FinancialHealthInput,
    config: &EngineConfig,
) -> f64 {
    let b = &config.benchmarks;
    match id {
        // Zero expenses make the buffer undefined; report the capped
        // maximum rather than an infinite runway.
        MetricId::EmergencyBuffer => {
            if v.monthly_expenses > 0.0 {
                (v.liquid_assets / v.monthly_expenses).min(b.max_buffer_months)
            } else {
                b.max_buffer_months
            }
        }
        MetricId::LiquidRatio => ratio_or(v.liquid_assets, v.net_worth, 0.0),
        MetricId::SavingsRate => ratio_or(v.surplus(), v.monthly_income, 0.0),

        MetricId::IncomeCoverage => ratio_or(v.monthly_income, v.monthly_expenses, 0.0),
        // No income with nonzero spending is the worst case, not undefined.
        MetricId::ExpenseRatio => {
            if v.monthly_income > 0.0 {
                v.monthly_expenses / v.monthly_income
            } else if v.monthly_expenses > 0.0 {
                2.0
            } else {
                0.0
            }
        }
        MetricId::IncomeStability => ratio_or(v.recurring_income, v.monthly_income, 0.0),
        MetricId::DiscretionaryRatio => {
            ratio_or(v.discretionary_expenses, v.monthly_expenses, 0.0)
        }

        // No property book means no leverage against it (Scenario B).
        MetricId::Lvr => ratio_or(v.property_loans, v.property_value, 0.0),
        MetricId::Dti => {
            if v.annual_income() > 0.0 {
                v.total_debt / v.annual_income()
            } else if v.total_debt > 0.0 {
                12.0
            } else {
                0.0
            }
        }
        MetricId::DebtServiceRatio => {
            if v.monthly_income > 0.0 {
                v.monthly_repayments / v.monthly_income
            } else if v.monthly_repayments > 0.0 {
                1.0
            } else {
                0.0
            }
        }
        MetricId::ConsumerDebtRatio => {
            if v.annual_income() > 0.0 {
                v.consumer_debt / v.annual_income()
            } else if v.consumer_debt > 0.0 {
                1.0
            } else {
                0.0
            }
        }
        MetricId::InterestBurden => {
            if v.annual_income() > 0.0 {
                v.annual_interest / v.annual_income()
            } else if v.annual_interest > 0.0 {
                1.0
            } else {
                0.0
            }
        }

        MetricId::Diversification => v.distinct_investment_types,
        MetricId::InvestmentRatio => ratio_or(v.investment_value, v.total_assets, 0.0),
        MetricId::GrowthAllocation => ratio_or(v.growth_value, v.investment_value, 0.0),
        MetricId::PortfolioYield => ratio_or(v.investment_income, v.investment_value, 0.0),

        MetricId::PropertyEquity => {
            ratio_or(v.property_value - v.property_loans, v.property_value, 0.0)
        }
        MetricId::RentalYield => {
            ratio_or(v.monthly_rent * 12.0, v.investment_property_value, 0.0)
        }
        MetricId::PropertyConcentration => ratio_or(v.property_value, v.total_assets, 0.0),
        // With no property loans, any rent at all covers them fully.
        MetricId::RentalCover => {
            if v.property_loan_repayments > 0.0 {
                v.monthly_rent / v.property_loan_repayments
            } else if v.monthly_rent > 0.0 {
                2.0
            } else {
                0.0
            }
        }

        // No property exposure means nothing uninsured to worry about.
        MetricId::InsuranceGap => {
            if v.property_value > 0.0 {
                1.0 - v.insured_property_value / v.property_value
            } else {
                0.0
            }
        }
        MetricId::AssetConcentration => ratio_or(v.largest_asset, v.total_assets, 0.0),
        MetricId::Leverage => {
            if v.total_assets > 0.0 {
                v.total_liabilities / v.total_assets
            } else if v.total_liabilities > 0.0 {
                2.0
            } else {
                0.0
            }
        }
        MetricId::IncomeDependency => ratio_or(v.largest_income, v.monthly_income, 0.0),

        MetricId::RetirementReadiness => {
            let target = input
                .user_goals
                .as_ref()
                .and_then(|g| g.retirement_target)
                .filter(|t| *t > 0.0)
                .unwrap_or(b.default_retirement_target);
            (v.investment_value + v.liquid_assets) / target
        }
        MetricId::SavingsGoalProgress => {
            let goal = input
                .user_goals
                .as_ref()
                .and_then(|g| g.savings_goal)
                .filter(|g| *g > 0.0)
                .unwrap_or(v.monthly_expenses * 6.0);
            // No goal and no expenses: nothing to fund, treat as met.
            if goal > 0.0 {
                v.liquid_assets / goal
            } else {
                1.0
            }
        }
        MetricId::Trajectory => {
            if v.net_worth > 0.0 {
                v.surplus() * 12.0 / v.net_worth
            } else if v.surplus() > 0.0 {
                0.10
            } else {
                0.0
            }
        }
        MetricId::LongevityBuffer => {
            if v.annual_expenses() > 0.0 {
                ((v.liquid_assets + v.investment_value) / v.annual_expenses())
                    .min(b.max_buffer_months)
            } else {
                b.max_buffer_months
            }
        }
    }
}

// ============================================================================
// Data Confidence
// ============================================================================

/// Presence weight of each portfolio sub-collection.
const PRESENCE_WEIGHTS: &[(&str, f64)] = &[
    ("accounts", 20.0),
    ("income", 15.0),
    ("expenses", 15.0),
    ("loans", 15.0),
    ("properties", 15.0),
    ("investments", 15.0),
];

/// Consistency score above which the linkage bonus applies.
const LINKAGE_BONUS_THRESHOLD: f64 = 80.0;

/// Per-report data confidence: presence-weighted sub-collection coverage
/// plus a linkage consistency bonus, capped at 100.
#[must_use]
pub fn data_confidence(input: &FinancialHealthInput) -> f64 {
    let snap = &input.portfolio;
    let mut confidence = 0.0;
    for &(name, weight) in PRESENCE_WEIGHTS {
        let present = match name {
            "accounts" => !snap.accounts.is_empty(),
            "income" => !snap.income.is_empty(),
            "expenses" => !snap.expenses.is_empty(),
            "loans" => !snap.loans.is_empty(),
            "properties" => !snap.properties.is_empty(),
            "investments" => !snap.investments.is_empty(),
            _ => false,
        };
        if present {
            confidence += weight;
        }
    }

    if let Some(linkage) = &input.linkage_health {
        if linkage.consistency_score > LINKAGE_BONUS_THRESHOLD {
            confidence += 10.0;
        }
    }

    confidence.min(100.0)
}
