//! Engine configuration.
//!
//! Benchmarks, weight tables, penalty caps, and thresholds are explicit
//! configuration owned by the engine instance, not module globals: an
//! alternate benchmark set (another jurisdiction, another product tier)
//! substitutes without touching algorithm code. One generic category
//! definition drives both Layer 1 grouping and Layer 2 weighting.

use finhealth_core::category::MetricCategory;
use finhealth_core::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

use crate::input::RiskTolerance;
use crate::types::MetricId;

/// Tolerance for weight-sum validation.
const WEIGHT_EPSILON: f64 = 1e-9;

// ============================================================================
// Benchmarks
// ============================================================================

/// Benchmark values every metric is scored against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmarks {
    /// Months of expenses held in liquid assets.
    pub emergency_buffer_months: f64,
    /// Liquid assets as a share of net worth.
    pub liquid_ratio: f64,
    /// Monthly surplus as a share of income.
    pub savings_rate: f64,
    /// Income as a multiple of expenses.
    pub income_coverage: f64,
    /// Expenses as a share of income.
    pub expense_ratio: f64,
    /// Recurring income share.
    pub income_stability: f64,
    /// Discretionary share of expenses.
    pub discretionary_ratio: f64,
    /// Loan-to-value ratio across the property book.
    pub lvr: f64,
    /// Total debt as a multiple of annual income.
    pub dti: f64,
    /// Repayments as a share of monthly income.
    pub debt_service_ratio: f64,
    /// Unsecured debt as a share of annual income.
    pub consumer_debt_ratio: f64,
    /// Annual interest as a share of annual income.
    pub interest_burden: f64,
    /// Distinct investment types held.
    pub diversification_types: f64,
    /// Investments as a share of total assets.
    pub investment_ratio: f64,
    /// Growth-oriented share of the investment book, absent a declared
    /// risk tolerance.
    pub growth_allocation: f64,
    /// Investment income as a share of investment value.
    pub portfolio_yield: f64,
    /// Equity share of the property book.
    pub property_equity: f64,
    /// Annual rent as a share of investment property value.
    pub rental_yield: f64,
    /// Property as a share of total assets.
    pub property_concentration: f64,
    /// Rent cover of property loan repayments.
    pub rental_cover: f64,
    /// Uninsured share of the property book.
    pub insurance_gap: f64,
    /// Largest single asset as a share of total assets.
    pub asset_concentration: f64,
    /// Liabilities as a share of assets.
    pub leverage: f64,
    /// Largest income source share.
    pub income_dependency: f64,
    /// Investable assets as a share of the retirement target.
    pub retirement_readiness: f64,
    /// Liquid assets as a share of the savings goal.
    pub savings_goal_progress: f64,
    /// Annualized surplus as a share of net worth.
    pub trajectory: f64,
    /// Years of expenses covered by liquid plus invested assets.
    pub longevity_buffer_years: f64,

    /// Sentinel cap for buffer-style metrics when expenses are zero.
    pub max_buffer_months: f64,
    /// Fallback retirement target when the user has not set one.
    pub default_retirement_target: f64,
}

impl Default for Benchmarks {
    fn default() -> Self {
        Self {
            emergency_buffer_months: 6.0,
            liquid_ratio: 0.15,
            savings_rate: 0.20,
            income_coverage: 1.25,
            expense_ratio: 0.80,
            income_stability: 0.80,
            discretionary_ratio: 0.30,
            lvr: 0.80,
            dti: 6.0,
            debt_service_ratio: 0.30,
            consumer_debt_ratio: 0.10,
            interest_burden: 0.15,
            diversification_types: 4.0,
            investment_ratio: 0.25,
            growth_allocation: 0.60,
            portfolio_yield: 0.03,
            property_equity: 0.40,
            rental_yield: 0.04,
            property_concentration: 0.60,
            rental_cover: 1.0,
            insurance_gap: 0.50,
            asset_concentration: 0.40,
            leverage: 0.50,
            income_dependency: 0.80,
            retirement_readiness: 0.50,
            savings_goal_progress: 1.0,
            trajectory: 0.05,
            longevity_buffer_years: 10.0,
            max_buffer_months: 99.0,
            default_retirement_target: 1_000_000.0,
        }
    }
}

impl Benchmarks {
    /// Benchmark for a metric.
    #[must_use]
    pub fn benchmark(&self, id: MetricId) -> f64 {
        match id {
            MetricId::EmergencyBuffer => self.emergency_buffer_months,
            MetricId::LiquidRatio => self.liquid_ratio,
            MetricId::SavingsRate => self.savings_rate,
            MetricId::IncomeCoverage => self.income_coverage,
            MetricId::ExpenseRatio => self.expense_ratio,
            MetricId::IncomeStability => self.income_stability,
            MetricId::DiscretionaryRatio => self.discretionary_ratio,
            MetricId::Lvr => self.lvr,
            MetricId::Dti => self.dti,
            MetricId::DebtServiceRatio => self.debt_service_ratio,
            MetricId::ConsumerDebtRatio => self.consumer_debt_ratio,
            MetricId::InterestBurden => self.interest_burden,
            MetricId::Diversification => self.diversification_types,
            MetricId::InvestmentRatio => self.investment_ratio,
            MetricId::GrowthAllocation => self.growth_allocation,
            MetricId::PortfolioYield => self.portfolio_yield,
            MetricId::PropertyEquity => self.property_equity,
            MetricId::RentalYield => self.rental_yield,
            MetricId::PropertyConcentration => self.property_concentration,
            MetricId::RentalCover => self.rental_cover,
            MetricId::InsuranceGap => self.insurance_gap,
            MetricId::AssetConcentration => self.asset_concentration,
            MetricId::Leverage => self.leverage,
            MetricId::IncomeDependency => self.income_dependency,
            MetricId::RetirementReadiness => self.retirement_readiness,
            MetricId::SavingsGoalProgress => self.savings_goal_progress,
            MetricId::Trajectory => self.trajectory,
            MetricId::LongevityBuffer => self.longevity_buffer_years,
        }
    }

    /// Growth allocation target for a declared risk tolerance.
    #[must_use]
    pub fn growth_target(&self, tolerance: Option<RiskTolerance>) -> f64 {
        match tolerance {
            Some(RiskTolerance::Conservative) => 0.40,
            Some(RiskTolerance::Balanced) => 0.60,
            Some(RiskTolerance::Growth) => 0.70,
            Some(RiskTolerance::Aggressive) => 0.80,
            None => self.growth_allocation,
        }
    }
}

// ============================================================================
// Category Definitions
// ============================================================================

/// One metric's membership in a category, with its intra-category weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricWeight {
    /// Metric identity.
    pub id: MetricId,
    /// Weight applied to the metric's score.
    pub weight: f64,
}

/// Generic category definition: the single table that drives both Layer 1
/// grouping and Layer 2 weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// The category.
    pub category: MetricCategory,
    /// Top-level weight of the category in the composite score.
    pub weight: f64,
    /// Member metrics with intra-category weights summing to 1.0.
    pub metrics: Vec<MetricWeight>,
}

fn weights(entries: &[(MetricId, f64)]) -> Vec<MetricWeight> {
    entries
        .iter()
        .map(|&(id, weight)| MetricWeight { id, weight })
        .collect()
}

/// The default seven category definitions in canonical order.
#[must_use]
pub fn default_categories() -> Vec<CategoryDefinition> {
    vec![
        CategoryDefinition {
            category: MetricCategory::Liquidity,
            weight: 0.20,
            metrics: weights(&[
                (MetricId::EmergencyBuffer, 0.40),
                (MetricId::LiquidRatio, 0.40),
                (MetricId::SavingsRate, 0.20),
            ]),
        },
        CategoryDefinition {
            category: MetricCategory::Cashflow,
            weight: 0.20,
            metrics: weights(&[
                (MetricId::IncomeCoverage, 0.35),
                (MetricId::ExpenseRatio, 0.30),
                (MetricId::IncomeStability, 0.20),
                (MetricId::DiscretionaryRatio, 0.15),
            ]),
        },
        CategoryDefinition {
            category: MetricCategory::Debt,
            weight: 0.20,
            metrics: weights(&[
                (MetricId::Lvr, 0.30),
                (MetricId::Dti, 0.25),
                (MetricId::DebtServiceRatio, 0.20),
                (MetricId::ConsumerDebtRatio, 0.15),
                (MetricId::InterestBurden, 0.10),
            ]),
        },
        CategoryDefinition {
            category: MetricCategory::Investments,
            weight: 0.12,
            metrics: weights(&[
                (MetricId::Diversification, 0.25),
                (MetricId::InvestmentRatio, 0.30),
                (MetricId::GrowthAllocation, 0.25),
                (MetricId::PortfolioYield, 0.20),
            ]),
        },
        CategoryDefinition {
            category: MetricCategory::Property,
            weight: 0.12,
            metrics: weights(&[
                (MetricId::PropertyEquity, 0.35),
                (MetricId::RentalYield, 0.20),
                (MetricId::PropertyConcentration, 0.25),
                (MetricId::RentalCover, 0.20),
            ]),
        },
        CategoryDefinition {
            category: MetricCategory::Risk,
            weight: 0.08,
            metrics: weights(&[
                (MetricId::InsuranceGap, 0.20),
                (MetricId::AssetConcentration, 0.30),
                (MetricId::Leverage, 0.30),
                (MetricId::IncomeDependency, 0.20),
            ]),
        },
        CategoryDefinition {
            category: MetricCategory::Forecast,
            weight: 0.08,
            metrics: weights(&[
                (MetricId::RetirementReadiness, 0.30),
                (MetricId::SavingsGoalProgress, 0.25),
                (MetricId::Trajectory, 0.20),
                (MetricId::LongevityBuffer, 0.25),
            ]),
        },
    ]
}

// ============================================================================
// Penalty Caps
// ============================================================================

/// Independent caps for the five penalty modifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyCaps {
    /// Cap on the data confidence penalty.
    pub data_confidence: f64,
    /// Cap on the insight severity penalty.
    pub insight_severity: f64,
    /// Cap on the forecast risk penalty.
    pub forecast_risk: f64,
    /// Cap on the linkage penalty.
    pub linkage: f64,
    /// Cap on the strategy conflict penalty.
    pub strategy_conflict: f64,
}

impl Default for PenaltyCaps {
    fn default() -> Self {
        Self {
            data_confidence: 10.0,
            insight_severity: 8.0,
            forecast_risk: 4.0,
            linkage: 5.0,
            strategy_conflict: 6.0,
        }
    }
}

// ============================================================================
// Engine Config
// ============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Metric benchmarks.
    pub benchmarks: Benchmarks,
    /// The seven category definitions.
    pub categories: Vec<CategoryDefinition>,
    /// Penalty caps.
    pub penalty_caps: PenaltyCaps,
    /// Category score below which improvement actions are generated.
    pub concern_threshold: f64,
    /// Trend window in days.
    pub trend_window_days: u32,
    /// Percentage change beyond which a trend is not Stable.
    pub trend_threshold_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            benchmarks: Benchmarks::default(),
            categories: default_categories(),
            penalty_caps: PenaltyCaps::default(),
            concern_threshold: 40.0,
            trend_window_days: 90,
            trend_threshold_percent: 2.0,
        }
    }
}

impl EngineConfig {
    /// Validate weight sums and benchmark positivity.
    ///
    /// # Errors
    /// `EngineError::Config` describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        if self.categories.len() != MetricCategory::ALL.len() {
            return Err(EngineError::config(format!(
                "expected {} category definitions, got {}",
                MetricCategory::ALL.len(),
                self.categories.len()
            )));
        }

        let top_sum: f64 = self.categories.iter().map(|c| c.weight).sum();
        if (top_sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(EngineError::config(format!(
                "top-level category weights sum to {top_sum}, expected 1.0"
            )));
        }

        for def in &self.categories {
            if def.metrics.is_empty() {
                return Err(EngineError::config(format!(
                    "category {} has no metrics",
                    def.category
                )));
            }
            let sum: f64 = def.metrics.iter().map(|m| m.weight).sum();
            if (sum - 1.0).abs() > WEIGHT_EPSILON {
                return Err(EngineError::config(format!(
                    "{} metric weights sum to {sum}, expected 1.0",
                    def.category
                )));
            }
            for m in &def.metrics {
                let benchmark = self.benchmarks.benchmark(m.id);
                if !benchmark.is_finite() || benchmark <= 0.0 {
                    return Err(EngineError::config(format!(
                        "benchmark for {} must be positive, got {benchmark}",
                        m.id
                    )));
                }
            }
        }

        if !(0.0..=100.0).contains(&self.concern_threshold) {
            return Err(EngineError::config("concern_threshold must be within [0, 100]"));
        }

        Ok(())
    }

    /// The definition for a category.
    #[must_use]
    pub fn category(&self, category: MetricCategory) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|c| c.category == category)
    }
}
