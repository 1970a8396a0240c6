//! Health report data model.
//!
//! Everything here is a value computed fresh per report generation. All
//! types serialize with serde so a report can be persisted or shipped to
//! the API layer unchanged, and so determinism can be asserted
//! byte-for-byte in tests.

use chrono::{DateTime, NaiveDate, Utc};
use finhealth_core::category::MetricCategory;
use finhealth_core::scoring::{normalize_score, RiskBand, ScoreDirection};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Metric Identity
// ============================================================================

/// Identity of a base metric.
///
/// Direction and base confidence are intrinsic to the metric's meaning and
/// live here; benchmarks are jurisdiction-dependent configuration and live
/// in `EngineConfig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum MetricId {
    // Liquidity
    EmergencyBuffer,
    LiquidRatio,
    SavingsRate,
    // Cashflow
    IncomeCoverage,
    ExpenseRatio,
    IncomeStability,
    DiscretionaryRatio,
    // Debt
    Lvr,
    Dti,
    DebtServiceRatio,
    ConsumerDebtRatio,
    InterestBurden,
    // Investments
    Diversification,
    InvestmentRatio,
    GrowthAllocation,
    PortfolioYield,
    // Property
    PropertyEquity,
    RentalYield,
    PropertyConcentration,
    RentalCover,
    // Risk
    InsuranceGap,
    AssetConcentration,
    Leverage,
    IncomeDependency,
    // Forecast
    RetirementReadiness,
    SavingsGoalProgress,
    Trajectory,
    LongevityBuffer,
}

impl MetricId {
    /// Returns the metric name as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricId::EmergencyBuffer => "emergency_buffer",
            MetricId::LiquidRatio => "liquid_ratio",
            MetricId::SavingsRate => "savings_rate",
            MetricId::IncomeCoverage => "income_coverage",
            MetricId::ExpenseRatio => "expense_ratio",
            MetricId::IncomeStability => "income_stability",
            MetricId::DiscretionaryRatio => "discretionary_ratio",
            MetricId::Lvr => "lvr",
            MetricId::Dti => "dti",
            MetricId::DebtServiceRatio => "debt_service_ratio",
            MetricId::ConsumerDebtRatio => "consumer_debt_ratio",
            MetricId::InterestBurden => "interest_burden",
            MetricId::Diversification => "diversification",
            MetricId::InvestmentRatio => "investment_ratio",
            MetricId::GrowthAllocation => "growth_allocation",
            MetricId::PortfolioYield => "portfolio_yield",
            MetricId::PropertyEquity => "property_equity",
            MetricId::RentalYield => "rental_yield",
            MetricId::PropertyConcentration => "property_concentration",
            MetricId::RentalCover => "rental_cover",
            MetricId::InsuranceGap => "insurance_gap",
            MetricId::AssetConcentration => "asset_concentration",
            MetricId::Leverage => "leverage",
            MetricId::IncomeDependency => "income_dependency",
            MetricId::RetirementReadiness => "retirement_readiness",
            MetricId::SavingsGoalProgress => "savings_goal_progress",
            MetricId::Trajectory => "trajectory",
            MetricId::LongevityBuffer => "longevity_buffer",
        }
    }

    /// Whether a larger raw value is better or worse.
    #[must_use]
    pub const fn direction(&self) -> ScoreDirection {
        match self {
            MetricId::ExpenseRatio
            | MetricId::DiscretionaryRatio
            | MetricId::Lvr
            | MetricId::Dti
            | MetricId::DebtServiceRatio
            | MetricId::ConsumerDebtRatio
            | MetricId::InterestBurden
            | MetricId::PropertyConcentration
            | MetricId::InsuranceGap
            | MetricId::AssetConcentration
            | MetricId::Leverage
            | MetricId::IncomeDependency => ScoreDirection::LowerIsBetter,
            _ => ScoreDirection::HigherIsBetter,
        }
    }

    /// Static base confidence (0-100) reflecting how directly observable
    /// the metric's underlying data is.
    #[must_use]
    pub const fn base_confidence(&self) -> f64 {
        match self {
            MetricId::EmergencyBuffer => 90.0,
            MetricId::LiquidRatio => 85.0,
            MetricId::SavingsRate => 85.0,
            MetricId::IncomeCoverage => 90.0,
            MetricId::ExpenseRatio => 90.0,
            MetricId::IncomeStability => 70.0,
            MetricId::DiscretionaryRatio => 65.0,
            MetricId::Lvr => 95.0,
            MetricId::Dti => 90.0,
            MetricId::DebtServiceRatio => 85.0,
            MetricId::ConsumerDebtRatio => 80.0,
            MetricId::InterestBurden => 75.0,
            MetricId::Diversification => 80.0,
            MetricId::InvestmentRatio => 85.0,
            MetricId::GrowthAllocation => 70.0,
            MetricId::PortfolioYield => 60.0,
            MetricId::PropertyEquity => 95.0,
            MetricId::RentalYield => 75.0,
            MetricId::PropertyConcentration => 90.0,
            MetricId::RentalCover => 70.0,
            // No insurance data source exists; this is inferred from flags.
            MetricId::InsuranceGap => 40.0,
            MetricId::AssetConcentration => 85.0,
            MetricId::Leverage => 95.0,
            MetricId::IncomeDependency => 75.0,
            MetricId::RetirementReadiness => 50.0,
            MetricId::SavingsGoalProgress => 55.0,
            MetricId::Trajectory => 60.0,
            MetricId::LongevityBuffer => 50.0,
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Layer 1 Output
// ============================================================================

/// A single benchmarked financial indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseMetric {
    /// Raw metric value.
    pub value: f64,
    /// Benchmark the value was scored against.
    pub benchmark: f64,
    /// Normalized score (0-100).
    pub score: f64,
    /// Band implied by the score under the shared cut points.
    pub band: RiskBand,
    /// Static base confidence for this metric (0-100).
    pub confidence: f64,
}

impl BaseMetric {
    /// Score a raw value against its benchmark.
    ///
    /// The band is always the image of the score; there is no other
    /// constructor, so the invariant holds everywhere.
    #[must_use]
    pub fn evaluate(
        value: f64,
        benchmark: f64,
        direction: ScoreDirection,
        confidence: f64,
    ) -> Self {
        let score = normalize_score(value, benchmark, direction);
        Self {
            value,
            benchmark,
            score,
            band: RiskBand::from(score),
            confidence,
        }
    }
}

/// A base metric together with its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedMetric {
    /// Metric identity.
    pub id: MetricId,
    /// The evaluated metric.
    pub metric: BaseMetric,
}

/// All metrics of one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricGroup {
    /// The category.
    pub category: MetricCategory,
    /// Member metrics in definition order.
    pub metrics: Vec<NamedMetric>,
}

impl MetricGroup {
    /// Look up a member metric by id.
    #[must_use]
    pub fn metric(&self, id: MetricId) -> Option<&BaseMetric> {
        self.metrics.iter().find(|m| m.id == id).map(|m| &m.metric)
    }
}

/// Layer 1 output: the full benchmarked metric set plus the per-report
/// data confidence scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// The seven metric groups in canonical category order.
    pub groups: Vec<MetricGroup>,
    /// Presence-weighted data confidence (0-100).
    pub data_confidence: f64,
}

impl AggregatedMetrics {
    /// The group for a category.
    #[must_use]
    pub fn group(&self, category: MetricCategory) -> Option<&MetricGroup> {
        self.groups.iter().find(|g| g.category == category)
    }

    /// Look up any metric by id.
    #[must_use]
    pub fn metric(&self, id: MetricId) -> Option<&BaseMetric> {
        self.groups.iter().find_map(|g| g.metric(id))
    }

    /// Iterate over every metric with its id.
    pub fn iter(&self) -> impl Iterator<Item = &NamedMetric> {
        self.groups.iter().flat_map(|g| g.metrics.iter())
    }

    /// Minimum confidence across all metrics; 0 when empty.
    #[must_use]
    pub fn min_confidence(&self) -> f64 {
        let min = self
            .iter()
            .map(|m| m.metric.confidence)
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            min.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

// ============================================================================
// Layer 2 Output
// ============================================================================

/// Immutable snapshot of a metric's contribution to a category score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributingMetric {
    /// Metric identity.
    pub id: MetricId,
    /// Raw value.
    pub value: f64,
    /// Intra-category weight applied to the metric's score.
    pub weight: f64,
    /// The metric's 0-100 score.
    pub score: f64,
    /// Benchmark the metric was scored against.
    pub benchmark: f64,
}

/// One scored category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCategory {
    /// The category.
    pub category: MetricCategory,
    /// Rounded 0-100 category score.
    pub score: f64,
    /// Top-level weight of this category in the composite.
    pub weight: f64,
    /// Per-metric contributions.
    pub contributing_metrics: Vec<ContributingMetric>,
    /// Band implied by the category score.
    pub band: RiskBand,
}

impl HealthCategory {
    /// The category's weighted contribution to the composite score.
    #[must_use]
    pub fn weighted_contribution(&self) -> f64 {
        self.score * self.weight
    }
}

// ============================================================================
// Layer 3 Output
// ============================================================================

/// Direction of the score over the trend window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    /// Score rose more than the threshold.
    Improving,
    /// Score moved within the threshold band.
    Stable,
    /// Score fell more than the threshold.
    Declining,
}

/// One historical score observation, supplied by the persistence
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    /// Observation date.
    pub date: NaiveDate,
    /// Composite score on that date.
    pub score: f64,
}

/// The composite health score with its breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialHealthScore {
    /// Final composite score (0-100, rounded).
    pub score: f64,
    /// Report-level confidence (0-100).
    pub confidence: f64,
    /// The seven scored categories in canonical order.
    pub breakdown: Vec<HealthCategory>,
    /// Trend classification over the requested window.
    pub trend: Trend,
    /// Percentage change over the window that produced the trend.
    pub change_percent: f64,
    /// Injected generation time.
    pub generated_at: DateTime<Utc>,
}

/// The five bounded penalty modifiers applied to the base score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreModifiers {
    /// Penalty for missing portfolio data.
    pub data_confidence_penalty: f64,
    /// Penalty for severe upstream insights.
    pub insight_severity_penalty: f64,
    /// Penalty for a concerning forecast category.
    pub forecast_risk_penalty: f64,
    /// Penalty for entity linkage problems.
    pub linkage_penalty: f64,
    /// Penalty for conflicting active strategies.
    pub strategy_conflict_penalty: f64,
    /// Sum of the five penalties.
    pub total_penalty: f64,
}

// ============================================================================
// Risk Signals
// ============================================================================

/// Category of a discrete risk signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskSignalCategory {
    /// Spending behavior risk.
    Spending,
    /// Borrowing/leverage risk.
    Borrowing,
    /// Liquidity risk.
    Liquidity,
    /// Concentration risk.
    Concentration,
    /// Market exposure risk.
    Market,
    /// Longevity/retirement funding risk.
    Longevity,
}

impl RiskSignalCategory {
    /// Returns the category name as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RiskSignalCategory::Spending => "Spending",
            RiskSignalCategory::Borrowing => "Borrowing",
            RiskSignalCategory::Liquidity => "Liquidity",
            RiskSignalCategory::Concentration => "Concentration",
            RiskSignalCategory::Market => "Market",
            RiskSignalCategory::Longevity => "Longevity",
        }
    }
}

/// Severity of a risk signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskSeverity {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
    /// Critical.
    Critical,
}

/// Evidence attached to a triggered risk signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEvidence {
    /// Metric the rule fired on.
    pub metric: MetricId,
    /// The metric's raw value at evaluation time.
    pub current_value: f64,
    /// The rule threshold that was crossed.
    pub threshold: f64,
}

/// A discrete, rule-triggered risk warning.
///
/// Signals are a parallel hard-threshold detector: they are deliberately
/// not reconciled with category bands, so one critical metric can surface
/// from inside an otherwise healthy averaged category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSignal {
    /// Stable rule identifier (e.g. "risk/high-lvr").
    pub id: String,
    /// Signal category.
    pub category: RiskSignalCategory,
    /// Severity.
    pub severity: RiskSeverity,
    /// Short title.
    pub title: String,
    /// Human-readable description with the observed value.
    pub description: String,
    /// Evidence for the trigger.
    pub evidence: RiskEvidence,
    /// Escalation tier (1 = monitor, 5 = act now).
    pub tier: u8,
}

// ============================================================================
// Improvement Actions
// ============================================================================

/// How hard an action is to carry out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionDifficulty {
    /// Achievable with a small behavior change.
    Easy,
    /// Requires sustained effort.
    Moderate,
    /// Requires restructuring.
    Hard,
}

impl ActionDifficulty {
    /// Relative effort factor used for impact-per-effort ranking.
    #[must_use]
    pub const fn effort(&self) -> f64 {
        match self {
            ActionDifficulty::Easy => 1.0,
            ActionDifficulty::Moderate => 2.0,
            ActionDifficulty::Hard => 3.0,
        }
    }
}

/// Estimated impact of an improvement action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionImpact {
    /// Estimated composite score points recoverable.
    pub score_improvement: f64,
    /// Estimated dollar impact of closing the gap.
    pub financial_impact: f64,
    /// Indicative timeframe.
    pub timeframe: String,
}

/// A ranked remediation suggestion for a weak category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementAction {
    /// Stable action identifier.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Description citing the responsible metric(s).
    pub description: String,
    /// Estimated impact.
    pub impact: ActionImpact,
    /// Category the action remediates.
    pub category: MetricCategory,
    /// Difficulty classification.
    pub difficulty: ActionDifficulty,
    /// Rank: 1 = most impactful per unit of effort; strictly ordered.
    pub priority: u32,
    /// External strategy recommendation backing this action, if any.
    pub strategy_recommendation_id: Option<String>,
}

// ============================================================================
// Evidence Pack
// ============================================================================

/// Discretized confidence level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    /// Confidence >= 70.
    High,
    /// Confidence in [40, 70).
    Medium,
    /// Confidence < 40.
    Low,
}

impl From<f64> for ConfidenceLevel {
    fn from(confidence: f64) -> Self {
        match confidence {
            c if c >= 70.0 => ConfidenceLevel::High,
            c if c >= 40.0 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }
}

/// Category-to-band summary used in the evidence pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMapEntry {
    /// The category.
    pub category: MetricCategory,
    /// Band the category landed in.
    pub band: RiskBand,
    /// Category score.
    pub score: f64,
}

/// Explainability metadata accompanying a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePack {
    /// Names of the input sections that were present.
    pub inputs_used: Vec<String>,
    /// Numeric report confidence (0-100).
    pub confidence: f64,
    /// Discretized confidence level.
    pub confidence_level: ConfidenceLevel,
    /// Ids of upstream insights linked into the report.
    pub insights_linked: Vec<String>,
    /// The historical trend window the report was classified against.
    pub historical_trend: Vec<ScorePoint>,
    /// Category risk map.
    pub risk_map: Vec<RiskMapEntry>,
    /// Injected generation time.
    pub last_updated: DateTime<Utc>,
}

// ============================================================================
// Report
// ============================================================================

/// The complete output of one engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialHealthReport {
    /// Opaque user identifier, echoed from the input.
    pub user_id: String,
    /// Injected generation time.
    pub generated_at: DateTime<Utc>,
    /// Composite score with per-category breakdown.
    pub health_score: FinancialHealthScore,
    /// Triggered risk signals, most severe first.
    pub risk_signals: Vec<RiskSignal>,
    /// Ranked improvement actions, priority 1 first.
    pub improvement_actions: Vec<ImprovementAction>,
    /// Explainability metadata.
    pub evidence: EvidencePack,
    /// The raw Layer 1 metric set.
    pub metrics: AggregatedMetrics,
    /// The penalty modifiers that were applied.
    pub modifiers: ScoreModifiers,
}

impl FinancialHealthReport {
    /// The scored categories in canonical order.
    #[must_use]
    pub fn categories(&self) -> &[HealthCategory] {
        &self.health_score.breakdown
    }
}
