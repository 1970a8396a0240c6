//! Rule-based risk signal derivation.
//!
//! A parallel hard-threshold detector over the raw metric values. Rule
//! thresholds are fixed per rule and deliberately separate from the scoring
//! benchmarks, and signals are never reconciled with category bands: one
//! severely breached metric surfaces even when its averaged category looks
//! healthy.

use finhealth_core::stage::{EngineStage, StageLayer, StageMetadata};
use std::collections::HashMap;
use tracing::debug;

use crate::types::{
    AggregatedMetrics, MetricId, RiskEvidence, RiskSeverity, RiskSignal, RiskSignalCategory,
};

// ============================================================================
// Rules
// ============================================================================

/// How a rule compares the metric value to its threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleComparison {
    /// Trigger when value > threshold.
    Above,
    /// Trigger when value < threshold.
    Below,
}

/// One hard-threshold risk rule.
#[derive(Debug, Clone)]
pub struct RiskRule {
    /// Stable rule identifier.
    pub id: &'static str,
    /// Metric the rule watches.
    pub metric: MetricId,
    /// Comparison direction.
    pub comparison: RuleComparison,
    /// Fixed trigger threshold (raw value, not score).
    pub threshold: f64,
    /// Signal category.
    pub category: RiskSignalCategory,
    /// Severity when triggered.
    pub severity: RiskSeverity,
    /// Escalation tier (1-5).
    pub tier: u8,
    /// Signal title.
    pub title: &'static str,
}

impl RiskRule {
    fn triggers(&self, value: f64) -> bool {
        match self.comparison {
            RuleComparison::Above => value > self.threshold,
            RuleComparison::Below => value < self.threshold,
        }
    }
}

/// The default rule set.
#[must_use]
pub fn default_rules() -> Vec<RiskRule> {
    vec![
        RiskRule {
            id: "risk/critical-liquidity-buffer",
            metric: MetricId::EmergencyBuffer,
            comparison: RuleComparison::Below,
            threshold: 1.0,
            category: RiskSignalCategory::Liquidity,
            severity: RiskSeverity::Critical,
            tier: 5,
            title: "Liquidity buffer below one month",
        },
        RiskRule {
            id: "risk/thin-liquidity-buffer",
            metric: MetricId::EmergencyBuffer,
            comparison: RuleComparison::Below,
            threshold: 3.0,
            category: RiskSignalCategory::Liquidity,
            severity: RiskSeverity::High,
            tier: 4,
            title: "Liquidity buffer below three months",
        },
        RiskRule {
            id: "risk/high-lvr",
            metric: MetricId::Lvr,
            comparison: RuleComparison::Above,
            threshold: 0.80,
            category: RiskSignalCategory::Borrowing,
            severity: RiskSeverity::High,
            tier: 4,
            title: "Loan-to-value ratio above 80%",
        },
        RiskRule {
            id: "risk/stretched-dti",
            metric: MetricId::Dti,
            comparison: RuleComparison::Above,
            threshold: 6.0,
            category: RiskSignalCategory::Borrowing,
            severity: RiskSeverity::Medium,
            tier: 3,
            title: "Debt exceeds six times annual income",
        },
        RiskRule {
            id: "risk/heavy-debt-service",
            metric: MetricId::DebtServiceRatio,
            comparison: RuleComparison::Above,
            threshold: 0.40,
            category: RiskSignalCategory::Borrowing,
            severity: RiskSeverity::High,
            tier: 4,
            title: "Repayments consume over 40% of income",
        },
        RiskRule {
            id: "risk/negative-savings",
            metric: MetricId::SavingsRate,
            comparison: RuleComparison::Below,
            threshold: 0.0,
            category: RiskSignalCategory::Spending,
            severity: RiskSeverity::High,
            tier: 4,
            title: "Spending outpaces income",
        },
        RiskRule {
            id: "risk/spending-exceeds-income",
            metric: MetricId::ExpenseRatio,
            comparison: RuleComparison::Above,
            threshold: 1.0,
            category: RiskSignalCategory::Spending,
            severity: RiskSeverity::Critical,
            tier: 5,
            title: "Expenses exceed income",
        },
        RiskRule {
            id: "risk/concentrated-assets",
            metric: MetricId::AssetConcentration,
            comparison: RuleComparison::Above,
            threshold: 0.60,
            category: RiskSignalCategory::Concentration,
            severity: RiskSeverity::Medium,
            tier: 3,
            title: "Majority of wealth in a single asset",
        },
        RiskRule {
            id: "risk/property-heavy",
            metric: MetricId::PropertyConcentration,
            comparison: RuleComparison::Above,
            threshold: 0.75,
            category: RiskSignalCategory::Concentration,
            severity: RiskSeverity::Medium,
            tier: 3,
            title: "Portfolio dominated by property",
        },
        RiskRule {
            id: "risk/volatile-allocation",
            metric: MetricId::GrowthAllocation,
            comparison: RuleComparison::Above,
            threshold: 0.85,
            category: RiskSignalCategory::Market,
            severity: RiskSeverity::Medium,
            tier: 2,
            title: "Almost entirely growth assets",
        },
        RiskRule {
            id: "risk/retirement-shortfall",
            metric: MetricId::RetirementReadiness,
            comparison: RuleComparison::Below,
            threshold: 0.25,
            category: RiskSignalCategory::Longevity,
            severity: RiskSeverity::Medium,
            tier: 3,
            title: "Retirement funding well behind target",
        },
        RiskRule {
            id: "risk/short-longevity-runway",
            metric: MetricId::LongevityBuffer,
            comparison: RuleComparison::Below,
            threshold: 5.0,
            category: RiskSignalCategory::Longevity,
            severity: RiskSeverity::Low,
            tier: 2,
            title: "Less than five years of expenses covered",
        },
    ]
}

// ============================================================================
// Risk Modelling Stage
// ============================================================================

/// Risk modelling stage.
#[derive(Debug, Clone)]
pub struct RiskModel {
    metadata: StageMetadata,
}

impl Default for RiskModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskModel {
    /// Create the stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: StageMetadata::new("health/risk-signals", StageLayer::RiskModelling)
                .with_description("Hard-threshold risk signal detection"),
        }
    }

    /// Evaluate the rule set against the metric values.
    ///
    /// When several rules on the same (metric, category) pair trigger,
    /// only the most severe is emitted. Output is ordered most severe
    /// first, then by tier, then by rule id for determinism.
    #[must_use]
    pub fn evaluate(metrics: &AggregatedMetrics, rules: &[RiskRule]) -> Vec<RiskSignal> {
        let mut best: HashMap<(MetricId, RiskSignalCategory), RiskSignal> = HashMap::new();

        for rule in rules {
            let Some(metric) = metrics.metric(rule.metric) else {
                continue;
            };
            if !rule.triggers(metric.value) {
                continue;
            }

            let signal = RiskSignal {
                id: rule.id.to_string(),
                category: rule.category,
                severity: rule.severity,
                title: rule.title.to_string(),
                description: describe(rule, metric.value),
                evidence: RiskEvidence {
                    metric: rule.metric,
                    current_value: metric.value,
                    threshold: rule.threshold,
                },
                tier: rule.tier,
            };

            match best.entry((rule.metric, rule.category)) {
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    if signal.severity > e.get().severity {
                        e.insert(signal);
                    }
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(signal);
                }
            }
        }

        let mut signals: Vec<RiskSignal> = best.into_values().collect();
        signals.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(b.tier.cmp(&a.tier))
                .then(a.id.cmp(&b.id))
        });

        debug!(signal_count = signals.len(), "evaluated risk rules");
        signals
    }
}

impl EngineStage for RiskModel {
    fn metadata(&self) -> &StageMetadata {
        &self.metadata
    }
}

fn describe(rule: &RiskRule, value: f64) -> String {
    let relation = match rule.comparison {
        RuleComparison::Above => "above",
        RuleComparison::Below => "below",
    };
    format!(
        "{} is {:.2}, {} the {:.2} threshold",
        rule.metric, value, relation, rule.threshold
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BaseMetric, MetricGroup, NamedMetric};
    use finhealth_core::category::MetricCategory;
    use finhealth_core::scoring::ScoreDirection;

    fn metrics_of(entries: &[(MetricId, f64)]) -> AggregatedMetrics {
        AggregatedMetrics {
            groups: vec![MetricGroup {
                category: MetricCategory::Liquidity,
                metrics: entries
                    .iter()
                    .map(|&(id, value)| NamedMetric {
                        id,
                        metric: BaseMetric::evaluate(
                            value,
                            1.0,
                            ScoreDirection::HigherIsBetter,
                            id.base_confidence(),
                        ),
                    })
                    .collect(),
            }],
            data_confidence: 95.0,
        }
    }

    #[test]
    fn test_high_lvr_triggers() {
        let metrics = metrics_of(&[(MetricId::Lvr, 0.85)]);
        let signals = RiskModel::evaluate(&metrics, &default_rules());

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "risk/high-lvr");
        assert_eq!(signals[0].category, RiskSignalCategory::Borrowing);
        assert_eq!(signals[0].severity, RiskSeverity::High);
        assert_eq!(signals[0].evidence.current_value, 0.85);
        assert_eq!(signals[0].evidence.threshold, 0.80);
    }

    #[test]
    fn test_lvr_at_threshold_does_not_trigger() {
        // The rule is strictly greater-than; exactly 80% is benchmark
        // territory for the scorer, not a hard breach.
        let metrics = metrics_of(&[(MetricId::Lvr, 0.80)]);
        let signals = RiskModel::evaluate(&metrics, &default_rules());
        assert!(signals.is_empty());
    }

    #[test]
    fn test_most_severe_liquidity_rule_wins() {
        // A buffer of half a month breaches both liquidity rules; only
        // the critical one is emitted.
        let metrics = metrics_of(&[(MetricId::EmergencyBuffer, 0.5)]);
        let signals = RiskModel::evaluate(&metrics, &default_rules());

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "risk/critical-liquidity-buffer");
        assert_eq!(signals[0].severity, RiskSeverity::Critical);
        assert_eq!(signals[0].tier, 5);
    }

    #[test]
    fn test_buffer_between_thresholds_is_high_only() {
        let metrics = metrics_of(&[(MetricId::EmergencyBuffer, 2.0)]);
        let signals = RiskModel::evaluate(&metrics, &default_rules());

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "risk/thin-liquidity-buffer");
        assert_eq!(signals[0].severity, RiskSeverity::High);
    }

    #[test]
    fn test_signals_sorted_most_severe_first() {
        let metrics = metrics_of(&[
            (MetricId::ExpenseRatio, 1.2),
            (MetricId::AssetConcentration, 0.7),
            (MetricId::Lvr, 0.9),
        ]);
        let signals = RiskModel::evaluate(&metrics, &default_rules());

        assert_eq!(signals.len(), 3);
        assert_eq!(signals[0].severity, RiskSeverity::Critical);
        assert_eq!(signals[1].severity, RiskSeverity::High);
        assert_eq!(signals[2].severity, RiskSeverity::Medium);
    }

    #[test]
    fn test_healthy_metrics_no_signals() {
        let metrics = metrics_of(&[
            (MetricId::EmergencyBuffer, 8.0),
            (MetricId::Lvr, 0.5),
            (MetricId::SavingsRate, 0.25),
            (MetricId::ExpenseRatio, 0.7),
        ]);
        let signals = RiskModel::evaluate(&metrics, &default_rules());
        assert!(signals.is_empty());
    }

    #[test]
    fn test_default_rules_cover_all_categories() {
        let rules = default_rules();
        for category in [
            RiskSignalCategory::Spending,
            RiskSignalCategory::Borrowing,
            RiskSignalCategory::Liquidity,
            RiskSignalCategory::Concentration,
            RiskSignalCategory::Market,
            RiskSignalCategory::Longevity,
        ] {
            assert!(
                rules.iter().any(|r| r.category == category),
                "no rule for {category:?}"
            );
        }
    }

    #[test]
    fn test_rule_tiers_in_range() {
        for rule in default_rules() {
            assert!((1..=5).contains(&rule.tier), "tier out of range for {}", rule.id);
        }
    }
}
