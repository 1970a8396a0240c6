//! Layer 3: composite aggregation.
//!
//! Combines the seven category scores into the final health score, applies
//! the five bounded penalty modifiers, derives the report confidence, and
//! classifies the trend over a caller-supplied score history. Nothing here
//! reads the clock: the generation time and history window anchor are
//! injected by the caller.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use finhealth_core::category::MetricCategory;
use finhealth_core::stage::{EngineStage, StageLayer, StageMetadata};
use tracing::debug;

use crate::config::EngineConfig;
use crate::input::{FinancialHealthInput, InsightSeverity};
use crate::types::{
    AggregatedMetrics, FinancialHealthScore, HealthCategory, ScoreModifiers, ScorePoint, Trend,
};

/// Deduction per absent optional context section.
const CONTEXT_DEDUCTION: f64 = 2.0;

// ============================================================================
// Composite Aggregation Stage
// ============================================================================

/// Composite aggregation stage.
#[derive(Debug, Clone)]
pub struct AggregateEngine {
    metadata: StageMetadata,
}

impl Default for AggregateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateEngine {
    /// Create the stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: StageMetadata::new("health/composite-aggregation", StageLayer::Composition)
                .with_description("Category scores to penalized composite score"),
        }
    }

    /// Linear weighted composition of the category scores.
    #[must_use]
    pub fn base_score(categories: &[HealthCategory]) -> f64 {
        categories.iter().map(HealthCategory::weighted_contribution).sum()
    }

    /// Compute the five penalty modifiers, each clamped to its own cap.
    #[must_use]
    pub fn modifiers(
        metrics: &AggregatedMetrics,
        categories: &[HealthCategory],
        input: &FinancialHealthInput,
        config: &EngineConfig,
    ) -> ScoreModifiers {
        let caps = &config.penalty_caps;

        let data_confidence_penalty =
            ((100.0 - metrics.data_confidence) / 10.0).clamp(0.0, caps.data_confidence);

        let insight_severity_penalty = input
            .insights
            .iter()
            .map(|i| match i.severity {
                InsightSeverity::Critical => 2.0,
                InsightSeverity::High => 1.0,
                InsightSeverity::Warning | InsightSeverity::Info => 0.0,
            })
            .sum::<f64>()
            .clamp(0.0, caps.insight_severity);

        let forecast_risk_penalty = categories
            .iter()
            .find(|c| c.category == MetricCategory::Forecast)
            .map_or(0.0, |forecast| {
                if forecast.score < config.concern_threshold {
                    (config.concern_threshold - forecast.score) / 10.0
                } else {
                    0.0
                }
            })
            .clamp(0.0, caps.forecast_risk);

        let linkage_penalty = input.linkage_health.as_ref().map_or(0.0, |linkage| {
            let mut penalty =
                0.5 * linkage.orphans.len() as f64 + 0.5 * linkage.missing_links.len() as f64;
            if linkage.consistency_score < 50.0 {
                penalty += 2.0;
            }
            penalty
        })
        .clamp(0.0, caps.linkage);

        let strategy_conflict_penalty = input
            .strategy_data
            .as_ref()
            .map_or(0.0, |s| 1.5 * s.conflicts.len() as f64)
            .clamp(0.0, caps.strategy_conflict);

        let total_penalty = data_confidence_penalty
            + insight_severity_penalty
            + forecast_risk_penalty
            + linkage_penalty
            + strategy_conflict_penalty;

        ScoreModifiers {
            data_confidence_penalty,
            insight_severity_penalty,
            forecast_risk_penalty,
            linkage_penalty,
            strategy_conflict_penalty,
            total_penalty,
        }
    }

    /// Report-level confidence.
    ///
    /// Multiplicative combination of the data confidence and the weakest
    /// per-metric confidence, minus a small deduction per absent optional
    /// context section. The product form guarantees the report never claims
    /// more confidence than its weakest evidential input, while every
    /// absent section strictly lowers the result.
    #[must_use]
    pub fn confidence(metrics: &AggregatedMetrics, input: &FinancialHealthInput) -> f64 {
        let evidential = (metrics.data_confidence * metrics.min_confidence() / 100.0).round();

        let mut absent = 0.0;
        if input.insights.is_empty() {
            absent += 1.0;
        }
        if input.strategy_data.is_none() {
            absent += 1.0;
        }
        if input.user_goals.is_none() {
            absent += 1.0;
        }

        (evidential - absent * CONTEXT_DEDUCTION).clamp(0.0, 100.0)
    }

    /// Classify the score trend over the requested window.
    ///
    /// Change is measured from the earliest to the latest in-window point;
    /// fewer than two points, or a non-positive earliest score, classify
    /// as Stable with zero change.
    #[must_use]
    pub fn classify_trend(
        history: &[ScorePoint],
        now: NaiveDate,
        window_days: u32,
        threshold_percent: f64,
    ) -> (Trend, f64) {
        let window_start = now - Duration::days(i64::from(window_days));
        let in_window: Vec<&ScorePoint> = history
            .iter()
            .filter(|p| p.date >= window_start && p.date <= now)
            .collect();

        let Some(earliest) = in_window.iter().min_by_key(|p| p.date) else {
            return (Trend::Stable, 0.0);
        };
        let Some(latest) = in_window.iter().max_by_key(|p| p.date) else {
            return (Trend::Stable, 0.0);
        };
        if in_window.len() < 2 || earliest.score <= 0.0 {
            return (Trend::Stable, 0.0);
        }

        let change_percent = (latest.score - earliest.score) / earliest.score * 100.0;
        let trend = if change_percent > threshold_percent {
            Trend::Improving
        } else if change_percent < -threshold_percent {
            Trend::Declining
        } else {
            Trend::Stable
        };
        (trend, change_percent)
    }

    /// Assemble the composite health score.
    #[must_use]
    pub fn compose(
        categories: Vec<HealthCategory>,
        metrics: &AggregatedMetrics,
        input: &FinancialHealthInput,
        config: &EngineConfig,
        now: DateTime<Utc>,
        history: &[ScorePoint],
    ) -> (FinancialHealthScore, ScoreModifiers) {
        let base = Self::base_score(&categories);
        let modifiers = Self::modifiers(metrics, &categories, input, config);
        let final_score = (base - modifiers.total_penalty).round().clamp(0.0, 100.0);
        let confidence = Self::confidence(metrics, input);
        let (trend, change_percent) = Self::classify_trend(
            history,
            now.date_naive(),
            config.trend_window_days,
            config.trend_threshold_percent,
        );

        debug!(
            user_id = %input.user_id,
            base_score = base,
            total_penalty = modifiers.total_penalty,
            final_score,
            confidence,
            "composed health score"
        );

        (
            FinancialHealthScore {
                score: final_score,
                confidence,
                breakdown: categories,
                trend,
                change_percent,
                generated_at: now,
            },
            modifiers,
        )
    }
}

impl EngineStage for AggregateEngine {
    fn metadata(&self) -> &StageMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Insight, LinkageHealth, PortfolioSnapshot, StrategyConflict, StrategyData};
    use finhealth_core::scoring::RiskBand;

    fn category(cat: MetricCategory, score: f64, weight: f64) -> HealthCategory {
        HealthCategory {
            category: cat,
            score,
            weight,
            contributing_metrics: vec![],
            band: RiskBand::from(score),
        }
    }

    fn empty_input() -> FinancialHealthInput {
        FinancialHealthInput {
            user_id: "user-1".to_string(),
            portfolio: PortfolioSnapshot {
                net_worth: 0.0,
                total_assets: 0.0,
                total_liabilities: 0.0,
                properties: vec![],
                loans: vec![],
                accounts: vec![],
                investments: vec![],
                income: vec![],
                expenses: vec![],
            },
            insights: vec![],
            strategy_data: None,
            linkage_health: None,
            user_goals: None,
        }
    }

    fn metrics_with_confidence(data_confidence: f64) -> AggregatedMetrics {
        use crate::types::{BaseMetric, MetricGroup, MetricId, NamedMetric};
        use finhealth_core::scoring::ScoreDirection;
        AggregatedMetrics {
            groups: vec![MetricGroup {
                category: MetricCategory::Liquidity,
                metrics: vec![
                    NamedMetric {
                        id: MetricId::EmergencyBuffer,
                        metric: BaseMetric::evaluate(
                            6.0,
                            6.0,
                            ScoreDirection::HigherIsBetter,
                            90.0,
                        ),
                    },
                    NamedMetric {
                        id: MetricId::InsuranceGap,
                        metric: BaseMetric::evaluate(
                            0.2,
                            0.5,
                            ScoreDirection::LowerIsBetter,
                            40.0,
                        ),
                    },
                ],
            }],
            data_confidence,
        }
    }

    #[test]
    fn test_scenario_c_linear_composition() {
        // Two categories at 90 and 10 (weight 0.20 each) and five at 50
        // (weight 0.12 each) compose to exactly 50 before penalties.
        let mut categories = vec![
            category(MetricCategory::Liquidity, 90.0, 0.20),
            category(MetricCategory::Cashflow, 10.0, 0.20),
        ];
        for cat in [
            MetricCategory::Debt,
            MetricCategory::Investments,
            MetricCategory::Property,
            MetricCategory::Risk,
            MetricCategory::Forecast,
        ] {
            categories.push(category(cat, 50.0, 0.12));
        }

        let base = AggregateEngine::base_score(&categories);
        assert!((base - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_modifier_exceeds_its_cap() {
        let mut input = empty_input();
        // Pile on enough context to saturate every rule
        input.insights = (0..20)
            .map(|i| Insight {
                id: format!("insight-{i}"),
                severity: InsightSeverity::Critical,
                category: "debt".to_string(),
                title: "Critical".to_string(),
            })
            .collect();
        input.strategy_data = Some(StrategyData {
            recommendations: vec![],
            conflicts: (0..10)
                .map(|i| StrategyConflict {
                    id: format!("conflict-{i}"),
                    description: "clash".to_string(),
                })
                .collect(),
            sbs_scores: vec![],
        });
        input.linkage_health = Some(LinkageHealth {
            orphans: (0..30).map(|i| format!("orphan-{i}")).collect(),
            missing_links: (0..30).map(|i| format!("link-{i}")).collect(),
            consistency_score: 10.0,
        });

        let metrics = metrics_with_confidence(0.0);
        let categories = vec![category(MetricCategory::Forecast, 0.0, 1.0)];
        let config = EngineConfig::default();
        let m = AggregateEngine::modifiers(&metrics, &categories, &input, &config);

        assert!(m.data_confidence_penalty <= config.penalty_caps.data_confidence);
        assert!(m.insight_severity_penalty <= config.penalty_caps.insight_severity);
        assert!(m.forecast_risk_penalty <= config.penalty_caps.forecast_risk);
        assert!(m.linkage_penalty <= config.penalty_caps.linkage);
        assert!(m.strategy_conflict_penalty <= config.penalty_caps.strategy_conflict);
        assert!(
            (m.total_penalty
                - (m.data_confidence_penalty
                    + m.insight_severity_penalty
                    + m.forecast_risk_penalty
                    + m.linkage_penalty
                    + m.strategy_conflict_penalty))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_penalties_never_drive_score_below_zero() {
        let categories = vec![category(MetricCategory::Forecast, 2.0, 1.0)];
        let metrics = metrics_with_confidence(0.0);
        let input = empty_input();
        let config = EngineConfig::default();

        let (score, _) = AggregateEngine::compose(categories, &metrics, &input, &config, now(), &[]);
        assert!(score.score >= 0.0);
    }

    #[test]
    fn test_confidence_capped_by_weakest_input() {
        let metrics = metrics_with_confidence(100.0);
        let input = empty_input();
        let confidence = AggregateEngine::confidence(&metrics, &input);
        // min metric confidence is 40, so even perfect data coverage
        // cannot raise the report above it
        assert!(confidence <= 40.0);
    }

    #[test]
    fn test_absent_sections_strictly_lower_confidence() {
        let metrics = metrics_with_confidence(95.0);

        let mut full = empty_input();
        full.insights = vec![Insight {
            id: "i1".to_string(),
            severity: InsightSeverity::Info,
            category: "cashflow".to_string(),
            title: "FYI".to_string(),
        }];
        full.strategy_data = Some(StrategyData::default());
        full.user_goals = Some(crate::input::UserGoals::default());

        let full_confidence = AggregateEngine::confidence(&metrics, &full);

        for strip in 0..3 {
            let mut partial = full.clone();
            match strip {
                0 => partial.insights.clear(),
                1 => partial.strategy_data = None,
                _ => partial.user_goals = None,
            }
            let partial_confidence = AggregateEngine::confidence(&metrics, &partial);
            assert!(
                partial_confidence < full_confidence,
                "stripping section {strip} did not lower confidence"
            );
        }
    }

    #[test]
    fn test_trend_classification() {
        let d = |s: &str| s.parse::<NaiveDate>().unwrap();
        let now = d("2025-06-30");

        let improving = vec![
            ScorePoint { date: d("2025-05-01"), score: 60.0 },
            ScorePoint { date: d("2025-06-01"), score: 66.0 },
        ];
        let (trend, change) = AggregateEngine::classify_trend(&improving, now, 90, 2.0);
        assert_eq!(trend, Trend::Improving);
        assert!((change - 10.0).abs() < 1e-9);

        let declining = vec![
            ScorePoint { date: d("2025-05-01"), score: 60.0 },
            ScorePoint { date: d("2025-06-01"), score: 54.0 },
        ];
        let (trend, _) = AggregateEngine::classify_trend(&declining, now, 90, 2.0);
        assert_eq!(trend, Trend::Declining);

        let stable = vec![
            ScorePoint { date: d("2025-05-01"), score: 60.0 },
            ScorePoint { date: d("2025-06-01"), score: 61.0 },
        ];
        let (trend, _) = AggregateEngine::classify_trend(&stable, now, 90, 2.0);
        assert_eq!(trend, Trend::Stable);
    }

    #[test]
    fn test_trend_ignores_points_outside_window() {
        let d = |s: &str| s.parse::<NaiveDate>().unwrap();
        let now = d("2025-06-30");

        // The old crash sits outside the 90 day window, so only the two
        // recent points count
        let history = vec![
            ScorePoint { date: d("2024-01-01"), score: 20.0 },
            ScorePoint { date: d("2025-05-01"), score: 60.0 },
            ScorePoint { date: d("2025-06-01"), score: 61.0 },
        ];
        let (trend, change) = AggregateEngine::classify_trend(&history, now, 90, 2.0);
        assert_eq!(trend, Trend::Stable);
        assert!(change.abs() < 2.0);
    }

    #[test]
    fn test_trend_guards() {
        let d = |s: &str| s.parse::<NaiveDate>().unwrap();
        let now = d("2025-06-30");

        // Empty history
        assert_eq!(
            AggregateEngine::classify_trend(&[], now, 90, 2.0),
            (Trend::Stable, 0.0)
        );

        // Single point
        let one = vec![ScorePoint { date: d("2025-06-01"), score: 50.0 }];
        assert_eq!(
            AggregateEngine::classify_trend(&one, now, 90, 2.0),
            (Trend::Stable, 0.0)
        );

        // Zero earliest score cannot anchor a percentage change
        let zero_base = vec![
            ScorePoint { date: d("2025-05-01"), score: 0.0 },
            ScorePoint { date: d("2025-06-01"), score: 50.0 },
        ];
        assert_eq!(
            AggregateEngine::classify_trend(&zero_base, now, 90, 2.0),
            (Trend::Stable, 0.0)
        );
    }

    /// Fixed timestamp so tests stay deterministic.
    fn now() -> DateTime<Utc> {
        "2025-06-30T00:00:00Z".parse().unwrap()
    }
}
