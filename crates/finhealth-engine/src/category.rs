//! Layer 2: category scoring.
//!
//! Reduces each metric group to one weighted category score. Weights apply
//! to metric scores, never raw values, and each intra-category table sums
//! to 1.0 (validated at engine construction). Bands come from the same
//! shared cut-point function Layer 1 used, so a category can never carry a
//! band inconsistent with its own metrics.

use finhealth_core::scoring::RiskBand;
use finhealth_core::stage::{EngineStage, StageLayer, StageMetadata};

use crate::config::EngineConfig;
use crate::types::{AggregatedMetrics, ContributingMetric, HealthCategory};

// ============================================================================
// Category Scoring Stage
// ============================================================================

/// Category scoring stage.
#[derive(Debug, Clone)]
pub struct CategoryScorer {
    metadata: StageMetadata,
}

impl Default for CategoryScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryScorer {
    /// Create the stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: StageMetadata::new("health/category-scoring", StageLayer::Scoring)
                .with_description("Metric groups to weighted category scores"),
        }
    }

    /// Score all seven categories in canonical order.
    ///
    /// Trusts the structural completeness of Layer 1's output: a metric
    /// named by a category definition but absent from the group simply
    /// contributes nothing, which cannot happen for an `AggregatedMetrics`
    /// built from the same config.
    #[must_use]
    pub fn score(metrics: &AggregatedMetrics, config: &EngineConfig) -> Vec<HealthCategory> {
        config
            .categories
            .iter()
            .map(|def| {
                let group = metrics.group(def.category);
                let mut weighted_sum = 0.0;
                let mut contributions = Vec::with_capacity(def.metrics.len());

                for mw in &def.metrics {
                    if let Some(metric) = group.and_then(|g| g.metric(mw.id)) {
                        weighted_sum += metric.score * mw.weight;
                        contributions.push(ContributingMetric {
                            id: mw.id,
                            value: metric.value,
                            weight: mw.weight,
                            score: metric.score,
                            benchmark: metric.benchmark,
                        });
                    }
                }

                let score = weighted_sum.round().clamp(0.0, 100.0);
                HealthCategory {
                    category: def.category,
                    score,
                    weight: def.weight,
                    contributing_metrics: contributions,
                    band: RiskBand::from(score),
                }
            })
            .collect()
    }

    /// The weakest category (lowest score, canonical order breaks ties).
    #[must_use]
    pub fn weakest(categories: &[HealthCategory]) -> Option<&HealthCategory> {
        categories.iter().min_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.category.ordinal().cmp(&b.category.ordinal()))
        })
    }

    /// The strongest category (highest score, canonical order breaks ties).
    #[must_use]
    pub fn strongest(categories: &[HealthCategory]) -> Option<&HealthCategory> {
        categories.iter().max_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                // Prefer the earlier category on ties: max_by keeps the
                // later of equal elements, so invert the ordinal order.
                .then(b.category.ordinal().cmp(&a.category.ordinal()))
        })
    }

    /// Categories scoring below a threshold, in canonical order.
    #[must_use]
    pub fn below_threshold(
        categories: &[HealthCategory],
        threshold: f64,
    ) -> Vec<&HealthCategory> {
        categories.iter().filter(|c| c.score < threshold).collect()
    }
}

impl EngineStage for CategoryScorer {
    fn metadata(&self) -> &StageMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BaseMetric, MetricGroup, MetricId, NamedMetric};
    use finhealth_core::category::MetricCategory;
    use finhealth_core::scoring::ScoreDirection;

    /// Build an `AggregatedMetrics` whose Liquidity metrics carry fixed
    /// scores by choosing values against a benchmark of 100.
    fn liquidity_metrics(scores: [f64; 3]) -> AggregatedMetrics {
        let ids = [
            MetricId::EmergencyBuffer,
            MetricId::LiquidRatio,
            MetricId::SavingsRate,
        ];
        let metrics = ids
            .iter()
            .zip(scores.iter())
            .map(|(&id, &score)| NamedMetric {
                id,
                metric: BaseMetric::evaluate(
                    score,
                    100.0,
                    ScoreDirection::HigherIsBetter,
                    id.base_confidence(),
                ),
            })
            .collect();

        AggregatedMetrics {
            groups: vec![MetricGroup {
                category: MetricCategory::Liquidity,
                metrics,
            }],
            data_confidence: 95.0,
        }
    }

    #[test]
    fn test_weighted_category_score() {
        // Liquidity = 0.40*80 + 0.40*60 + 0.20*40 = 64
        let metrics = liquidity_metrics([80.0, 60.0, 40.0]);
        let categories = CategoryScorer::score(&metrics, &EngineConfig::default());

        let liquidity = categories
            .iter()
            .find(|c| c.category == MetricCategory::Liquidity)
            .unwrap();
        assert_eq!(liquidity.score, 64.0);
        assert_eq!(liquidity.band, RiskBand::Good);
        assert_eq!(liquidity.contributing_metrics.len(), 3);
    }

    #[test]
    fn test_scores_weight_scores_not_values() {
        // Same raw values scaled 10x against the same benchmark saturate
        // identically: the category weights normalized scores.
        let a = liquidity_metrics([100.0, 100.0, 100.0]);
        let b = liquidity_metrics([1000.0, 1000.0, 1000.0]);
        let score_a = CategoryScorer::score(&a, &EngineConfig::default())[0].score;
        let score_b = CategoryScorer::score(&b, &EngineConfig::default())[0].score;
        assert_eq!(score_a, score_b);
    }

    #[test]
    fn test_all_seven_categories_in_order() {
        let metrics = liquidity_metrics([50.0, 50.0, 50.0]);
        let categories = CategoryScorer::score(&metrics, &EngineConfig::default());
        assert_eq!(categories.len(), 7);
        for (cat, expected) in categories.iter().zip(MetricCategory::ALL) {
            assert_eq!(cat.category, *expected);
        }
    }

    #[test]
    fn test_band_consistent_with_layer1_for_same_score() {
        // Whatever score a category lands on, its band equals the band a
        // base metric with that score would get.
        for scores in [[5.0, 5.0, 5.0], [45.0, 45.0, 45.0], [85.0, 85.0, 85.0]] {
            let metrics = liquidity_metrics(scores);
            let categories = CategoryScorer::score(&metrics, &EngineConfig::default());
            for cat in &categories {
                assert_eq!(cat.band, RiskBand::from(cat.score));
            }
        }
    }

    fn fixed_categories(scores: [f64; 3]) -> Vec<HealthCategory> {
        [
            MetricCategory::Liquidity,
            MetricCategory::Cashflow,
            MetricCategory::Debt,
        ]
        .iter()
        .zip(scores.iter())
        .map(|(&category, &score)| HealthCategory {
            category,
            score,
            weight: 1.0 / 3.0,
            contributing_metrics: vec![],
            band: RiskBand::from(score),
        })
        .collect()
    }

    #[test]
    fn test_weakest_strongest() {
        let categories = fixed_categories([70.0, 30.0, 90.0]);
        assert_eq!(
            CategoryScorer::weakest(&categories).unwrap().category,
            MetricCategory::Cashflow
        );
        assert_eq!(
            CategoryScorer::strongest(&categories).unwrap().category,
            MetricCategory::Debt
        );
    }

    #[test]
    fn test_ties_break_by_canonical_order() {
        let categories = fixed_categories([50.0, 50.0, 50.0]);
        assert_eq!(
            CategoryScorer::weakest(&categories).unwrap().category,
            MetricCategory::Liquidity
        );
        assert_eq!(
            CategoryScorer::strongest(&categories).unwrap().category,
            MetricCategory::Liquidity
        );
    }

    #[test]
    fn test_below_threshold() {
        let categories = fixed_categories([70.0, 30.0, 39.9]);
        let weak = CategoryScorer::below_threshold(&categories, 40.0);
        assert_eq!(weak.len(), 2);
        assert_eq!(weak[0].category, MetricCategory::Cashflow);
        assert_eq!(weak[1].category, MetricCategory::Debt);
    }
}
