//! Evidence pack assembly.
//!
//! Collects the explainability metadata that travels with a report: which
//! input sections were actually present, the confidence and its level, the
//! insights that fed the penalty rules, the trend window, and a
//! category-to-band risk map.

use chrono::{DateTime, Utc};
use finhealth_core::stage::{EngineStage, StageLayer, StageMetadata};

use crate::input::FinancialHealthInput;
use crate::types::{ConfidenceLevel, EvidencePack, HealthCategory, RiskMapEntry, ScorePoint};

/// Evidence pack assembly stage.
#[derive(Debug, Clone)]
pub struct EvidenceBuilder {
    metadata: StageMetadata,
}

impl Default for EvidenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceBuilder {
    /// Create the stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: StageMetadata::new("health/evidence-pack", StageLayer::Evidence)
                .with_description("Explainability metadata assembly"),
        }
    }

    /// Assemble the evidence pack.
    #[must_use]
    pub fn build(
        input: &FinancialHealthInput,
        categories: &[HealthCategory],
        confidence: f64,
        history: &[ScorePoint],
        now: DateTime<Utc>,
    ) -> EvidencePack {
        let snap = &input.portfolio;
        let mut inputs_used = vec!["portfolio_snapshot".to_string()];
        for (name, present) in [
            ("accounts", !snap.accounts.is_empty()),
            ("income", !snap.income.is_empty()),
            ("expenses", !snap.expenses.is_empty()),
            ("loans", !snap.loans.is_empty()),
            ("properties", !snap.properties.is_empty()),
            ("investments", !snap.investments.is_empty()),
            ("insights", !input.insights.is_empty()),
            ("strategy_data", input.strategy_data.is_some()),
            ("linkage_health", input.linkage_health.is_some()),
            ("user_goals", input.user_goals.is_some()),
        ] {
            if present {
                inputs_used.push(name.to_string());
            }
        }

        EvidencePack {
            inputs_used,
            confidence,
            confidence_level: ConfidenceLevel::from(confidence),
            insights_linked: input.insights.iter().map(|i| i.id.clone()).collect(),
            historical_trend: history.to_vec(),
            risk_map: categories
                .iter()
                .map(|c| RiskMapEntry {
                    category: c.category,
                    band: c.band,
                    score: c.score,
                })
                .collect(),
            last_updated: now,
        }
    }
}

impl EngineStage for EvidenceBuilder {
    fn metadata(&self) -> &StageMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{AccountKind, AccountRecord, Insight, InsightSeverity, PortfolioSnapshot};
    use finhealth_core::category::MetricCategory;
    use finhealth_core::scoring::RiskBand;

    fn input() -> FinancialHealthInput {
        FinancialHealthInput {
            user_id: "user-1".to_string(),
            portfolio: PortfolioSnapshot {
                net_worth: 1_000.0,
                total_assets: 1_000.0,
                total_liabilities: 0.0,
                properties: vec![],
                loans: vec![],
                accounts: vec![AccountRecord {
                    id: "acc-1".to_string(),
                    name: "Savings".to_string(),
                    kind: AccountKind::Savings,
                    balance: 1_000.0,
                }],
                investments: vec![],
                income: vec![],
                expenses: vec![],
            },
            insights: vec![Insight {
                id: "insight-7".to_string(),
                severity: InsightSeverity::Warning,
                category: "cashflow".to_string(),
                title: "Subscriptions creeping up".to_string(),
            }],
            strategy_data: None,
            linkage_health: None,
            user_goals: None,
        }
    }

    fn now() -> DateTime<Utc> {
        "2025-06-30T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_inputs_used_reflect_presence() {
        let pack = EvidenceBuilder::build(&input(), &[], 38.0, &[], now());

        assert!(pack.inputs_used.contains(&"portfolio_snapshot".to_string()));
        assert!(pack.inputs_used.contains(&"accounts".to_string()));
        assert!(pack.inputs_used.contains(&"insights".to_string()));
        assert!(!pack.inputs_used.contains(&"strategy_data".to_string()));
        assert!(!pack.inputs_used.contains(&"loans".to_string()));
    }

    #[test]
    fn test_insights_linked_by_id() {
        let pack = EvidenceBuilder::build(&input(), &[], 38.0, &[], now());
        assert_eq!(pack.insights_linked, vec!["insight-7".to_string()]);
    }

    #[test]
    fn test_risk_map_mirrors_categories() {
        let categories = vec![HealthCategory {
            category: MetricCategory::Liquidity,
            score: 85.0,
            weight: 0.20,
            contributing_metrics: vec![],
            band: RiskBand::Excellent,
        }];
        let pack = EvidenceBuilder::build(&input(), &categories, 38.0, &[], now());

        assert_eq!(pack.risk_map.len(), 1);
        assert_eq!(pack.risk_map[0].category, MetricCategory::Liquidity);
        assert_eq!(pack.risk_map[0].band, RiskBand::Excellent);
    }

    #[test]
    fn test_confidence_level_derived() {
        let pack = EvidenceBuilder::build(&input(), &[], 38.0, &[], now());
        assert_eq!(pack.confidence_level, ConfidenceLevel::Low);
        assert_eq!(pack.last_updated, now());
    }
}
