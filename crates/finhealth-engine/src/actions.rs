//! Improvement action generation.
//!
//! For every category below the concern threshold, synthesizes one
//! remediation action citing the weakest contributing metric, with an
//! estimated composite-score gain, a dollar impact from a per-category
//! heuristic over the snapshot, a difficulty classification, and a strict
//! impact-per-effort priority ranking.

use finhealth_core::category::MetricCategory;
use finhealth_core::stage::{EngineStage, StageLayer, StageMetadata};
use tracing::debug;

use crate::config::EngineConfig;
use crate::input::{FinancialHealthInput, PortfolioSnapshot};
use crate::types::{ActionDifficulty, ActionImpact, HealthCategory, ImprovementAction};

/// Category score an action aims to restore.
const TARGET_SCORE: f64 = 60.0;

// ============================================================================
// Action Generation Stage
// ============================================================================

/// Improvement action generation stage.
#[derive(Debug, Clone)]
pub struct ActionGenerator {
    metadata: StageMetadata,
}

impl Default for ActionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionGenerator {
    /// Create the stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: StageMetadata::new("health/improvement-actions", StageLayer::Advisory)
                .with_description("Ranked remediation for weak categories"),
        }
    }

    /// Generate ranked actions for every category below the concern
    /// threshold.
    #[must_use]
    pub fn generate(
        categories: &[HealthCategory],
        input: &FinancialHealthInput,
        config: &EngineConfig,
    ) -> Vec<ImprovementAction> {
        let mut actions: Vec<ImprovementAction> = categories
            .iter()
            .filter(|c| c.score < config.concern_threshold)
            .map(|c| Self::action_for(c, input))
            .collect();

        // Strict impact-per-effort ranking; canonical category order
        // breaks exact ties so priorities are deterministic.
        actions.sort_by(|a, b| {
            let a_rate = a.impact.score_improvement / a.difficulty.effort();
            let b_rate = b.impact.score_improvement / b.difficulty.effort();
            b_rate
                .partial_cmp(&a_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.category.ordinal().cmp(&b.category.ordinal()))
        });
        for (rank, action) in actions.iter_mut().enumerate() {
            action.priority = rank as u32 + 1;
        }

        debug!(action_count = actions.len(), "generated improvement actions");
        actions
    }

    fn action_for(category: &HealthCategory, input: &FinancialHealthInput) -> ImprovementAction {
        let gap = TARGET_SCORE - category.score;
        let score_improvement = ((gap * category.weight) * 10.0).round() / 10.0;
        let difficulty = if gap < 25.0 {
            ActionDifficulty::Easy
        } else if gap < 40.0 {
            ActionDifficulty::Moderate
        } else {
            ActionDifficulty::Hard
        };
        let timeframe = match difficulty {
            ActionDifficulty::Easy => "3-6 months",
            ActionDifficulty::Moderate => "6-12 months",
            ActionDifficulty::Hard => "12+ months",
        };

        let weakest = category
            .contributing_metrics
            .iter()
            .min_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|m| m.id.to_string())
            .unwrap_or_else(|| "overall position".to_string());

        let (title, advice) = template(category.category);
        let description = format!(
            "{advice} The weakest indicator here is {weakest} (category score {:.0}).",
            category.score
        );

        let strategy_recommendation_id = input.strategy_data.as_ref().and_then(|s| {
            s.recommendations
                .iter()
                .find(|r| r.category.eq_ignore_ascii_case(category.category.as_str()))
                .map(|r| r.id.clone())
        });

        ImprovementAction {
            id: format!("action/{}", category.category.as_str().to_lowercase()),
            title: title.to_string(),
            description,
            impact: ActionImpact {
                score_improvement,
                financial_impact: financial_impact(category.category, &input.portfolio),
                timeframe: timeframe.to_string(),
            },
            category: category.category,
            difficulty,
            priority: 0, // assigned after ranking
            strategy_recommendation_id,
        }
    }
}

impl EngineStage for ActionGenerator {
    fn metadata(&self) -> &StageMetadata {
        &self.metadata
    }
}

fn template(category: MetricCategory) -> (&'static str, &'static str) {
    match category {
        MetricCategory::Liquidity => (
            "Build your emergency buffer",
            "Redirect part of each pay cycle into at-call savings until the buffer covers six months of expenses.",
        ),
        MetricCategory::Cashflow => (
            "Rebalance income and spending",
            "Trim recurring discretionary spending and review fixed costs so income comfortably covers expenses.",
        ),
        MetricCategory::Debt => (
            "Reduce debt pressure",
            "Prioritize paying down the most expensive debt and consider refinancing to lower the repayment load.",
        ),
        MetricCategory::Investments => (
            "Strengthen your investment base",
            "Increase regular contributions and spread holdings across more asset types.",
        ),
        MetricCategory::Property => (
            "Improve your property position",
            "Build equity through additional repayments or review whether the property book matches your goals.",
        ),
        MetricCategory::Risk => (
            "Close protection gaps",
            "Review insurance cover and reduce reliance on any single asset or income source.",
        ),
        MetricCategory::Forecast => (
            "Get long-term plans on track",
            "Lift retirement contributions and set explicit savings goals to fund the years ahead.",
        ),
    }
}

/// Dollar impact heuristic per category.
fn financial_impact(category: MetricCategory, snap: &PortfolioSnapshot) -> f64 {
    let monthly_expenses: f64 = snap.expenses.iter().map(|e| e.monthly_amount).sum();
    let monthly_income: f64 = snap.income.iter().map(|i| i.monthly_amount).sum();
    let liquid: f64 = snap.accounts.iter().map(|a| a.balance).sum::<f64>().max(0.0);
    let property_value: f64 = snap.properties.iter().map(|p| p.value).sum();
    let property_loans: f64 = snap
        .loans
        .iter()
        .filter(|l| l.secured_by_property)
        .map(|l| l.principal)
        .sum();
    let consumer_debt: f64 = snap
        .loans
        .iter()
        .filter(|l| !l.secured_by_property)
        .map(|l| l.principal)
        .sum();
    let investment_value: f64 = snap.investments.iter().map(|i| i.value).sum();

    let impact = match category {
        // Dollars needed to reach a six month buffer
        MetricCategory::Liquidity => monthly_expenses * 6.0 - liquid,
        // Annual trim required to bring expenses to 80% of income
        MetricCategory::Cashflow => (monthly_expenses - monthly_income * 0.80) * 12.0,
        // Principal above the 80% LVR line, plus half the unsecured book
        MetricCategory::Debt => {
            (property_loans - property_value * 0.80).max(0.0) + consumer_debt * 0.5
        }
        // Gap to a 25% investment allocation
        MetricCategory::Investments => snap.total_assets * 0.25 - investment_value,
        // Equity shortfall against a 60% LVR position
        MetricCategory::Property => property_loans - property_value * 0.60,
        // Value of the uninsured property book
        MetricCategory::Risk => {
            property_value
                - snap
                    .properties
                    .iter()
                    .filter(|p| p.insured)
                    .map(|p| p.value)
                    .sum::<f64>()
        }
        // Indicative annual contribution toward long-term goals
        MetricCategory::Forecast => (monthly_income * 0.10) * 12.0,
    };

    (impact.max(0.0) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{StrategyData, StrategyRecommendation};
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

    #[test]
    fn test_no_actions_for_healthy_categories() {
        let categories = vec![
            category(MetricCategory::Liquidity, 75.0, 0.20),
            category(MetricCategory::Debt, 41.0, 0.20),
        ];
        let actions =
            ActionGenerator::generate(&categories, &empty_input(), &EngineConfig::default());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_one_action_per_weak_category() {
        let categories = vec![
            category(MetricCategory::Liquidity, 20.0, 0.20),
            category(MetricCategory::Debt, 35.0, 0.20),
            category(MetricCategory::Cashflow, 80.0, 0.20),
        ];
        let actions =
            ActionGenerator::generate(&categories, &empty_input(), &EngineConfig::default());

        assert_eq!(actions.len(), 2);
        assert!(actions.iter().any(|a| a.category == MetricCategory::Liquidity));
        assert!(actions.iter().any(|a| a.category == MetricCategory::Debt));
    }

    #[test]
    fn test_priorities_strictly_ordered() {
        let categories = vec![
            category(MetricCategory::Liquidity, 10.0, 0.20),
            category(MetricCategory::Debt, 30.0, 0.20),
            category(MetricCategory::Forecast, 25.0, 0.08),
        ];
        let actions =
            ActionGenerator::generate(&categories, &empty_input(), &EngineConfig::default());

        let priorities: Vec<u32> = actions.iter().map(|a| a.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3]);

        // Ranked by impact per effort, descending
        for pair in actions.windows(2) {
            let rate = |a: &ImprovementAction| a.impact.score_improvement / a.difficulty.effort();
            assert!(rate(&pair[0]) >= rate(&pair[1]));
        }
    }

    #[test]
    fn test_difficulty_follows_gap() {
        let easy = category(MetricCategory::Cashflow, 38.0, 0.20); // gap 22
        let moderate = category(MetricCategory::Debt, 25.0, 0.20); // gap 35
        let hard = category(MetricCategory::Liquidity, 10.0, 0.20); // gap 50

        let actions = ActionGenerator::generate(
            &[easy, moderate, hard],
            &empty_input(),
            &EngineConfig::default(),
        );
        let by_category = |cat| actions.iter().find(|a| a.category == cat).unwrap();

        assert_eq!(by_category(MetricCategory::Cashflow).difficulty, ActionDifficulty::Easy);
        assert_eq!(by_category(MetricCategory::Debt).difficulty, ActionDifficulty::Moderate);
        assert_eq!(by_category(MetricCategory::Liquidity).difficulty, ActionDifficulty::Hard);
        assert_eq!(
            by_category(MetricCategory::Liquidity).impact.timeframe,
            "12+ months"
        );
    }

    #[test]
    fn test_liquidity_financial_impact() {
        let mut input = empty_input();
        input.portfolio.expenses.push(crate::input::ExpenseRecord {
            id: "exp-1".to_string(),
            name: "Living".to_string(),
            monthly_amount: 5_000.0,
            discretionary: false,
        });
        input.portfolio.accounts.push(crate::input::AccountRecord {
            id: "acc-1".to_string(),
            name: "Savings".to_string(),
            kind: crate::input::AccountKind::Savings,
            balance: 10_000.0,
        });

        let categories = vec![category(MetricCategory::Liquidity, 20.0, 0.20)];
        let actions =
            ActionGenerator::generate(&categories, &input, &EngineConfig::default());

        // 6 months of $5k expenses minus $10k held = $20k gap
        assert_eq!(actions[0].impact.financial_impact, 20_000.0);
    }

    #[test]
    fn test_strategy_recommendation_referenced_when_present() {
        let mut input = empty_input();
        input.strategy_data = Some(StrategyData {
            recommendations: vec![StrategyRecommendation {
                id: "rec-42".to_string(),
                category: "Debt".to_string(),
                title: "Refinance".to_string(),
            }],
            conflicts: vec![],
            sbs_scores: vec![],
        });

        let categories = vec![category(MetricCategory::Debt, 25.0, 0.20)];
        let actions = ActionGenerator::generate(&categories, &input, &EngineConfig::default());

        assert_eq!(
            actions[0].strategy_recommendation_id.as_deref(),
            Some("rec-42")
        );
    }

    #[test]
    fn test_valid_action_without_strategy_data() {
        let categories = vec![category(MetricCategory::Debt, 25.0, 0.20)];
        let actions =
            ActionGenerator::generate(&categories, &empty_input(), &EngineConfig::default());

        assert_eq!(actions.len(), 1);
        assert!(actions[0].strategy_recommendation_id.is_none());
        assert!(!actions[0].title.is_empty());
        assert!(actions[0].impact.score_improvement > 0.0);
    }
}
