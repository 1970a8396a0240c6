//! Report orchestration.
//!
//! `FinancialHealthEngine` wires the stages together into the single pure
//! entry point `generate`. The engine owns its validated configuration and
//! nothing else; every report is computed fresh from the input and the
//! injected context, so identical calls yield identical reports.

use chrono::{DateTime, Utc};
use finhealth_core::error::Result;
use finhealth_core::stage::EngineStage;
use tracing::info;

use crate::actions::ActionGenerator;
use crate::aggregate::AggregateEngine;
use crate::category::CategoryScorer;
use crate::config::EngineConfig;
use crate::evidence::EvidenceBuilder;
use crate::input::FinancialHealthInput;
use crate::metrics::MetricAggregator;
use crate::risk::{default_rules, RiskModel, RiskRule};
use crate::types::{FinancialHealthReport, ScorePoint};

/// Injected per-report context: the clock and the score history are owned
/// by collaborators, never read from the environment.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Generation time.
    pub now: DateTime<Utc>,
    /// Historical `(date, score)` series from the persistence layer.
    pub history: Vec<ScorePoint>,
}

impl ReportContext {
    /// Context with an empty history.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            history: Vec::new(),
        }
    }

    /// Attach a score history.
    #[must_use]
    pub fn with_history(mut self, history: Vec<ScorePoint>) -> Self {
        self.history = history;
        self
    }
}

/// The financial health engine.
#[derive(Debug)]
pub struct FinancialHealthEngine {
    config: EngineConfig,
    rules: Vec<RiskRule>,
    aggregator: MetricAggregator,
    scorer: CategoryScorer,
    composer: AggregateEngine,
    risk_model: RiskModel,
    action_generator: ActionGenerator,
    evidence_builder: EvidenceBuilder,
}

impl FinancialHealthEngine {
    /// Create an engine with the given configuration and the default risk
    /// rule set.
    ///
    /// # Errors
    /// `EngineError::Config` when weight tables or benchmarks are
    /// inconsistent.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rules: default_rules(),
            aggregator: MetricAggregator::new(),
            scorer: CategoryScorer::new(),
            composer: AggregateEngine::new(),
            risk_model: RiskModel::new(),
            action_generator: ActionGenerator::new(),
            evidence_builder: EvidenceBuilder::new(),
        })
    }

    /// Engine with the default configuration.
    ///
    /// # Errors
    /// Never fails in practice; the default configuration validates.
    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default())
    }

    /// Replace the risk rule set.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<RiskRule>) -> Self {
        self.rules = rules;
        self
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Metadata of every stage, in execution order.
    #[must_use]
    pub fn stages(&self) -> Vec<&finhealth_core::stage::StageMetadata> {
        vec![
            self.aggregator.metadata(),
            self.scorer.metadata(),
            self.composer.metadata(),
            self.risk_model.metadata(),
            self.action_generator.metadata(),
            self.evidence_builder.metadata(),
        ]
    }

    /// Generate a report.
    ///
    /// Pure: no clock reads, no I/O, no retained state. A precondition
    /// violation aborts before any partial result exists; absent optional
    /// sections only degrade confidence.
    ///
    /// # Errors
    /// Precondition violations from input validation.
    pub fn generate(
        &self,
        input: &FinancialHealthInput,
        ctx: &ReportContext,
    ) -> Result<FinancialHealthReport> {
        let metrics = MetricAggregator::aggregate(input, &self.config)?;
        let categories = CategoryScorer::score(&metrics, &self.config);
        let risk_signals = RiskModel::evaluate(&metrics, &self.rules);
        let improvement_actions =
            ActionGenerator::generate(&categories, input, &self.config);
        let (health_score, modifiers) = AggregateEngine::compose(
            categories,
            &metrics,
            input,
            &self.config,
            ctx.now,
            &ctx.history,
        );
        let evidence = EvidenceBuilder::build(
            input,
            &health_score.breakdown,
            health_score.confidence,
            &ctx.history,
            ctx.now,
        );

        info!(
            user_id = %input.user_id,
            score = health_score.score,
            confidence = health_score.confidence,
            signals = risk_signals.len(),
            actions = improvement_actions.len(),
            "generated financial health report"
        );

        Ok(FinancialHealthReport {
            user_id: input.user_id.clone(),
            generated_at: ctx.now,
            health_score,
            risk_signals,
            improvement_actions,
            evidence,
            metrics,
            modifiers,
        })
    }
}
