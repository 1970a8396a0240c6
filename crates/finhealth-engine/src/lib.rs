//! # FinHealth Engine
//!
//! The financial health scoring pipeline: reduces a normalized portfolio
//! snapshot into a single 0-100 score, discrete risk signals, and ranked
//! improvement actions, with an explicit confidence and explainability
//! contract.
//!
//! ## Stages
//!
//! ### Pipeline (Layers 1-3)
//! - `MetricAggregator` - snapshot to 28 benchmarked base metrics
//! - `CategoryScorer` - metric groups to seven weighted category scores
//! - `AggregateEngine` - categories to a penalized composite score, with
//!   report confidence and trend classification
//!
//! ### Parallel detectors and advisory
//! - `RiskModel` - hard-threshold risk signals, independent of category
//!   averages
//! - `ActionGenerator` - ranked remediation for weak categories
//! - `EvidenceBuilder` - explainability metadata
//!
//! The engine is a pure function of its input and an injected context
//! (clock and score history): no I/O, no retained state, reproducible to
//! the byte.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actions;
pub mod aggregate;
pub mod category;
pub mod config;
pub mod engine;
pub mod evidence;
pub mod input;
pub mod metrics;
pub mod risk;
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::actions::ActionGenerator;
    pub use crate::aggregate::AggregateEngine;
    pub use crate::category::CategoryScorer;
    pub use crate::config::{Benchmarks, CategoryDefinition, EngineConfig, PenaltyCaps};
    pub use crate::engine::{FinancialHealthEngine, ReportContext};
    pub use crate::evidence::EvidenceBuilder;
    pub use crate::input::{FinancialHealthInput, PortfolioSnapshot};
    pub use crate::metrics::MetricAggregator;
    pub use crate::risk::{default_rules, RiskModel, RiskRule};
    pub use crate::types::*;
}

// Re-export main stages
pub use actions::ActionGenerator;
pub use aggregate::AggregateEngine;
pub use category::CategoryScorer;
pub use engine::{FinancialHealthEngine, ReportContext};
pub use evidence::EvidenceBuilder;
pub use metrics::MetricAggregator;
pub use risk::RiskModel;

// Re-export key types
pub use config::EngineConfig;
pub use input::FinancialHealthInput;
pub use types::{
    AggregatedMetrics, BaseMetric, FinancialHealthReport, FinancialHealthScore, HealthCategory,
    ImprovementAction, MetricId, RiskSignal, ScoreModifiers, Trend,
};

use finhealth_core::error::Result;
use finhealth_core::registry::StageRegistry;
use finhealth_core::stage::EngineStage;

/// Register every engine stage with a registry.
///
/// # Errors
/// Propagates duplicate-id registration errors.
pub fn register_all(registry: &StageRegistry) -> Result<()> {
    tracing::info!("registering financial health engine stages");

    registry.register(MetricAggregator::new().metadata().clone())?;
    registry.register(CategoryScorer::new().metadata().clone())?;
    registry.register(AggregateEngine::new().metadata().clone())?;
    registry.register(RiskModel::new().metadata().clone())?;
    registry.register(ActionGenerator::new().metadata().clone())?;
    registry.register(EvidenceBuilder::new().metadata().clone())?;

    tracing::info!("registered 6 engine stages");
    Ok(())
}
