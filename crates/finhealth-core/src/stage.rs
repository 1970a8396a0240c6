//! Stage metadata and the engine stage trait.
//!
//! Every pipeline component (metric aggregation, category scoring,
//! composite aggregation, risk modelling, action generation, evidence
//! assembly) describes itself with a `StageMetadata` and implements
//! `EngineStage`, which is how the registry and report tooling discover
//! what ran.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the pipeline a stage belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageLayer {
    /// Layer 1: snapshot to benchmarked base metrics.
    Metrics,
    /// Layer 2: metric groups to category scores.
    Scoring,
    /// Layer 3: category scores to the composite score.
    Composition,
    /// Parallel hard-threshold risk signal detection.
    RiskModelling,
    /// Improvement action synthesis.
    Advisory,
    /// Explainability metadata assembly.
    Evidence,
}

impl StageLayer {
    /// Returns the layer name as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StageLayer::Metrics => "metrics",
            StageLayer::Scoring => "scoring",
            StageLayer::Composition => "composition",
            StageLayer::RiskModelling => "risk-modelling",
            StageLayer::Advisory => "advisory",
            StageLayer::Evidence => "evidence",
        }
    }

    /// Returns true for the three score-producing pipeline layers.
    #[must_use]
    pub const fn is_scoring_pipeline(&self) -> bool {
        matches!(
            self,
            StageLayer::Metrics | StageLayer::Scoring | StageLayer::Composition
        )
    }
}

impl fmt::Display for StageLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata describing one engine stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageMetadata {
    /// Unique stage identifier (e.g. "health/metric-aggregation").
    pub id: String,

    /// Pipeline layer this stage belongs to.
    pub layer: StageLayer,

    /// Human-readable description.
    pub description: String,

    /// Version of the stage implementation.
    pub version: u32,
}

impl StageMetadata {
    /// Create metadata for a stage.
    #[must_use]
    pub fn new(id: impl Into<String>, layer: StageLayer) -> Self {
        Self {
            id: id.into(),
            layer,
            description: String::new(),
            version: 1,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

/// Base trait implemented by every engine stage.
pub trait EngineStage {
    /// Stage metadata.
    fn metadata(&self) -> &StageMetadata;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_names() {
        assert_eq!(StageLayer::Metrics.as_str(), "metrics");
        assert_eq!(StageLayer::RiskModelling.to_string(), "risk-modelling");
    }

    #[test]
    fn test_scoring_pipeline_layers() {
        assert!(StageLayer::Metrics.is_scoring_pipeline());
        assert!(StageLayer::Composition.is_scoring_pipeline());
        assert!(!StageLayer::RiskModelling.is_scoring_pipeline());
        assert!(!StageLayer::Evidence.is_scoring_pipeline());
    }

    #[test]
    fn test_metadata_builder() {
        let meta = StageMetadata::new("health/metric-aggregation", StageLayer::Metrics)
            .with_description("Snapshot to benchmarked metrics")
            .with_version(2);

        assert_eq!(meta.id, "health/metric-aggregation");
        assert_eq!(meta.layer, StageLayer::Metrics);
        assert_eq!(meta.version, 2);
    }
}
