//! Stage registry.
//!
//! The registry tracks the metadata of every stage assembled into an
//! engine, so callers can enumerate what a report was produced by.

use crate::error::{EngineError, Result};
use crate::stage::{StageLayer, StageMetadata};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Registry statistics.
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    /// Total number of registered stages.
    pub total: usize,
    /// Stage count per layer.
    pub by_layer: HashMap<StageLayer, usize>,
}

/// Central registry of engine stages.
#[derive(Debug, Default)]
pub struct StageRegistry {
    stages: RwLock<HashMap<String, StageMetadata>>,
}

impl StageRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: RwLock::new(HashMap::new()),
        }
    }

    /// Register a stage by metadata.
    ///
    /// # Errors
    /// Returns `EngineError::StageAlreadyRegistered` for a duplicate id.
    pub fn register(&self, metadata: StageMetadata) -> Result<()> {
        let id = metadata.id.clone();
        let mut stages = self.stages.write().unwrap_or_else(|e| e.into_inner());

        if stages.contains_key(&id) {
            return Err(EngineError::StageAlreadyRegistered(id));
        }

        debug!(stage_id = %id, layer = %metadata.layer, "registering engine stage");
        stages.insert(id, metadata);
        Ok(())
    }

    /// Look up a stage's metadata by id.
    pub fn get(&self, id: &str) -> Result<StageMetadata> {
        self.stages
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::StageNotFound(id.to_string()))
    }

    /// Returns true if a stage with the given id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.stages
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    /// Total number of registered stages.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.stages.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// All registered stage ids, sorted.
    #[must_use]
    pub fn stage_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .stages
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Aggregate statistics over the registered stages.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let stages = self.stages.read().unwrap_or_else(|e| e.into_inner());
        let mut by_layer: HashMap<StageLayer, usize> = HashMap::new();
        for meta in stages.values() {
            *by_layer.entry(meta.layer).or_default() += 1;
        }
        RegistryStats {
            total: stages.len(),
            by_layer,
        }
    }
}
