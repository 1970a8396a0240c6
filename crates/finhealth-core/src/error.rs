//! Error types for the health engine.

use thiserror::Error;

/// Result type alias using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while building a health report.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required input field is missing or structurally invalid.
    ///
    /// Raised before any layer runs; no partial report is produced.
    #[error("precondition violation: {0}")]
    Validation(String),

    /// A record inside an input collection is malformed.
    #[error("malformed {collection} record '{id}': {reason}")]
    MalformedRecord {
        /// Collection the record belongs to (e.g. "loans").
        collection: String,
        /// Identifier of the offending record.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Engine configuration is inconsistent (weight sums, benchmarks).
    #[error("configuration error: {0}")]
    Config(String),

    /// A stage with the same id is already registered.
    #[error("stage already registered: {0}")]
    StageAlreadyRegistered(String),

    /// Stage not found in the registry.
    #[error("stage not found: {0}")]
    StageNotFound(String),
}

impl EngineError {
    /// Create a precondition violation.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    /// Create a malformed-record error.
    #[must_use]
    pub fn malformed(
        collection: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EngineError::MalformedRecord {
            collection: collection.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Config(msg.into())
    }

    /// Returns true if this error denotes invalid caller input rather than
    /// an engine defect.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_) | EngineError::MalformedRecord { .. }
        )
    }
}
