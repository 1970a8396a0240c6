//! # FinHealth
//!
//! Financial health engine for personal finance applications.
//!
//! FinHealth reduces a user's full financial position - accounts, loans,
//! properties, investments, income, and expenses - into a single 0-100
//! health score with a seven-category breakdown, discrete rule-triggered
//! risk signals, ranked improvement actions, and an explainability pack.
//!
//! ## Quick Start
//!
//! ```rust
//! use finhealth::prelude::*;
//!
//! fn report(input: &FinancialHealthInput) -> Result<FinancialHealthReport> {
//!     let engine = FinancialHealthEngine::with_defaults()?;
//!     let now = "2025-06-30T00:00:00Z".parse().expect("fixed timestamp");
//!     engine.generate(input, &ReportContext::new(now))
//! }
//! ```
//!
//! The engine is pure and synchronous: snapshot assembly, insight
//! retrieval, and history persistence belong to the surrounding
//! application, which injects everything - including the clock - through
//! `FinancialHealthInput` and `ReportContext`.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export member crates
pub use finhealth_core as core;
pub use finhealth_engine as engine;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use finhealth_core::prelude::*;
    pub use finhealth_engine::prelude::*;
}

/// Version information.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _category = MetricCategory::Liquidity;
        let _band = RiskBand::from(85.0);
        let _config = EngineConfig::default();
    }

    #[test]
    fn test_version() {
        assert!(!version::VERSION.is_empty());
    }

    #[test]
    fn test_end_to_end_through_facade() {
        use crate::prelude::*;

        let input = FinancialHealthInput {
            user_id: "facade-user".to_string(),
            portfolio: PortfolioSnapshot {
                net_worth: 50_000.0,
                total_assets: 50_000.0,
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
        };

        let engine = FinancialHealthEngine::with_defaults().unwrap();
        let now = "2025-06-30T00:00:00Z".parse().unwrap();
        let report = engine.generate(&input, &ReportContext::new(now)).unwrap();

        assert_eq!(report.user_id, "facade-user");
        assert_eq!(report.categories().len(), 7);
    }
}
