//! Metric category definitions.
//!
//! Base metrics are organized into seven categories that together compose
//! the composite health score. The declaration order of the enum is the
//! canonical category order: it drives report layout and breaks ties when
//! two categories share a score.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the seven metric categories composing the health score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricCategory {
    /// Liquidity: emergency buffer, liquid net worth, savings rate
    Liquidity,

    /// Cashflow: surplus, expense ratio, income stability
    Cashflow,

    /// Debt: LVR, DTI, debt servicing, consumer debt
    Debt,

    /// Investments: diversification, allocation, yield
    Investments,

    /// Property: equity, rental yield, concentration
    Property,

    /// Risk: insurance cover, concentration, leverage
    Risk,

    /// Forecast: retirement readiness, goal progress, runway
    Forecast,
}

impl MetricCategory {
    /// All categories in canonical order.
    pub const ALL: &'static [MetricCategory] = &[
        MetricCategory::Liquidity,
        MetricCategory::Cashflow,
        MetricCategory::Debt,
        MetricCategory::Investments,
        MetricCategory::Property,
        MetricCategory::Risk,
        MetricCategory::Forecast,
    ];

    /// Returns the category name as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Liquidity => "Liquidity",
            MetricCategory::Cashflow => "Cashflow",
            MetricCategory::Debt => "Debt",
            MetricCategory::Investments => "Investments",
            MetricCategory::Property => "Property",
            MetricCategory::Risk => "Risk",
            MetricCategory::Forecast => "Forecast",
        }
    }

    /// Parse a category from a string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Liquidity" => Some(MetricCategory::Liquidity),
            "Cashflow" => Some(MetricCategory::Cashflow),
            "Debt" => Some(MetricCategory::Debt),
            "Investments" => Some(MetricCategory::Investments),
            "Property" => Some(MetricCategory::Property),
            "Risk" => Some(MetricCategory::Risk),
            "Forecast" => Some(MetricCategory::Forecast),
            _ => None,
        }
    }

    /// Position in the canonical order, used as a deterministic tie-break.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_count() {
        assert_eq!(MetricCategory::ALL.len(), 7);
    }

    #[test]
    fn test_from_str_roundtrip() {
        for cat in MetricCategory::ALL {
            assert_eq!(MetricCategory::from_str(cat.as_str()), Some(*cat));
        }
        assert_eq!(MetricCategory::from_str("Unknown"), None);
    }

    #[test]
    fn test_ordinal_matches_declaration_order() {
        assert_eq!(MetricCategory::Liquidity.ordinal(), 0);
        assert_eq!(MetricCategory::Forecast.ordinal(), 6);
    }

    #[test]
    fn test_display() {
        assert_eq!(MetricCategory::Liquidity.to_string(), "Liquidity");
        assert_eq!(MetricCategory::Forecast.to_string(), "Forecast");
    }
}
