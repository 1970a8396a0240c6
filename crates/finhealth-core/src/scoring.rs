//! Score normalization and risk band discretization.
//!
//! Both pipeline layers share exactly these two rules:
//! - `normalize_score` maps a raw metric value against its benchmark onto
//!   a 0-100 score, parameterized by direction;
//! - `RiskBand::from` discretizes any 0-100 score under fixed cut points.
//!
//! Keeping them here is what guarantees a category can never carry a band
//! inconsistent with the bands of its own metrics at the same score.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discretization of a 0-100 score into five bands.
///
/// Cut points: 80 / 60 / 40 / 20.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    /// Score >= 80.
    Excellent,
    /// Score in [60, 80).
    Good,
    /// Score in [40, 60).
    Moderate,
    /// Score in [20, 40).
    Concerning,
    /// Score < 20.
    Critical,
}

impl From<f64> for RiskBand {
    fn from(score: f64) -> Self {
        match score {
            s if s >= 80.0 => RiskBand::Excellent,
            s if s >= 60.0 => RiskBand::Good,
            s if s >= 40.0 => RiskBand::Moderate,
            s if s >= 20.0 => RiskBand::Concerning,
            _ => RiskBand::Critical,
        }
    }
}

impl RiskBand {
    /// Returns the band name as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Excellent => "Excellent",
            RiskBand::Good => "Good",
            RiskBand::Moderate => "Moderate",
            RiskBand::Concerning => "Concerning",
            RiskBand::Critical => "Critical",
        }
    }

    /// Returns true for bands that warrant attention (Concerning or worse).
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(self, RiskBand::Concerning | RiskBand::Critical)
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a larger raw value is better or worse for a metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreDirection {
    /// Larger values score higher (e.g. emergency buffer months).
    HigherIsBetter,
    /// Larger values score lower (e.g. loan-to-value ratio).
    LowerIsBetter,
}

/// Normalize a raw metric value against its benchmark onto [0, 100].
///
/// Higher-is-better: `min(100, value / benchmark * 100)`, floored at 0 for
/// negative values. Lower-is-better: a value at or below zero is a perfect
/// 100, a non-positive benchmark scores 0, otherwise
/// `((benchmark - value) / benchmark + 1) * 50` clamped to [0, 100], which
/// places `value == benchmark` exactly at 50.
#[must_use]
pub fn normalize_score(value: f64, benchmark: f64, direction: ScoreDirection) -> f64 {
    match direction {
        ScoreDirection::HigherIsBetter => {
            if benchmark <= 0.0 {
                return 0.0;
            }
            (value / benchmark * 100.0).clamp(0.0, 100.0)
        }
        ScoreDirection::LowerIsBetter => {
            if value <= 0.0 {
                return 100.0;
            }
            if benchmark <= 0.0 {
                return 0.0;
            }
            (((benchmark - value) / benchmark + 1.0) * 50.0).clamp(0.0, 100.0)
        }
    }
}
