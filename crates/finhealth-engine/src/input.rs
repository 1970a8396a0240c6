//! Engine input model.
//!
//! A `FinancialHealthInput` is assembled by an upstream snapshot provider
//! and handed to the engine fully resolved: the engine performs no lookups
//! of its own. The portfolio snapshot is required; the remaining sections
//! are optional context that degrades confidence when absent.

use finhealth_core::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Portfolio Records
// ============================================================================

/// Kind of property holding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Primary residence.
    OwnerOccupied,
    /// Income-producing investment property.
    Investment,
}

/// A property position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Property kind.
    pub kind: PropertyKind,
    /// Current market value.
    pub value: f64,
    /// Gross rental income per month (zero for owner-occupied).
    pub monthly_rent: f64,
    /// Whether building insurance is in place.
    pub insured: bool,
}

/// Kind of loan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanKind {
    /// Property-secured mortgage.
    Mortgage,
    /// Unsecured personal loan.
    Personal,
    /// Revolving credit card balance.
    CreditCard,
    /// Vehicle finance.
    Auto,
    /// Anything else.
    Other,
}

/// A loan position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Loan kind.
    pub kind: LoanKind,
    /// Outstanding principal.
    pub principal: f64,
    /// Annual interest rate as a fraction (0.06 = 6%).
    pub interest_rate: f64,
    /// Scheduled repayment per month.
    pub monthly_repayment: f64,
    /// Whether the loan is secured against a property.
    pub secured_by_property: bool,
}

/// Kind of cash account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    /// Everyday transaction account.
    Transaction,
    /// At-call savings account.
    Savings,
    /// Term deposit.
    TermDeposit,
    /// Mortgage offset account.
    Offset,
}

/// A cash account position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Account kind.
    pub kind: AccountKind,
    /// Current balance (may be negative for overdrafts).
    pub balance: f64,
}

/// Kind of investment holding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentKind {
    /// Direct equities.
    Shares,
    /// Exchange-traded funds.
    Etf,
    /// Managed funds.
    ManagedFund,
    /// Retirement/superannuation balance.
    Retirement,
    /// Fixed interest.
    Bonds,
    /// Crypto assets.
    Crypto,
    /// Cash-like holdings inside an investment wrapper.
    Cash,
}

/// An investment position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentRecord {
    /// Record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Investment kind.
    pub kind: InvestmentKind,
    /// Current market value.
    pub value: f64,
    /// Distributions/dividends per year.
    pub annual_income: f64,
    /// Whether the holding is growth-oriented (vs defensive).
    pub growth_oriented: bool,
}

/// An income source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeRecord {
    /// Record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Gross amount per month.
    pub monthly_amount: f64,
    /// Whether the income recurs reliably (salary vs one-off).
    pub recurring: bool,
}

/// An expense line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Amount per month.
    pub monthly_amount: f64,
    /// Whether the expense is discretionary.
    pub discretionary: bool,
}

/// Normalized snapshot of a user's full financial position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Net worth (assets minus liabilities); may legitimately be negative.
    pub net_worth: f64,
    /// Total assets.
    pub total_assets: f64,
    /// Total liabilities.
    pub total_liabilities: f64,
    /// Property positions.
    pub properties: Vec<PropertyRecord>,
    /// Loan positions.
    pub loans: Vec<LoanRecord>,
    /// Cash accounts.
    pub accounts: Vec<AccountRecord>,
    /// Investment positions.
    pub investments: Vec<InvestmentRecord>,
    /// Income sources.
    pub income: Vec<IncomeRecord>,
    /// Expense lines.
    pub expenses: Vec<ExpenseRecord>,
}

// ============================================================================
// Optional Context Sections
// ============================================================================

/// Severity of an upstream insight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InsightSeverity {
    /// Informational.
    Info,
    /// Worth a look.
    Warning,
    /// Significant.
    High,
    /// Urgent.
    Critical,
}

/// An insight produced by an upstream analysis collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Insight identifier.
    pub id: String,
    /// Severity.
    pub severity: InsightSeverity,
    /// Free-form category label.
    pub category: String,
    /// Title.
    pub title: String,
}

/// A recommendation from the external strategy engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    /// Recommendation identifier.
    pub id: String,
    /// Category label the recommendation targets (matched by name).
    pub category: String,
    /// Title.
    pub title: String,
}

/// A conflict between active strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConflict {
    /// Conflict identifier.
    pub id: String,
    /// Description of the conflict.
    pub description: String,
}

/// A per-strategy suitability score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyScore {
    /// Strategy identifier.
    pub strategy_id: String,
    /// Suitability score (0-100).
    pub score: f64,
}

/// Output of the external strategy engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyData {
    /// Active recommendations.
    pub recommendations: Vec<StrategyRecommendation>,
    /// Detected conflicts between strategies.
    pub conflicts: Vec<StrategyConflict>,
    /// Per-strategy suitability scores.
    pub sbs_scores: Vec<StrategyScore>,
}

/// Entity linkage health reported by the data layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkageHealth {
    /// Entities with no owning link.
    pub orphans: Vec<String>,
    /// Expected links that are missing.
    pub missing_links: Vec<String>,
    /// Overall linkage consistency score (0-100).
    pub consistency_score: f64,
}

/// Risk appetite declared by the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTolerance {
    /// Capital preservation first.
    Conservative,
    /// Balanced growth and defence.
    Balanced,
    /// Growth-tilted.
    Growth,
    /// Maximum growth.
    Aggressive,
}

/// User-declared goals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserGoals {
    /// Retirement balance target.
    pub retirement_target: Option<f64>,
    /// Near-term savings goal.
    pub savings_goal: Option<f64>,
    /// Declared risk tolerance.
    pub risk_tolerance: Option<RiskTolerance>,
    /// Free-form investment style label.
    pub investment_style: Option<String>,
}

// ============================================================================
// Engine Input
// ============================================================================

/// Complete input to one report generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialHealthInput {
    /// Opaque user identifier.
    pub user_id: String,
    /// Required portfolio snapshot.
    pub portfolio: PortfolioSnapshot,
    /// Insights from upstream analysis (may be empty).
    #[serde(default)]
    pub insights: Vec<Insight>,
    /// Strategy engine output, when available.
    pub strategy_data: Option<StrategyData>,
    /// Linkage health, when available.
    pub linkage_health: Option<LinkageHealth>,
    /// User goals, when available.
    pub user_goals: Option<UserGoals>,
}

impl FinancialHealthInput {
    /// Validate structural preconditions.
    ///
    /// Absent optional sections are fine (they degrade confidence, not
    /// validity); malformed magnitudes are not.
    ///
    /// # Errors
    /// `EngineError::Validation` / `EngineError::MalformedRecord` on the
    /// first violation found.
    pub fn validate(&self) -> Result<()> {
        let snap = &self.portfolio;

        if self.user_id.is_empty() {
            return Err(EngineError::validation("user_id must not be empty"));
        }
        for (label, v) in [
            ("net_worth", snap.net_worth),
            ("total_assets", snap.total_assets),
            ("total_liabilities", snap.total_liabilities),
        ] {
            if !v.is_finite() {
                return Err(EngineError::validation(format!("{label} is not finite")));
            }
        }
        if snap.total_assets < 0.0 {
            return Err(EngineError::validation("total_assets is negative"));
        }
        if snap.total_liabilities < 0.0 {
            return Err(EngineError::validation("total_liabilities is negative"));
        }

        for p in &snap.properties {
            require_magnitude("properties", &p.id, "value", p.value)?;
            require_magnitude("properties", &p.id, "monthly_rent", p.monthly_rent)?;
        }
        for l in &snap.loans {
            require_magnitude("loans", &l.id, "principal", l.principal)?;
            require_magnitude("loans", &l.id, "interest_rate", l.interest_rate)?;
            require_magnitude("loans", &l.id, "monthly_repayment", l.monthly_repayment)?;
        }
        for a in &snap.accounts {
            if !a.balance.is_finite() {
                return Err(EngineError::malformed("accounts", &a.id, "balance is not finite"));
            }
        }
        for i in &snap.investments {
            require_magnitude("investments", &i.id, "value", i.value)?;
            require_magnitude("investments", &i.id, "annual_income", i.annual_income)?;
        }
        for i in &snap.income {
            require_magnitude("income", &i.id, "monthly_amount", i.monthly_amount)?;
        }
        for e in &snap.expenses {
            require_magnitude("expenses", &e.id, "monthly_amount", e.monthly_amount)?;
        }

        if let Some(linkage) = &self.linkage_health {
            if !linkage.consistency_score.is_finite()
                || !(0.0..=100.0).contains(&linkage.consistency_score)
            {
                return Err(EngineError::validation(
                    "linkage consistency_score must be within [0, 100]",
                ));
            }
        }
        if let Some(goals) = &self.user_goals {
            for (label, v) in [
                ("retirement_target", goals.retirement_target),
                ("savings_goal", goals.savings_goal),
            ] {
                if let Some(v) = v {
                    if !v.is_finite() || v < 0.0 {
                        return Err(EngineError::validation(format!(
                            "{label} must be a non-negative finite amount"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// A magnitude field must be finite and non-negative.
fn require_magnitude(collection: &str, id: &str, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(EngineError::malformed(collection, id, format!("{field} is not finite")));
    }
    if value < 0.0 {
        return Err(EngineError::malformed(collection, id, format!("{field} is negative")));
    }
    Ok(())
}
