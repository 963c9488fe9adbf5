/// Terminal outcome of an LP solve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    Optimal,
    /// No point satisfies every row
    Infeasible,
    /// The objective improves without limit
    Unbounded,
    /// Malformed input or numerical breakdown; see [`Solution::message`]
    Error,
}

/// What a solver hands back for an [`LpProblem`](crate::LpProblem).
///
/// `values` is only meaningful for `Optimal`, and for `Infeasible` when the
/// solver reports the relaxed point its `violations` refer to.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub values: Vec<f64>,
    pub objective_value: f64,
    pub analysis: Analysis,
    /// Rows broken by the relaxed point, worst first
    pub violations: Vec<ConstraintViolation>,
    pub message: Option<String>,
}

/// Duals and reduced costs at an optimal vertex.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub shadow_prices: Vec<ShadowPrice>,
    pub reduced_costs: Vec<ReducedCost>,
    /// Rows with a nonzero dual
    pub binding_constraints: Vec<String>,
}

impl Analysis {
    pub fn shadow_price(&self, constraint: &str) -> Option<f64> {
        self.shadow_prices
            .iter()
            .find(|sp| sp.constraint == constraint)
            .map(|sp| sp.value)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ShadowPrice {
    pub constraint: String,
    /// Objective change per unit increase of the row's RHS
    pub value: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ReducedCost {
    pub variable: String,
    pub value: f64,
    /// Objective change per unit the variable is forced up; zero when basic
    pub reduced_cost: f64,
    pub is_basic: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    pub constraint: String,
    /// Row RHS
    pub required: f64,
    /// Row LHS at the reported point
    pub actual: f64,
    pub violation_amount: f64,
    pub description: String,
}

impl Solution {
    fn terminal(status: SolutionStatus, objective_value: f64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value,
            analysis: Analysis::default(),
            violations: Vec::new(),
            message: None,
        }
    }

    pub fn infeasible() -> Self {
        Self::terminal(SolutionStatus::Infeasible, f64::INFINITY)
    }

    /// Infeasible, with the relaxed point and the rows it breaks
    pub fn infeasible_with_relaxed(
        values: Vec<f64>,
        objective_value: f64,
        violations: Vec<ConstraintViolation>,
    ) -> Self {
        Self {
            values,
            violations,
            ..Self::terminal(SolutionStatus::Infeasible, objective_value)
        }
    }

    pub fn unbounded() -> Self {
        Self::terminal(SolutionStatus::Unbounded, f64::NEG_INFINITY)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::terminal(SolutionStatus::Error, f64::NAN)
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
