use thiserror::Error;

/// Represents a linear programming problem
///
/// All variables are implicitly non-negative. Lower bounds above zero and
/// upper bounds are expressed as ordinary constraints.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// A structural defect in an [`LpProblem`] that prevents solving it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpError {
    #[error("Problem has no variables")]
    NoVariables,
    #[error("Constraint {name} has {found} coefficients, expected {expected}")]
    CoefficientCount { name: String, expected: usize, found: usize },
    #[error("Objective has {found} coefficients, expected {expected}")]
    ObjectiveCount { expected: usize, found: usize },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
}

impl ConstraintOp {
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }
}

impl Constraint {
    /// Left-hand side value at the given point
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }

    /// Amount by which `values` violates this constraint (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs(values);
        match self.op {
            ConstraintOp::Le => (lhs - self.rhs).max(0.0),
            ConstraintOp::Ge => (self.rhs - lhs).max(0.0),
            ConstraintOp::Eq => (lhs - self.rhs).abs(),
        }
    }
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value at the given point
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }

    /// Check that every row is dimensioned and finite
    pub fn validate(&self) -> Result<(), LpError> {
        let n = self.num_variables();
        if n == 0 {
            return Err(LpError::NoVariables);
        }
        if self.objective.coefficients.len() != n {
            return Err(LpError::ObjectiveCount {
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(LpError::NonFinite("objective".to_string()));
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(LpError::CoefficientCount {
                    name: c.name.clone(),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|x| !x.is_finite()) {
                return Err(LpError::NonFinite(c.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_amounts() {
        let c = Constraint {
            name: "cap".to_string(),
            coefficients: vec![1.0, 2.0],
            op: ConstraintOp::Le,
            rhs: 4.0,
        };
        assert_eq!(c.violation(&[1.0, 1.0]), 0.0);
        assert!((c.violation(&[2.0, 2.0]) - 2.0).abs() < 1e-12);

        let eq = Constraint { op: ConstraintOp::Eq, ..c };
        assert!((eq.violation(&[0.0, 1.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_short_rows() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 1.0);
        assert_eq!(
            problem.validate(),
            Err(LpError::CoefficientCount {
                name: "short".to_string(),
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.add_constraint("bad", vec![f64::NAN], ConstraintOp::Ge, 0.0);
        assert!(matches!(problem.validate(), Err(LpError::NonFinite(_))));
    }
}
