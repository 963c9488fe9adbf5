mod problem;
mod simplex;
mod solution;

pub use problem::{Constraint, ConstraintOp, LpError, LpProblem, Objective};
pub use simplex::Solver;
pub use solution::{Analysis, ConstraintViolation, ReducedCost, ShadowPrice, Solution, SolutionStatus};

/// Anything that can solve a linear program.
///
/// The blend optimizer only talks to this trait, so an external solver can
/// stand in for the built-in simplex.
pub trait LpSolver {
    fn solve(&self, problem: &LpProblem) -> Solution;
}
