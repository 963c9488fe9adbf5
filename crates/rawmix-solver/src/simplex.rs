use tracing::{debug, trace};

use crate::LpSolver;
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, ConstraintViolation, ReducedCost, ShadowPrice, Solution, SolutionStatus};

/// Two-phase simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Consecutive degenerate pivots tolerated before switching to Bland's rule
    degenerate_limit: usize,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            degenerate_limit: 50,
        }
    }
}

impl LpSolver for Solver {
    fn solve(&self, problem: &LpProblem) -> Solution {
        Solver::solve(self, problem)
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        if let Err(e) = problem.validate() {
            return Solution::error(e.to_string());
        }
        debug!(
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "solving LP"
        );

        match self.run(problem) {
            Ok(tableau) => self.extract_solution(&tableau, problem),
            Err(Failure::Unbounded) => Solution::unbounded(),
            Err(Failure::Infeasible) => self.solve_with_relaxation(problem),
            Err(Failure::IterationLimit) => {
                Solution::error(format!("iteration limit of {} pivots reached", self.max_iterations))
            }
        }
    }

    fn run(&self, problem: &LpProblem) -> Result<Tableau, Failure> {
        let mut tableau = self.build_tableau(problem);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            self.phase1(&mut tableau)?;
        }

        // Phase 2: Optimize
        let eligible = tableau.n_vars + tableau.n_slack;
        self.iterate(&mut tableau, eligible)?;
        Ok(tableau)
    }

    /// When the original problem is infeasible, solve it again without its
    /// `>=` rows and report which of the original constraints that point breaks
    fn solve_with_relaxation(&self, problem: &LpProblem) -> Solution {
        let mut relaxed = LpProblem::new(problem.variables.clone());
        relaxed.set_objective(
            problem.objective.coefficients.clone(),
            problem.objective.minimize,
        );
        relaxed.constraints = problem
            .constraints
            .iter()
            .filter(|c| c.op != ConstraintOp::Ge)
            .cloned()
            .collect();

        let values = match self.run(&relaxed) {
            Ok(tableau) => tableau.values(),
            Err(_) => return Solution::infeasible(),
        };

        let violations = self.find_violations(problem, &values);
        if violations.is_empty() {
            // Phase 1 rejected a point that satisfies every row within tolerance
            let objective_value = problem.objective_value(&values);
            return Solution {
                status: SolutionStatus::Optimal,
                values,
                objective_value,
                analysis: Analysis::default(),
                violations,
                message: None,
            };
        }

        debug!(violated = violations.len(), "LP infeasible");
        let objective_value = problem.objective_value(&values);
        Solution::infeasible_with_relaxed(values, objective_value, violations)
    }

    /// Find which constraints are violated by a given solution
    fn find_violations(&self, problem: &LpProblem, values: &[f64]) -> Vec<ConstraintViolation> {
        let mut violations: Vec<ConstraintViolation> = problem
            .constraints
            .iter()
            .filter_map(|c| {
                let amount = c.violation(values);
                if amount <= self.tolerance * (1.0 + c.rhs.abs()) {
                    return None;
                }
                let actual = c.lhs(values);
                let description = match c.op {
                    ConstraintOp::Le => format!("{} exceeds maximum of {:.4} by {:.4}", c.name, c.rhs, amount),
                    ConstraintOp::Ge => format!("{} is below minimum of {:.4} by {:.4}", c.name, c.rhs, amount),
                    ConstraintOp::Eq => format!("{} requires exactly {:.4} but got {:.4}", c.name, c.rhs, actual),
                };
                Some(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual,
                    violation_amount: amount,
                    description,
                })
            })
            .collect();

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));
        violations
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Rows with a negative RHS are negated so every RHS starts non-negative
        let rows: Vec<(Vec<f64>, ConstraintOp, f64, bool)> = problem
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    (c.coefficients.iter().map(|x| -x).collect(), c.op.flipped(), -c.rhs, true)
                } else {
                    (c.coefficients.clone(), c.op, c.rhs, false)
                }
            })
            .collect();

        let n_slack = rows.iter().filter(|r| r.1 != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|r| r.1 != ConstraintOp::Le).count();

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            dual_cols: vec![0; n_constraints],
            flipped: rows.iter().map(|r| r.3).collect(),
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (coefficients, op, rhs, _)) in rows.iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(coefficients);
            tableau.data[i][total_cols - 1] = *rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    tableau.dual_cols[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.dual_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.dual_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row). Simplex maximizes, so a minimization
        // stores the negated costs.
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> Result<(), Failure> {
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let rhs_col = n_cols - 1;
        let art_start = tableau.n_vars + tableau.n_slack;

        // Maximize -sum(artificials)
        let original = std::mem::replace(&mut tableau.data[n_constraints], vec![0.0; n_cols]);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, rhs_col) {
            Ok(()) => {}
            // Phase 1 is bounded above by zero
            Err(Failure::Unbounded) => return Err(Failure::Infeasible),
            Err(e) => return Err(e),
        }

        let scale = 1.0
            + (0..n_constraints)
                .map(|i| tableau.data[i][rhs_col].abs())
                .fold(0.0, f64::max);
        let residual: f64 = (0..n_constraints)
            .filter(|&i| tableau.basic_vars[i] >= art_start)
            .map(|i| tableau.data[i][rhs_col])
            .sum();
        if residual > self.tolerance * scale {
            debug!(residual, "phase 1 left artificial variables in the basis");
            return Err(Failure::Infeasible);
        }

        // Drive zero-level artificials out of the basis so phase 2 cannot move them
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                if let Some(j) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                    self.pivot(tableau, i, j);
                }
            }
        }

        // Restore original objective and price out the basic variables
        tableau.data[n_constraints] = original;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if ratio != 0.0 {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Ok(())
    }

    /// Pivot until no column below `eligible` can improve the objective
    fn iterate(&self, tableau: &mut Tableau, eligible: usize) -> Result<(), Failure> {
        let rhs_col = tableau.data[0].len() - 1;
        let mut degenerate = 0;
        let mut iterations = 0;

        loop {
            let bland = degenerate >= self.degenerate_limit;
            let Some(pivot_col) = self.find_pivot_column(tableau, eligible, bland) else {
                return Ok(());
            };
            if iterations >= self.max_iterations {
                return Err(Failure::IterationLimit);
            }
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return Err(Failure::Unbounded);
            };

            if tableau.data[pivot_row][rhs_col] <= self.tolerance {
                degenerate += 1;
            } else {
                degenerate = 0;
            }
            trace!(pivot_row, pivot_col, bland, "pivot");
            self.pivot(tableau, pivot_row, pivot_col);
            iterations += 1;
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, eligible: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        let reduced = &tableau.data[obj_row][..eligible];

        if bland {
            // Smallest improving index; guarantees termination on degenerate vertices
            return reduced.iter().position(|&v| v > self.tolerance);
        }

        // Look for the most positive reduced cost (can improve objective)
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &v) in reduced.iter().enumerate() {
            if v > max_val {
                max_val = v;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col].max(0.0) / val;
                let better = match min_row {
                    None => true,
                    Some(r) => {
                        ratio < min_ratio - self.tolerance
                            || (ratio <= min_ratio + self.tolerance
                                && tableau.basic_vars[i] < tableau.basic_vars[r])
                    }
                };
                if better {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        let pivot_row = tableau.data[row].clone();
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor != 0.0 {
                    for (x, p) in tableau.data[i].iter_mut().zip(&pivot_row) {
                        *x -= factor * p;
                    }
                }
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let values = tableau.values();
        let objective_value = problem.objective_value(&values);
        let analysis = self.analyze(tableau, problem, &values);

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            analysis,
            violations: Vec::new(),
            message: None,
        }
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64]) -> Analysis {
        let obj_row = tableau.data.len() - 1;
        // Reduced costs in the tableau are for the maximized objective
        let sense = if problem.objective.minimize { -1.0 } else { 1.0 };

        let shadow_prices: Vec<ShadowPrice> = problem
            .constraints
            .iter()
            .enumerate()
            .map(|(i, constraint)| {
                let mut dual = -tableau.data[obj_row][tableau.dual_cols[i]];
                if tableau.flipped[i] {
                    dual = -dual;
                }
                ShadowPrice {
                    constraint: constraint.name.clone(),
                    value: sense * dual,
                }
            })
            .collect();

        let reduced_costs = problem
            .variables
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let is_basic = tableau.basic_vars.contains(&j);
                let reduced_cost = if is_basic { 0.0 } else { sense * tableau.data[obj_row][j] };
                ReducedCost {
                    variable: name.clone(),
                    value: values[j],
                    reduced_cost,
                    is_basic,
                }
            })
            .collect();

        let binding_constraints = shadow_prices
            .iter()
            .filter(|sp| sp.value.abs() > self.tolerance)
            .map(|sp| sp.constraint.clone())
            .collect();

        Analysis {
            shadow_prices,
            reduced_costs,
            binding_constraints,
        }
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    /// Column holding +e_i for each row (slack or artificial), read for duals
    dual_cols: Vec<usize>,
    /// Rows negated during construction
    flipped: Vec<bool>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn values(&self) -> Vec<f64> {
        let rhs_col = self.data[0].len() - 1;
        let mut values = vec![0.0; self.n_vars];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < self.n_vars {
                values[basic] = self.data[i][rhs_col].max(0.0);
            }
        }
        values
    }
}

enum Failure {
    Unbounded,
    Infeasible,
    IterationLimit,
}
