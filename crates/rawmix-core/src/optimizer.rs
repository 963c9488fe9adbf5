//! Blend optimization: assemble the LP, hand it to a solver and read the
//! result back into material shares.
//!
//! ```text
//! BlendOptimizer ──build()──▶ BlendModel ──solve(&dyn LpSolver)──▶ SolvedBlend
//!                   │                          │
//!                   └─ ModelError              └─ BlendError::{Infeasible, Unbounded, Solver}
//! ```

use std::fmt;

use rawmix_solver::{Analysis, ConstraintOp, LpProblem, LpSolver, Solution, SolutionStatus};
use tracing::{debug, info, warn};

use crate::constraints::{QualityConstraint, build_quality_constraints};
use crate::error::{BlendError, ModelError};
use crate::expr::LinearExpr;
use crate::fuel::AshLoad;
use crate::material::{DustStream, Material, validate_materials};
use crate::operation::OperationalConstants;
use crate::oxide::{Oxide, OxideVector};
use crate::pipeline::{MassBalance, StageChain};
use crate::quality::c3s;
use crate::targets::{ObjectiveMode, QualityTargets};

/// Name of the proportions-sum-to-100 row
pub const SUM_ROW: &str = "Sum100";

/// Slack allowed when re-checking quality rows at the solver's point
const QUALITY_TOLERANCE: f64 = 1e-6;

/// Terminal state of one solve.
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    SolverError,
}

impl SolveStatus {
    /// `None` when the run stopped on an input defect before solving
    pub fn of(result: &Result<SolvedBlend, BlendError>) -> Option<Self> {
        match result {
            Ok(_) => Some(SolveStatus::Optimal),
            Err(BlendError::Infeasible { .. }) => Some(SolveStatus::Infeasible),
            Err(BlendError::Unbounded) => Some(SolveStatus::Unbounded),
            Err(BlendError::Solver(_)) => Some(SolveStatus::SolverError),
            Err(BlendError::Model(_)) => None,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unbounded => "Unbounded",
            SolveStatus::SolverError => "SolverError",
        };
        f.write_str(label)
    }
}

/// Collects the inputs of one optimization.
#[derive(Debug, Clone)]
pub struct BlendOptimizer {
    materials: Vec<Material>,
    dust: DustStream,
    ash: AshLoad,
    operation: OperationalConstants,
    targets: QualityTargets,
    mode: ObjectiveMode,
}

impl BlendOptimizer {
    pub fn new(materials: Vec<Material>, dust: DustStream, ash: AshLoad, operation: OperationalConstants) -> Self {
        Self {
            materials,
            dust,
            ash,
            operation,
            targets: QualityTargets::unconstrained(),
            mode: ObjectiveMode::default(),
        }
    }

    pub fn with_targets(mut self, targets: QualityTargets) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_mode(mut self, mode: ObjectiveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate every input and register variables, bounds, the sum row and
    /// the quality rows.
    pub fn build(self) -> Result<BlendModel, ModelError> {
        validate_materials(&self.materials)?;
        self.targets.validate()?;

        let balance = MassBalance::new(&self.materials, &self.dust, &self.ash, &self.operation)?;

        let n = self.materials.len();
        let chain = balance.stages(&LinearExpr::variables(n))?;

        let lowest = lowest_z_blend(chain.z.coefficients(), &self.materials);
        let z_min = chain.z.evaluate(&lowest);
        if !z_min.is_finite() || z_min <= 0.0 {
            let blend: Vec<String> = self
                .materials
                .iter()
                .zip(&lowest)
                .filter(|(_, share)| **share > 0.0)
                .map(|(m, share)| format!("{}={share}", m.id))
                .collect();
            return Err(ModelError::InvalidConstants(format!(
                "LOI-free factor Z = {z_min} for the blend {}",
                blend.join(",")
            )));
        }

        let quality = build_quality_constraints(&chain.unignited, &chain.z, &self.targets, self.operation.free_lime);

        let mut problem = LpProblem::new(self.materials.iter().map(|m| m.id.clone()).collect());
        let weight = self.mode.cost_weight();
        problem.set_objective(self.materials.iter().map(|m| m.cost * weight).collect(), true);

        problem.add_constraint(SUM_ROW, vec![1.0; n], ConstraintOp::Eq, 100.0);
        for (i, material) in self.materials.iter().enumerate() {
            if material.min > 0.0 {
                problem.add_constraint(format!("{}_min", material.id), unit_row(n, i), ConstraintOp::Ge, material.min);
            }
            if material.max < 100.0 {
                problem.add_constraint(format!("{}_max", material.id), unit_row(n, i), ConstraintOp::Le, material.max);
            }
        }
        for row in &quality {
            problem.add_constraint(
                row.name.clone(),
                row.expr.coefficients().to_vec(),
                row.op,
                -row.expr.constant_term(),
            );
        }

        debug!(
            materials = n,
            rows = problem.num_constraints(),
            quality_rows = quality.len(),
            mode = ?self.mode,
            "built blend model"
        );

        Ok(BlendModel {
            materials: self.materials,
            free_lime: self.operation.free_lime,
            mode: self.mode,
            balance,
            chain,
            quality,
            problem,
        })
    }
}

/// The blend within the material bounds that minimizes an affine function
/// with the given coefficients: every material at its minimum, then the
/// remainder poured into the lowest coefficients first.
fn lowest_z_blend(coefficients: &[f64], materials: &[Material]) -> Vec<f64> {
    let mut blend: Vec<f64> = materials.iter().map(|m| m.min).collect();
    let mut remaining = 100.0 - blend.iter().sum::<f64>();

    let mut order: Vec<usize> = (0..materials.len()).collect();
    order.sort_by(|&a, &b| coefficients[a].total_cmp(&coefficients[b]));
    for i in order {
        if remaining <= 0.0 {
            break;
        }
        let room = (materials[i].max - materials[i].min).min(remaining);
        blend[i] += room;
        remaining -= room;
    }
    blend
}

fn unit_row(n: usize, i: usize) -> Vec<f64> {
    let mut row = vec![0.0; n];
    row[i] = 1.0;
    row
}

/// A fully registered blend LP, ready to solve.
#[derive(Debug, Clone)]
pub struct BlendModel {
    materials: Vec<Material>,
    free_lime: f64,
    mode: ObjectiveMode,
    balance: MassBalance,
    chain: StageChain<LinearExpr>,
    quality: Vec<QualityConstraint>,
    problem: LpProblem,
}

impl BlendModel {
    pub fn problem(&self) -> &LpProblem {
        &self.problem
    }

    pub fn quality_constraints(&self) -> &[QualityConstraint] {
        &self.quality
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn balance(&self) -> &MassBalance {
        &self.balance
    }

    pub fn mode(&self) -> ObjectiveMode {
        self.mode
    }

    /// `C3S_lin = 4.07·(Ca_u − FCaO·Z/100) − 7.60·Si_u − 6.72·Al_u − 1.43·Fe_u`
    pub fn c3s_lin(&self) -> LinearExpr {
        let u = &self.chain.unignited;
        let cao_eff = u[Oxide::CaO].clone() - self.chain.z.clone() * (self.free_lime / 100.0);
        c3s(cao_eff, u)
    }

    /// Solve with `solver` and map its terminal status.
    pub fn solve(&self, solver: &dyn LpSolver) -> Result<SolvedBlend, BlendError> {
        let solution = solver.solve(&self.problem);
        let status = solution.status;
        let result = self.interpret(solution);
        info!(status = ?status, mode = ?self.mode, "blend solve finished");
        result
    }

    fn interpret(&self, solution: Solution) -> Result<SolvedBlend, BlendError> {
        match solution.status {
            SolutionStatus::Optimal => {}
            SolutionStatus::Infeasible => {
                return Err(BlendError::Infeasible {
                    violations: solution.violations,
                });
            }
            SolutionStatus::Unbounded => return Err(BlendError::Unbounded),
            SolutionStatus::Error => {
                return Err(BlendError::Solver(
                    solution.message.unwrap_or_else(|| "solver reported an error".to_string()),
                ));
            }
        }

        if solution.values.len() != self.materials.len() {
            return Err(BlendError::Solver(format!(
                "solver returned {} values for {} materials",
                solution.values.len(),
                self.materials.len()
            )));
        }
        let values = solution.values;

        for row in &self.quality {
            if !row.is_satisfied(&values, QUALITY_TOLERANCE) {
                warn!(constraint = %row.name, slack = row.slack(&values), "solver point violates quality row");
            }
        }

        let derived = DerivedQuantities {
            z: self.chain.z.evaluate(&values),
            loi_unignited: self.chain.unignited[Oxide::LOI].evaluate(&values),
            c3s_lin: self.c3s_lin().evaluate(&values),
            unignited: self.chain.unignited.map(|_, expr| expr.evaluate(&values)),
        };

        Ok(SolvedBlend {
            proportions: self
                .materials
                .iter()
                .zip(&values)
                .map(|(m, &proportion)| MaterialShare {
                    id: m.id.clone(),
                    proportion,
                })
                .collect(),
            objective_value: solution.objective_value,
            mode: self.mode,
            derived,
            analysis: solution.analysis,
        })
    }
}

/// Share of one material in the solved blend, percent.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialShare {
    pub id: String,
    pub proportion: f64,
}

/// The LP's own linear quantities evaluated at the solved point.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQuantities {
    pub z: f64,
    pub loi_unignited: f64,
    pub c3s_lin: f64,
    pub unignited: OxideVector<f64>,
}

/// An optimal blend.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct SolvedBlend {
    pub proportions: Vec<MaterialShare>,
    /// Objective as posed, including the feasibility-mode weight
    pub objective_value: f64,
    pub mode: ObjectiveMode,
    pub derived: DerivedQuantities,
    pub analysis: Analysis,
}

impl SolvedBlend {
    /// Proportions in material order
    pub fn values(&self) -> Vec<f64> {
        self.proportions.iter().map(|s| s.proportion).collect()
    }

    pub fn proportion(&self, id: &str) -> Option<f64> {
        self.proportions.iter().find(|s| s.id == id).map(|s| s.proportion)
    }
}

/// Build the model for the given inputs and solve it in one call.
pub fn build_and_solve(
    materials: Vec<Material>,
    dust: DustStream,
    ash: AshLoad,
    operation: OperationalConstants,
    targets: QualityTargets,
    mode: ObjectiveMode,
    solver: &dyn LpSolver,
) -> Result<SolvedBlend, BlendError> {
    BlendOptimizer::new(materials, dust, ash, operation)
        .with_targets(targets)
        .with_mode(mode)
        .build()?
        .solve(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use crate::fuel;
    use crate::operation::DustRoute;
    use crate::oxide::Composition;
    use crate::pipeline::clinker;
    use crate::quality::{Bogue, Moduli};
    use crate::targets::{Limits, QualityIndex};
    use rawmix_solver::Solver;

    fn reference_ash(operation: &OperationalConstants) -> AshLoad {
        fuel::summarize(&defaults::fuel_mix(), operation).unwrap().ash_load()
    }

    fn reference_optimizer(operation: OperationalConstants) -> BlendOptimizer {
        let ash = reference_ash(&operation);
        BlendOptimizer::new(defaults::reference_materials(), defaults::dust(), ash, operation)
            .with_targets(defaults::quality_targets())
    }

    fn assert_within(limits: Limits, value: f64, label: &str) {
        assert!(limits.contains(value, 1e-6), "{label} = {value} outside {limits:?}");
    }

    #[test]
    fn test_reference_blend_is_optimal() {
        let model = reference_optimizer(defaults::operation()).build().unwrap();
        let blend = model.solve(&Solver::new()).unwrap();

        let values = blend.values();
        let total: f64 = values.iter().sum();
        assert!((total - 100.0).abs() < 1e-6, "sum = {total}");
        for (material, share) in model.materials().iter().zip(&blend.proportions) {
            assert_eq!(material.id, share.id);
            assert_within(Limits::between(material.min, material.max), share.proportion, &share.id);
        }

        let chain = model.balance().stages(&values).unwrap();
        let cl = clinker(&chain.unignited).unwrap();
        let moduli = Moduli::of(&cl);
        let bogue = Bogue::from_clinker(&cl, 1.0);
        let targets = defaults::quality_targets();

        assert_within(targets.lsf, moduli.lsf, "LSF");
        assert_within(targets.sm, moduli.sm, "SM");
        assert_within(targets.am, moduli.am, "AM");
        assert_within(targets.limits(QualityIndex::NaEq), moduli.na_eq, "NaEq");
        assert_within(targets.c3s, bogue.c3s, "C3S");

        // Limestone carries the blend
        assert!(blend.proportion("LS").unwrap() > 75.0);
    }

    #[test]
    fn test_derived_quantities_match_clinker() {
        let model = reference_optimizer(defaults::operation()).build().unwrap();
        let blend = model.solve(&Solver::new()).unwrap();
        let derived = &blend.derived;

        assert!((derived.z + derived.loi_unignited - 100.0).abs() < 1e-9);

        let cl = clinker(&derived.unignited).unwrap();
        let bogue = Bogue::from_clinker(&cl, 1.0);
        // C3S_lin is the clinker C3S on the unignited scale
        assert!((derived.c3s_lin * 100.0 / derived.z - bogue.c3s).abs() < 1e-9);
    }

    #[test]
    fn test_tight_lsf_is_infeasible() {
        let mut targets = defaults::quality_targets();
        targets.lsf = Limits::between(99.0, 100.0);
        let result = reference_optimizer(defaults::operation())
            .with_targets(targets)
            .build()
            .unwrap()
            .solve(&Solver::new());

        assert!(matches!(result, Err(BlendError::Infeasible { .. })), "{result:?}");
        assert_eq!(SolveStatus::of(&result), Some(SolveStatus::Infeasible));
    }

    #[test]
    fn test_unconstrained_feasibility_is_optimal() {
        let blend = reference_optimizer(defaults::operation())
            .with_targets(QualityTargets::unconstrained())
            .build()
            .unwrap()
            .solve(&Solver::new())
            .unwrap();

        let total: f64 = blend.values().iter().sum();
        assert!((total - 100.0).abs() < 1e-6);
        for (material, share) in defaults::reference_materials().iter().zip(&blend.proportions) {
            assert_within(Limits::between(material.min, material.max), share.proportion, &share.id);
        }
    }

    #[test]
    fn test_cost_and_feasibility_modes_agree() {
        let solver = Solver::new();
        let feasibility = reference_optimizer(defaults::operation())
            .build()
            .unwrap()
            .solve(&solver)
            .unwrap();
        let cost = reference_optimizer(defaults::operation())
            .with_mode(ObjectiveMode::CostMinimization)
            .build()
            .unwrap()
            .solve(&solver)
            .unwrap();

        // The tie-break weight only scales the objective
        let scaled = feasibility.objective_value / ObjectiveMode::TIE_BREAK_WEIGHT;
        assert!(
            (scaled - cost.objective_value).abs() < 1e-9 * cost.objective_value,
            "{scaled} vs {}",
            cost.objective_value
        );
        for (a, b) in feasibility.values().iter().zip(cost.values()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_kiln_route_matches_equivalent_silo_route() {
        let solver = Solver::new();
        let silo = reference_optimizer(defaults::operation())
            .with_mode(ObjectiveMode::CostMinimization)
            .build()
            .unwrap()
            .solve(&solver)
            .unwrap();

        let mut operation = defaults::operation();
        operation.dust_route = DustRoute::Kiln(0.1 / 0.9);
        let kiln = reference_optimizer(operation)
            .with_mode(ObjectiveMode::CostMinimization)
            .build()
            .unwrap()
            .solve(&solver)
            .unwrap();

        assert!((silo.objective_value - kiln.objective_value).abs() < 1e-9 * silo.objective_value);
        for (a, b) in silo.values().iter().zip(kiln.values()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_model_rows() {
        let model = reference_optimizer(defaults::operation()).build().unwrap();
        let names: Vec<&str> = model.problem().constraints.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names[0], SUM_ROW);
        // SS has no lower bound, neither does CS
        for bound in ["LS_min", "LS_max", "CY_min", "CY_max", "SS_max", "CS_max"] {
            assert!(names.contains(&bound), "missing {bound}");
        }
        assert!(!names.contains(&"SS_min"));
        assert_eq!(model.quality_constraints().len(), 9);
        assert_eq!(model.problem().num_constraints(), 1 + 6 + 9);

        let objective = &model.problem().objective.coefficients;
        assert!((objective[0] - 45.0 * ObjectiveMode::TIE_BREAK_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn test_quality_rows_move_constant_to_rhs() {
        let model = reference_optimizer(defaults::operation()).build().unwrap();
        let point = [81.6, 13.9, 3.75, 0.75];
        for row in model.quality_constraints() {
            let lp_row = model
                .problem()
                .constraints
                .iter()
                .find(|c| c.name == row.name)
                .unwrap();
            let expected = row.expr.evaluate(&point);
            assert!((lp_row.lhs(&point) - lp_row.rhs - expected).abs() < 1e-9, "{}", row.name);
        }
    }

    #[test]
    fn test_non_positive_z_rejected_before_solving() {
        // Pure volatile material with LOI-free dust lost from the system
        let (mut materials, dust, operation) = volatile_scenario();
        for m in &mut materials {
            m.min = 0.0;
        }
        materials.push(Material::new("VOL", volatile()));

        let err = BlendOptimizer::new(materials, dust, AshLoad::none(), operation)
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConstants(msg) if msg.contains("VOL=100")));
    }

    #[test]
    fn test_capped_volatile_material_is_accepted() {
        // Z would be negative for pure VOL, but the bounds never allow more than 1%
        let (mut materials, dust, operation) = volatile_scenario();
        materials.push(Material::new("VOL", volatile()).with_bounds(0.0, 1.0));

        let model = BlendOptimizer::new(materials, dust, AshLoad::none(), operation)
            .build()
            .unwrap();
        assert_eq!(model.materials().len(), 5);
    }

    #[test]
    fn test_lowest_z_blend_respects_bounds() {
        let materials = vec![
            Material::new("A", Composition::new()).with_bounds(10.0, 80.0),
            Material::new("B", Composition::new()).with_bounds(0.0, 30.0),
            Material::new("C", Composition::new()).with_bounds(5.0, 100.0),
        ];
        let blend = lowest_z_blend(&[0.5, -2.0, 1.0], &materials);
        assert_eq!(blend, vec![65.0, 30.0, 5.0]);
    }

    fn volatile() -> Composition {
        Oxide::ALL
            .into_iter()
            .map(|oxide| (oxide, if oxide == Oxide::LOI { 100.0 } else { 0.0 }))
            .collect()
    }

    fn volatile_scenario() -> (Vec<Material>, DustStream, OperationalConstants) {
        let mut dust = defaults::dust();
        dust.composition.insert(Oxide::LOI, 0.0);
        let mut operation = defaults::operation();
        operation.dust_route = DustRoute::Kiln(0.0);
        (defaults::reference_materials(), dust, operation)
    }

    #[test]
    fn test_bounds_conflict_rejected_before_solving() {
        let mut materials = defaults::reference_materials();
        materials[0] = materials[0].clone().with_bounds(96.0, 100.0);
        let operation = defaults::operation();
        let result = build_and_solve(
            materials,
            defaults::dust(),
            reference_ash(&operation),
            operation,
            defaults::quality_targets(),
            ObjectiveMode::Feasibility,
            &Solver::new(),
        );
        assert!(matches!(result, Err(BlendError::Model(ModelError::BoundsConflict(_)))));
        assert_eq!(SolveStatus::of(&result), None);
    }

    struct Canned(Solution);

    impl LpSolver for Canned {
        fn solve(&self, _problem: &LpProblem) -> Solution {
            self.0.clone()
        }
    }

    #[test]
    fn test_solver_outcomes_are_surfaced() {
        let model = reference_optimizer(defaults::operation()).build().unwrap();

        let unbounded = model.solve(&Canned(Solution::unbounded()));
        assert!(matches!(unbounded, Err(BlendError::Unbounded)));

        let failed = model.solve(&Canned(Solution::error("license expired")));
        assert!(matches!(&failed, Err(BlendError::Solver(msg)) if msg == "license expired"));
        assert_eq!(SolveStatus::of(&failed), Some(SolveStatus::SolverError));

        let mut short = Solution::error("");
        short.status = SolutionStatus::Optimal;
        short.values = vec![100.0];
        assert!(matches!(model.solve(&Canned(short)), Err(BlendError::Solver(_))));
    }
}
