//! Quality targets as linear inequalities over the blend proportions.
//!
//! Clinker-basis ratios would need a division by `Z` and by the ratio's own
//! denominator. Both sides are multiplied through instead, which keeps every
//! row linear:
//!
//! ```text
//! LSF ≥ m   ⇔   Ca_u − (m/100)(2.8·Si_u + 1.18·Al_u + 0.65·Fe_u) ≥ 0
//! NaEq ≤ m  ⇔   Na_u + 0.658·K_u − m·Z/100 ≤ 0
//! ```
//!
//! Moduli are invariant under the `100/Z` scaling, so they need no `Z` term;
//! absolute values (NaEq, C3S) are compared against `limit·Z/100`.

use rawmix_solver::ConstraintOp;

use crate::expr::LinearExpr;
use crate::oxide::{Oxide, OxideVector};
use crate::quality::{c3s, lsf_denominator, na_eq, sm_denominator};
use crate::targets::{Limits, QualityIndex, QualityTargets};

/// `expr op 0`
#[derive(Debug, Clone, PartialEq)]
pub struct QualityConstraint {
    pub name: String,
    pub index: QualityIndex,
    pub expr: LinearExpr,
    pub op: ConstraintOp,
}

impl QualityConstraint {
    /// Signed distance from the boundary, positive when satisfied
    pub fn slack(&self, proportions: &[f64]) -> f64 {
        let value = self.expr.evaluate(proportions);
        match self.op {
            ConstraintOp::Ge => value,
            ConstraintOp::Le => -value,
            ConstraintOp::Eq => -value.abs(),
        }
    }

    pub fn is_satisfied(&self, proportions: &[f64], tolerance: f64) -> bool {
        self.slack(proportions) >= -tolerance
    }
}

/// Numerator and limit-scaled denominator of one target, so that
/// `numerator − limit·per_unit` has the sign of `value − limit`.
struct RatioForm {
    numerator: LinearExpr,
    per_unit: LinearExpr,
}

fn ratio_form(
    index: QualityIndex,
    unignited: &OxideVector<LinearExpr>,
    z: &LinearExpr,
    free_lime: f64,
) -> RatioForm {
    let z_fraction = z.clone() * 0.01;
    match index {
        QualityIndex::Lsf => RatioForm {
            numerator: unignited[Oxide::CaO].clone(),
            per_unit: lsf_denominator(unignited) * 0.01,
        },
        QualityIndex::Sm => RatioForm {
            numerator: unignited[Oxide::SiO2].clone(),
            per_unit: sm_denominator(unignited),
        },
        QualityIndex::Am => RatioForm {
            numerator: unignited[Oxide::Al2O3].clone(),
            per_unit: unignited[Oxide::Fe2O3].clone(),
        },
        QualityIndex::NaEq => RatioForm {
            numerator: na_eq(unignited),
            per_unit: z_fraction,
        },
        QualityIndex::C3s => {
            let cao_eff = unignited[Oxide::CaO].clone() - z_fraction.clone() * free_lime;
            RatioForm {
                numerator: c3s(cao_eff, unignited),
                per_unit: z_fraction,
            }
        }
    }
}

/// The linear rows for every bound present in `targets`.
pub fn build_quality_constraints(
    unignited: &OxideVector<LinearExpr>,
    z: &LinearExpr,
    targets: &QualityTargets,
    free_lime: f64,
) -> Vec<QualityConstraint> {
    let indices = [
        QualityIndex::Lsf,
        QualityIndex::Sm,
        QualityIndex::Am,
        QualityIndex::NaEq,
        QualityIndex::C3s,
    ];

    let mut rows = Vec::new();
    for index in indices {
        let Limits { min, max } = targets.limits(index);
        if min.is_none() && max.is_none() {
            continue;
        }
        let form = ratio_form(index, unignited, z, free_lime);
        let bounds = [(min, ConstraintOp::Ge, "min"), (max, ConstraintOp::Le, "max")];
        for (limit, op, suffix) in bounds {
            let Some(limit) = limit else { continue };
            rows.push(QualityConstraint {
                name: format!("{index}_{suffix}"),
                index,
                expr: form.numerator.clone() - form.per_unit.clone() * limit,
                op,
            });
        }
    }
    rows
}
