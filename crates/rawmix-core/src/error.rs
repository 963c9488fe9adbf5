use rawmix_solver::ConstraintViolation;
use thiserror::Error;

use crate::oxide::Oxide;

/// Input defects detected before the solver is invoked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid operating constants: {0}")]
    InvalidConstants(String),
    #[error("Degenerate fuel mix: {0}")]
    DegenerateFuelMix(String),
    #[error("{owner} is missing required oxide {oxide}")]
    MissingOxide { owner: String, oxide: Oxide },
    #[error("Bounds conflict: {0}")]
    BoundsConflict(String),
    #[error("{owner}: {oxide} = {value} is outside 0..=100")]
    InvalidComposition { owner: String, oxide: Oxide, value: f64 },
    #[error("Invalid fuel {fuel}: {reason}")]
    InvalidFuel { fuel: String, reason: String },
    #[error("At least 2 raw materials are required, got {0}")]
    NotEnoughMaterials(usize),
    #[error("Duplicate material: {0}")]
    DuplicateMaterial(String),
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),
    #[error("Expected {expected} proportions, got {found}")]
    ProportionCount { expected: usize, found: usize },
}

/// Everything that can stop a blend optimization.
#[derive(Error, Debug, Clone)]
pub enum BlendError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("No blend satisfies every constraint")]
    Infeasible { violations: Vec<ConstraintViolation> },
    #[error("The blend problem is unbounded")]
    Unbounded,
    #[error("Solver error: {0}")]
    Solver(String),
}
