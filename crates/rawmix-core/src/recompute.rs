//! Numeric replay of the mass balance for a given blend.

use tracing::warn;

use crate::error::ModelError;
use crate::fuel::AshLoad;
use crate::material::{DustStream, Material};
use crate::operation::OperationalConstants;
use crate::optimizer::DerivedQuantities;
use crate::oxide::{Oxide, OxideVector};
use crate::pipeline::{MassBalance, clinker};
use crate::quality::{Bogue, Moduli};

/// Quality moduli at each stage with a meaningful composition.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageModuli {
    pub raw_meal: Moduli,
    pub kiln_feed: Moduli,
    pub clinker: Moduli,
}

/// Every stage of the kiln line for one proportion vector.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Recomputation {
    pub proportions: Vec<f64>,
    pub raw_meal: OxideVector<f64>,
    pub kiln_feed: OxideVector<f64>,
    pub unignited: OxideVector<f64>,
    pub clinker: OxideVector<f64>,
    pub z: f64,
    pub moduli: StageModuli,
    /// Unclamped Bogue phases
    pub bogue: Bogue,
}

impl Recomputation {
    pub fn from_balance(balance: &MassBalance, proportions: &[f64], free_lime: f64) -> Result<Self, ModelError> {
        let chain = balance.stages(proportions)?;
        let clinker = clinker(&chain.unignited)?;

        Ok(Self {
            proportions: proportions.to_vec(),
            moduli: StageModuli {
                raw_meal: Moduli::of(&chain.raw_meal),
                kiln_feed: Moduli::of(&chain.kiln_feed),
                clinker: Moduli::of(&clinker),
            },
            bogue: Bogue::from_clinker(&clinker, free_lime),
            raw_meal: chain.raw_meal,
            kiln_feed: chain.kiln_feed,
            unignited: chain.unignited,
            clinker,
            z: chain.z,
        })
    }

    /// Bogue phases as shown to operators
    pub fn bogue_display(&self) -> Bogue {
        self.bogue.clamped()
    }

    /// Largest absolute gap between these values and the LP's own
    /// evaluation of the same blend.
    pub fn drift(&self, derived: &DerivedQuantities) -> f64 {
        Oxide::ALL
            .iter()
            .map(|&oxide| (self.unignited[oxide] - derived.unignited[oxide]).abs())
            .fold((self.z - derived.z).abs(), f64::max)
    }

    /// Whether the replay agrees with the LP within `tolerance`
    pub fn is_consistent_with(&self, derived: &DerivedQuantities, tolerance: f64) -> bool {
        let drift = self.drift(derived);
        if drift > tolerance {
            warn!(drift, tolerance, "recomputed blend drifts from solver values");
            return false;
        }
        true
    }
}

/// Replay the pipeline from raw inputs.
pub fn recompute(
    materials: &[Material],
    proportions: &[f64],
    dust: &DustStream,
    ash: &AshLoad,
    operation: &OperationalConstants,
) -> Result<Recomputation, ModelError> {
    let balance = MassBalance::new(materials, dust, ash, operation)?;
    Recomputation::from_balance(&balance, proportions, operation.free_lime)
}
