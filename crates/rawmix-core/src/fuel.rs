//! Fuel mix aggregation: calorific value, fuel rate and the ash load the
//! burning fuel adds to the clinker.

use tracing::warn;

use crate::error::ModelError;
use crate::operation::OperationalConstants;
use crate::oxide::{Composition, Oxide, OxideVector};

/// A fuel in the kiln firing mix.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Fuel {
    pub id: String,
    /// Ash analysis; required oxides must be present when the fuel carries ash
    #[cfg_attr(feature = "serde", serde(default))]
    pub composition: Composition,
    /// Calorific value, kcal/kg
    pub calorific_value: f64,
    /// Ash content, percent
    pub ash: f64,
    /// Sulfur content, percent
    #[cfg_attr(feature = "serde", serde(default))]
    pub sulfur: f64,
    /// Share of the fuel mix; normalized to 100 before use
    pub proportion: f64,
    /// Alternative (non-primary) fuel
    #[cfg_attr(feature = "serde", serde(default))]
    pub alternative: bool,
}

impl Fuel {
    pub fn new(id: impl Into<String>, calorific_value: f64, ash: f64, proportion: f64) -> Self {
        Self {
            id: id.into(),
            composition: Composition::new(),
            calorific_value,
            ash,
            sulfur: 0.0,
            proportion,
            alternative: false,
        }
    }

    pub fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = composition;
        self
    }

    pub fn with_sulfur(mut self, sulfur: f64) -> Self {
        self.sulfur = sulfur;
        self
    }

    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    /// Ash analysis as a full vector. A fuel that actually delivers ash
    /// must carry every required oxide; optional ones default to zero.
    fn ash_analysis(&self, ash_tph: f64) -> Result<OxideVector<f64>, ModelError> {
        if ash_tph > 0.0 {
            self.composition.resolve(&self.id)
        } else {
            Ok(self.composition.resolve_lenient())
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::InvalidFuel {
            fuel: self.id.clone(),
            reason,
        };
        if !self.calorific_value.is_finite() || self.calorific_value < 0.0 {
            return Err(invalid(format!("calorific value {} is negative", self.calorific_value)));
        }
        if !self.proportion.is_finite() || self.proportion < 0.0 {
            return Err(invalid(format!("proportion {} is negative", self.proportion)));
        }
        for (name, value) in [("ash", self.ash), ("sulfur", self.sulfur)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(invalid(format!("{name} {value} is not a percentage")));
            }
        }
        self.composition.validate(&self.id)
    }
}

/// Ash entering the clinker from the burning fuel.
#[derive(Debug, Clone, PartialEq)]
pub struct AshLoad {
    pub composition: OxideVector<f64>,
    /// Total ash rate, t/h
    pub total_tph: f64,
}

impl AshLoad {
    /// No ash at all, e.g. for checking a meal in isolation
    pub fn none() -> Self {
        Self {
            composition: OxideVector::from_fn(|_| 0.0),
            total_tph: 0.0,
        }
    }
}

/// Per-fuel rates after normalization.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FuelFlow {
    pub fuel: String,
    /// Normalized share of the mix, percent
    pub proportion: f64,
    pub fuel_tph: f64,
    pub ash_tph: f64,
    pub sulfur_tph: f64,
}

/// Aggregate of the whole firing mix.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FuelSummary {
    /// Proportion-weighted calorific value, kcal/kg
    pub cv_total: f64,
    pub total_fuel_tph: f64,
    pub total_ash_tph: f64,
    /// Ash-weighted ash analysis
    pub ash_composition: OxideVector<f64>,
    /// Heat supplied by alternative fuels, percent of total heat
    pub alternative_heat_share: f64,
    pub flows: Vec<FuelFlow>,
}

impl FuelSummary {
    pub fn ash_load(&self) -> AshLoad {
        AshLoad {
            composition: self.ash_composition.clone(),
            total_tph: self.total_ash_tph,
        }
    }
}

/// Scale fuel proportions so they sum to 100.
pub fn normalize_proportions(fuels: &[Fuel]) -> Result<Vec<Fuel>, ModelError> {
    let total: f64 = fuels.iter().map(|f| f.proportion).sum();
    if total.is_nan() || total <= 0.0 {
        return Err(ModelError::DegenerateFuelMix(format!(
            "fuel proportions sum to {total}"
        )));
    }
    if (total - 100.0).abs() > 1e-9 {
        warn!(total, "fuel proportions do not sum to 100, normalizing");
    }
    Ok(fuels
        .iter()
        .map(|f| Fuel {
            proportion: f.proportion / total * 100.0,
            ..f.clone()
        })
        .collect())
}

/// Proportion-weighted calorific value of the mix.
pub fn cv_total(fuels: &[Fuel]) -> f64 {
    let total: f64 = fuels.iter().map(|f| f.proportion).sum();
    if total <= 0.0 {
        return 0.0;
    }
    fuels.iter().map(|f| f.proportion * f.calorific_value).sum::<f64>() / total
}

/// Share of heat released by alternative fuels, percent.
pub fn alternative_heat_share(fuels: &[Fuel]) -> f64 {
    let heat = |f: &Fuel| f.proportion * f.calorific_value;
    let total: f64 = fuels.iter().map(heat).sum();
    if total <= 0.0 {
        return 0.0;
    }
    fuels.iter().filter(|f| f.alternative).map(heat).sum::<f64>() / total * 100.0
}

/// Aggregate the firing mix for the given operating point.
pub fn summarize(fuels: &[Fuel], operation: &OperationalConstants) -> Result<FuelSummary, ModelError> {
    for fuel in fuels {
        fuel.validate()?;
    }
    let fuels = normalize_proportions(fuels)?;

    let cv_total = cv_total(&fuels);
    if cv_total <= 0.0 {
        return Err(ModelError::DegenerateFuelMix(format!(
            "total calorific value is {cv_total}"
        )));
    }
    let total_fuel_tph = operation.stec * operation.clinker_tph / cv_total;

    let flows: Vec<FuelFlow> = fuels
        .iter()
        .map(|f| {
            let fuel_tph = f.proportion / 100.0 * total_fuel_tph;
            FuelFlow {
                fuel: f.id.clone(),
                proportion: f.proportion,
                fuel_tph,
                ash_tph: f.ash / 100.0 * fuel_tph,
                sulfur_tph: f.sulfur / 100.0 * fuel_tph,
            }
        })
        .collect();

    let total_ash_tph: f64 = flows.iter().map(|f| f.ash_tph).sum();
    let ash_composition = if total_ash_tph > 0.0 {
        let analyses = fuels
            .iter()
            .zip(&flows)
            .map(|(f, flow)| f.ash_analysis(flow.ash_tph))
            .collect::<Result<Vec<_>, _>>()?;
        OxideVector::from_fn(|oxide: Oxide| {
            flows
                .iter()
                .zip(&analyses)
                .map(|(flow, analysis)| flow.ash_tph * analysis[oxide])
                .sum::<f64>()
                / total_ash_tph
        })
    } else {
        OxideVector::from_fn(|_| 0.0)
    };

    Ok(FuelSummary {
        cv_total,
        total_fuel_tph,
        total_ash_tph,
        ash_composition,
        alternative_heat_share: alternative_heat_share(&fuels),
        flows,
    })
}
