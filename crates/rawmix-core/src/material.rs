use std::collections::HashSet;

use crate::error::ModelError;
use crate::oxide::{Composition, OxideVector};

/// A raw material fed to the mill.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: String,
    /// Dry-basis analysis
    pub composition: Composition,
    /// Free moisture (H2O %), informational only
    #[cfg_attr(feature = "serde", serde(default))]
    pub moisture: f64,
    /// Cost per tonne
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: f64,
    /// Lowest allowed share of the blend, percent
    #[cfg_attr(feature = "serde", serde(default))]
    pub min: f64,
    /// Highest allowed share of the blend, percent
    #[cfg_attr(feature = "serde", serde(default = "full_share"))]
    pub max: f64,
}

#[cfg(feature = "serde")]
fn full_share() -> f64 {
    100.0
}

impl Material {
    pub fn new(id: impl Into<String>, composition: Composition) -> Self {
        Self {
            id: id.into(),
            composition,
            moisture: 0.0,
            cost: 0.0,
            min: 0.0,
            max: 100.0,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_moisture(mut self, moisture: f64) -> Self {
        self.moisture = moisture;
        self
    }

    pub fn resolve(&self) -> Result<OxideVector<f64>, ModelError> {
        self.composition.resolve(&self.id)
    }
}

/// Kiln dust collected by the filters and returned to the process.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DustStream {
    pub composition: Composition,
}

impl DustStream {
    pub fn new(composition: Composition) -> Self {
        Self { composition }
    }

    pub fn resolve(&self) -> Result<OxideVector<f64>, ModelError> {
        self.composition.resolve("dust")
    }
}

/// Check the material table as a whole: count, identifiers, compositions,
/// costs and proportion bounds.
pub fn validate_materials(materials: &[Material]) -> Result<(), ModelError> {
    if materials.len() < 2 {
        return Err(ModelError::NotEnoughMaterials(materials.len()));
    }

    let mut seen = HashSet::new();
    for m in materials {
        if !seen.insert(m.id.as_str()) {
            return Err(ModelError::DuplicateMaterial(m.id.clone()));
        }
        m.composition.validate(&m.id)?;
        if !m.cost.is_finite() || m.cost < 0.0 {
            return Err(ModelError::BoundsConflict(format!(
                "{} has invalid cost {}",
                m.id, m.cost
            )));
        }
        if !(0.0..=100.0).contains(&m.min) || !(0.0..=100.0).contains(&m.max) {
            return Err(ModelError::BoundsConflict(format!(
                "{} bounds [{}, {}] must lie within 0..=100",
                m.id, m.min, m.max
            )));
        }
        if m.min > m.max {
            return Err(ModelError::BoundsConflict(format!(
                "{} min {} exceeds max {}",
                m.id, m.min, m.max
            )));
        }
    }

    let min_total: f64 = materials.iter().map(|m| m.min).sum();
    if min_total > 100.0 + 1e-9 {
        return Err(ModelError::BoundsConflict(format!(
            "minimum shares add up to {min_total}, above 100"
        )));
    }
    let max_total: f64 = materials.iter().map(|m| m.max).sum();
    if max_total < 100.0 - 1e-9 {
        return Err(ModelError::BoundsConflict(format!(
            "maximum shares add up to {max_total}, below 100"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;

    #[test]
    fn test_reference_materials_are_valid() {
        assert!(validate_materials(&defaults::reference_materials()).is_ok());
    }

    #[test]
    fn test_min_above_max() {
        let mut materials = defaults::reference_materials();
        materials[1] = materials[1].clone().with_bounds(30.0, 20.0);
        assert!(matches!(
            validate_materials(&materials),
            Err(ModelError::BoundsConflict(msg)) if msg.contains("CY")
        ));
    }

    #[test]
    fn test_minimums_above_hundred() {
        let mut materials = defaults::reference_materials();
        materials[0] = materials[0].clone().with_bounds(90.0, 95.0);
        materials[1] = materials[1].clone().with_bounds(15.0, 25.0);
        assert!(matches!(
            validate_materials(&materials),
            Err(ModelError::BoundsConflict(_))
        ));
    }

    #[test]
    fn test_maximums_below_hundred() {
        let materials: Vec<Material> = defaults::reference_materials()
            .into_iter()
            .map(|m| m.with_bounds(0.0, 20.0))
            .collect();
        assert!(validate_materials(&materials).is_err());
    }

    #[test]
    fn test_single_material_rejected() {
        let materials = vec![defaults::reference_materials().remove(0)];
        assert_eq!(
            validate_materials(&materials),
            Err(ModelError::NotEnoughMaterials(1))
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut materials = defaults::reference_materials();
        materials[2].id = "LS".to_string();
        assert_eq!(
            validate_materials(&materials),
            Err(ModelError::DuplicateMaterial("LS".to_string()))
        );
    }
}
