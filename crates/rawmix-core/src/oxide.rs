//! Oxide vocabulary and per-oxide containers.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::ModelError;

/// Chemical components tracked through every stage of the kiln line.
#[allow(clippy::upper_case_acronyms)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Oxide {
    SiO2,
    Al2O3,
    Fe2O3,
    CaO,
    MgO,
    K2O,
    Na2O,
    SO3,
    Cl,
    /// Loss on ignition
    LOI,
}

impl Oxide {
    pub const COUNT: usize = 10;

    pub const ALL: [Oxide; Oxide::COUNT] = [
        Oxide::SiO2,
        Oxide::Al2O3,
        Oxide::Fe2O3,
        Oxide::CaO,
        Oxide::MgO,
        Oxide::K2O,
        Oxide::Na2O,
        Oxide::SO3,
        Oxide::Cl,
        Oxide::LOI,
    ];

    /// Oxides the quality model cannot do without
    pub const REQUIRED: [Oxide; 7] = [
        Oxide::SiO2,
        Oxide::Al2O3,
        Oxide::Fe2O3,
        Oxide::CaO,
        Oxide::K2O,
        Oxide::Na2O,
        Oxide::LOI,
    ];

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Oxide::SiO2 => "SiO2",
            Oxide::Al2O3 => "Al2O3",
            Oxide::Fe2O3 => "Fe2O3",
            Oxide::CaO => "CaO",
            Oxide::MgO => "MgO",
            Oxide::K2O => "K2O",
            Oxide::Na2O => "Na2O",
            Oxide::SO3 => "SO3",
            Oxide::Cl => "Cl",
            Oxide::LOI => "LOI",
        }
    }
}

impl fmt::Display for Oxide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An analysed composition as supplied by the lab, in percent.
///
/// Oxides may be absent; [`Composition::resolve`] decides whether an absent
/// oxide is an error or a zero.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition(BTreeMap<Oxide, f64>);

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, oxide: Oxide, value: f64) -> Self {
        self.0.insert(oxide, value);
        self
    }

    pub fn get(&self, oxide: Oxide) -> Option<f64> {
        self.0.get(&oxide).copied()
    }

    pub fn insert(&mut self, oxide: Oxide, value: f64) {
        self.0.insert(oxide, value);
    }

    pub fn remove(&mut self, oxide: Oxide) -> Option<f64> {
        self.0.remove(&oxide)
    }

    /// Every supplied value must be a percentage
    pub fn validate(&self, owner: &str) -> Result<(), ModelError> {
        for (&oxide, &value) in &self.0 {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ModelError::InvalidComposition {
                    owner: owner.to_string(),
                    oxide,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Expand to a full oxide vector. Required oxides must be present;
    /// optional ones default to zero.
    pub fn resolve(&self, owner: &str) -> Result<OxideVector<f64>, ModelError> {
        self.validate(owner)?;
        for oxide in Oxide::REQUIRED {
            if !self.0.contains_key(&oxide) {
                return Err(ModelError::MissingOxide {
                    owner: owner.to_string(),
                    oxide,
                });
            }
        }
        Ok(self.resolve_lenient())
    }

    /// Expand to a full oxide vector with every absent oxide read as zero
    pub fn resolve_lenient(&self) -> OxideVector<f64> {
        OxideVector::from_fn(|oxide| self.get(oxide).unwrap_or(0.0))
    }
}

impl FromIterator<(Oxide, f64)> for Composition {
    fn from_iter<I: IntoIterator<Item = (Oxide, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One value per [`Oxide`], in [`Oxide::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct OxideVector<T> {
    values: [T; Oxide::COUNT],
}

impl<T> OxideVector<T> {
    pub fn from_fn(mut f: impl FnMut(Oxide) -> T) -> Self {
        Self {
            values: std::array::from_fn(|i| f(Oxide::ALL[i])),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Oxide, &T) -> U) -> OxideVector<U> {
        OxideVector::from_fn(|oxide| f(oxide, &self[oxide]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Oxide, &T)> {
        Oxide::ALL.into_iter().zip(self.values.iter())
    }
}

impl<T> Index<Oxide> for OxideVector<T> {
    type Output = T;

    fn index(&self, oxide: Oxide) -> &T {
        &self.values[oxide as usize]
    }
}

impl<T> IndexMut<Oxide> for OxideVector<T> {
    fn index_mut(&mut self, oxide: Oxide) -> &mut T {
        &mut self.values[oxide as usize]
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for OxideVector<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Oxide::COUNT))?;
        for (oxide, value) in self.iter() {
            map.serialize_entry(oxide.symbol(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fills_optional_oxides() {
        let composition = Composition::new()
            .with(Oxide::SiO2, 14.0)
            .with(Oxide::Al2O3, 3.5)
            .with(Oxide::Fe2O3, 2.1)
            .with(Oxide::CaO, 43.0)
            .with(Oxide::K2O, 0.4)
            .with(Oxide::Na2O, 0.1)
            .with(Oxide::LOI, 35.0);

        let resolved = composition.resolve("meal").unwrap();
        assert_eq!(resolved[Oxide::CaO], 43.0);
        assert_eq!(resolved[Oxide::MgO], 0.0);
        assert_eq!(resolved[Oxide::Cl], 0.0);
    }

    #[test]
    fn test_resolve_reports_missing_required_oxide() {
        let composition = Composition::new().with(Oxide::SiO2, 14.0).with(Oxide::CaO, 43.0);

        let err = composition.resolve("clay").unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingOxide {
                owner: "clay".to_string(),
                oxide: Oxide::Al2O3
            }
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let composition = Composition::new().with(Oxide::CaO, 104.0);
        assert!(matches!(
            composition.validate("limestone"),
            Err(ModelError::InvalidComposition { oxide: Oxide::CaO, .. })
        ));

        let negative = Composition::new().with(Oxide::SiO2, -0.5);
        assert!(negative.validate("sand").is_err());
    }

    #[test]
    fn test_vector_indexing_follows_oxide_order() {
        let v = OxideVector::from_fn(|oxide| oxide as usize as f64);
        assert_eq!(v[Oxide::SiO2], 0.0);
        assert_eq!(v[Oxide::LOI], 9.0);
        let labels: Vec<&str> = v.iter().map(|(oxide, _)| oxide.symbol()).collect();
        assert_eq!(labels.first(), Some(&"SiO2"));
        assert_eq!(labels.last(), Some(&"LOI"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_vector_serializes_by_symbol() {
        let v = OxideVector::from_fn(|oxide| if oxide == Oxide::CaO { 65.5 } else { 0.0 });
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["CaO"], 65.5);
        assert_eq!(json["LOI"], 0.0);
        assert_eq!(json.as_object().unwrap().len(), Oxide::COUNT);
    }
}
