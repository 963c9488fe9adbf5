//! Mass balance from the mill to the clinker cooler.
//!
//! Raw Meal → Kiln Feed → Unignited → Clinker. Every stage except the last
//! is affine in the blend proportions because the dust route, tonnages and
//! ash load are fixed for the run; the functions here are generic over
//! [`Linear`] so the LP model and the post-solve report share them.

use crate::error::ModelError;
use crate::expr::Linear;
use crate::fuel::AshLoad;
use crate::material::{DustStream, Material};
use crate::operation::{DustRoute, OperationalConstants};
use crate::oxide::{Oxide, OxideVector};

/// Mass flows that fix the unignited basis for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tonnage {
    pub kiln_feed_tph: f64,
    pub dust_loss_tph: f64,
    pub ash_tph: f64,
    denominator: f64,
}

impl Tonnage {
    pub fn new(kiln_feed_tph: f64, dust_loss_tph: f64, ash_tph: f64) -> Result<Self, ModelError> {
        let denominator = kiln_feed_tph - dust_loss_tph + ash_tph;
        if !denominator.is_finite() || denominator <= 0.0 {
            return Err(ModelError::InvalidConstants(format!(
                "unignited mass {kiln_feed_tph} - {dust_loss_tph} + {ash_tph} = {denominator} is not positive"
            )));
        }
        Ok(Self {
            kiln_feed_tph,
            dust_loss_tph,
            ash_tph,
            denominator,
        })
    }

    /// `D = tonKF - tonDustLoss + totalAshTPH`
    pub fn denominator(&self) -> f64 {
        self.denominator
    }
}

/// Raw meal: proportion-weighted average of the material analyses.
pub fn raw_meal<T: Linear>(materials: &[OxideVector<f64>], proportions: &[T]) -> Result<OxideVector<T>, ModelError> {
    if materials.len() != proportions.len() {
        return Err(ModelError::ProportionCount {
            expected: materials.len(),
            found: proportions.len(),
        });
    }
    let Some(first) = proportions.first() else {
        return Err(ModelError::NotEnoughMaterials(0));
    };
    let zero = first.zero_like();

    Ok(OxideVector::from_fn(|oxide| {
        materials
            .iter()
            .zip(proportions)
            .fold(zero.clone(), |acc, (analysis, p)| acc + p.clone() * (analysis[oxide] / 100.0))
    }))
}

/// Kiln feed: raw meal with the returned dust mixed in.
pub fn kiln_feed<T: Linear>(raw_meal: &OxideVector<T>, dust: &OxideVector<f64>, route: DustRoute) -> OxideVector<T> {
    let (meal_weight, dust_weight) = match route {
        DustRoute::Silo(p) => (1.0 - p, p),
        DustRoute::Kiln(p) => (1.0 / (1.0 + p), p / (1.0 + p)),
    };
    raw_meal.map(|oxide, rm| rm.clone() * meal_weight + dust_weight * dust[oxide])
}

/// Unignited basis: kiln feed minus the dust lost plus the fuel ash, per
/// unit of `D`.
pub fn unignited<T: Linear>(
    kiln_feed: &OxideVector<T>,
    dust: &OxideVector<f64>,
    ash: &OxideVector<f64>,
    tonnage: &Tonnage,
) -> OxideVector<T> {
    let d = tonnage.denominator();
    kiln_feed.map(|oxide, kf| {
        let fixed = ash[oxide] * tonnage.ash_tph - dust[oxide] * tonnage.dust_loss_tph;
        kf.clone() * (tonnage.kiln_feed_tph / d) + fixed / d
    })
}

/// `Z = 100 - LOI_u`, the LOI-free share of the unignited mass.
pub fn loi_free_factor<T: Linear>(unignited: &OxideVector<T>) -> T {
    unignited[Oxide::LOI].clone() * -1.0 + 100.0
}

/// Clinker: unignited analysis rescaled to the LOI-free basis.
///
/// Only defined numerically, since dividing by `Z` is not linear.
pub fn clinker(unignited: &OxideVector<f64>) -> Result<OxideVector<f64>, ModelError> {
    let z = loi_free_factor(unignited);
    if !z.is_finite() || z <= 0.0 {
        return Err(ModelError::InvalidConstants(format!(
            "LOI-free factor Z = {z} is not positive"
        )));
    }
    Ok(unignited.map(|oxide, &u| if oxide == Oxide::LOI { 0.0 } else { u / z * 100.0 }))
}

/// The affine stages for one proportion vector.
#[derive(Debug, Clone)]
pub struct StageChain<T> {
    pub raw_meal: OxideVector<T>,
    pub kiln_feed: OxideVector<T>,
    pub unignited: OxideVector<T>,
    pub z: T,
}

/// Inputs of the mass balance resolved once per run.
#[derive(Debug, Clone)]
pub struct MassBalance {
    materials: Vec<OxideVector<f64>>,
    dust: OxideVector<f64>,
    ash: OxideVector<f64>,
    route: DustRoute,
    tonnage: Tonnage,
}

impl MassBalance {
    pub fn new(
        materials: &[Material],
        dust: &DustStream,
        ash: &AshLoad,
        operation: &OperationalConstants,
    ) -> Result<Self, ModelError> {
        operation.validate()?;
        let resolved = materials.iter().map(Material::resolve).collect::<Result<Vec<_>, _>>()?;
        let tonnage = Tonnage::new(operation.kiln_feed_tph, operation.dust_loss_tph(), ash.total_tph)?;

        Ok(Self {
            materials: resolved,
            dust: dust.resolve()?,
            ash: ash.composition.clone(),
            route: operation.dust_route,
            tonnage,
        })
    }

    pub fn tonnage(&self) -> &Tonnage {
        &self.tonnage
    }

    pub fn materials(&self) -> &[OxideVector<f64>] {
        &self.materials
    }

    pub fn stages<T: Linear>(&self, proportions: &[T]) -> Result<StageChain<T>, ModelError> {
        let raw_meal = raw_meal(&self.materials, proportions)?;
        let kiln_feed = kiln_feed(&raw_meal, &self.dust, self.route);
        let unignited = unignited(&kiln_feed, &self.dust, &self.ash, &self.tonnage);
        let z = loi_free_factor(&unignited);
        Ok(StageChain {
            raw_meal,
            kiln_feed,
            unignited,
            z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use crate::expr::LinearExpr;
    use crate::fuel;

    fn reference_balance(route: DustRoute) -> MassBalance {
        let mut operation = defaults::operation();
        operation.dust_route = route;
        let ash = fuel::summarize(&defaults::fuel_mix(), &operation).unwrap().ash_load();
        MassBalance::new(&defaults::reference_materials(), &defaults::dust(), &ash, &operation).unwrap()
    }

    #[test]
    fn test_raw_meal_is_weighted_average() {
        let materials: Vec<OxideVector<f64>> = defaults::reference_materials()
            .iter()
            .map(|m| m.resolve().unwrap())
            .collect();
        let proportions = [80.0, 14.0, 4.0, 2.0];

        let rm = raw_meal(&materials, &proportions).unwrap();

        for oxide in Oxide::ALL {
            let mut manual = 0.0;
            for (m, p) in materials.iter().zip(proportions) {
                manual += m[oxide] * p;
            }
            manual /= 100.0;
            assert!((rm[oxide] - manual).abs() < 1e-10, "{oxide}: {} vs {manual}", rm[oxide]);
        }
    }

    #[test]
    fn test_raw_meal_count_mismatch() {
        let materials = vec![defaults::dust().resolve().unwrap()];
        assert_eq!(
            raw_meal(&materials, &[50.0, 50.0]).unwrap_err(),
            ModelError::ProportionCount { expected: 1, found: 2 }
        );
    }

    #[test]
    fn test_z_complements_unignited_loi() {
        let balance = reference_balance(DustRoute::Silo(0.1));
        for proportions in [[80.0, 14.0, 4.0, 2.0], [70.0, 20.0, 5.0, 5.0], [100.0, 0.0, 0.0, 0.0]] {
            let chain = balance.stages(&proportions).unwrap();
            assert!((chain.z + chain.unignited[Oxide::LOI] - 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_silo_and_kiln_routes_agree() {
        let dust = defaults::dust().resolve().unwrap();
        let materials: Vec<OxideVector<f64>> = defaults::reference_materials()
            .iter()
            .map(|m| m.resolve().unwrap())
            .collect();
        let rm = raw_meal(&materials, &[81.0, 14.0, 4.0, 1.0]).unwrap();

        let x = 0.1;
        let silo = kiln_feed(&rm, &dust, DustRoute::Silo(x));
        let kiln = kiln_feed(&rm, &dust, DustRoute::Kiln(x / (1.0 - x)));

        for oxide in Oxide::ALL {
            assert!((silo[oxide] - kiln[oxide]).abs() < 1e-12, "{oxide}");
        }
    }

    #[test]
    fn test_no_dust_leaves_raw_meal_unchanged() {
        let dust = defaults::dust().resolve().unwrap();
        let rm = OxideVector::from_fn(|oxide| oxide as usize as f64 + 1.0);
        let kf = kiln_feed(&rm, &dust, DustRoute::Kiln(0.0));
        assert_eq!(kf, rm);
    }

    #[test]
    fn test_symbolic_chain_matches_numeric_chain() {
        let balance = reference_balance(DustRoute::Kiln(0.05));
        let point = [78.5, 15.5, 4.0, 2.0];

        let numeric = balance.stages(&point).unwrap();
        let symbolic = balance.stages(&LinearExpr::variables(4)).unwrap();

        for oxide in Oxide::ALL {
            assert!((symbolic.raw_meal[oxide].evaluate(&point) - numeric.raw_meal[oxide]).abs() < 1e-10);
            assert!((symbolic.kiln_feed[oxide].evaluate(&point) - numeric.kiln_feed[oxide]).abs() < 1e-10);
            assert!((symbolic.unignited[oxide].evaluate(&point) - numeric.unignited[oxide]).abs() < 1e-10);
        }
        assert!((symbolic.z.evaluate(&point) - numeric.z).abs() < 1e-10);
    }

    #[test]
    fn test_unignited_follows_mass_balance() {
        let dust = defaults::dust().resolve().unwrap();
        let ash = OxideVector::from_fn(|oxide| if oxide == Oxide::SiO2 { 40.0 } else { 0.0 });
        let kf = OxideVector::from_fn(|oxide| if oxide == Oxide::SiO2 { 14.0 } else { 1.0 });
        let tonnage = Tonnage::new(500.0, 10.0, 8.0).unwrap();

        let u = unignited(&kf, &dust, &ash, &tonnage);

        let expected = (14.0 * 500.0 - dust[Oxide::SiO2] * 10.0 + 40.0 * 8.0) / 498.0;
        assert!((u[Oxide::SiO2] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_denominator() {
        assert!(matches!(
            Tonnage::new(10.0, 12.0, 1.0),
            Err(ModelError::InvalidConstants(_))
        ));
    }

    #[test]
    fn test_clinker_is_loi_free() {
        let u = OxideVector::from_fn(|oxide| match oxide {
            Oxide::CaO => 43.0,
            Oxide::SiO2 => 14.0,
            Oxide::LOI => 36.0,
            _ => 0.5,
        });
        let cl = clinker(&u).unwrap();
        assert_eq!(cl[Oxide::LOI], 0.0);
        assert!((cl[Oxide::CaO] - 43.0 / 64.0 * 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_clinker_rejects_non_positive_z() {
        let u = OxideVector::from_fn(|oxide| if oxide == Oxide::LOI { 100.0 } else { 0.0 });
        assert!(matches!(clinker(&u), Err(ModelError::InvalidConstants(_))));
    }

    #[test]
    fn test_missing_dust_oxide() {
        let mut dust = defaults::dust();
        dust.composition.remove(Oxide::K2O);
        let operation = defaults::operation();
        let err = MassBalance::new(&defaults::reference_materials(), &dust, &AshLoad::none(), &operation).unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingOxide {
                owner: "dust".to_string(),
                oxide: Oxide::K2O
            }
        );
    }
}
