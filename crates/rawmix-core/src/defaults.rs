//! Reference plant data: a four-component limestone/clay/sand/iron blend,
//! the plant's kiln dust, its firing mix and its usual quality window.
//!
//! Scenario files fall back to these values for anything they leave out.

use crate::fuel::Fuel;
use crate::material::{DustStream, Material};
use crate::operation::{DustRoute, OperationalConstants};
use crate::oxide::{Composition, Oxide};
use crate::targets::{Limits, QualityTargets};

fn analysis(values: [f64; Oxide::COUNT]) -> Composition {
    Oxide::ALL.into_iter().zip(values).collect()
}

/// Limestone, clay, silica sand and copper slag, in that order.
pub fn reference_materials() -> Vec<Material> {
    //                 SiO2  Al2O3 Fe2O3  CaO  MgO   K2O   Na2O  SO3   Cl    LOI
    vec![
        Material::new("LS", analysis([3.2, 0.9, 0.5, 52.0, 0.8, 0.12, 0.05, 0.05, 0.01, 42.0]))
            .with_cost(45.0)
            .with_bounds(60.0, 90.0)
            .with_moisture(4.0),
        Material::new("CY", analysis([52.0, 19.0, 5.5, 3.0, 1.6, 1.2, 0.4, 0.2, 0.02, 12.0]))
            .with_cost(60.0)
            .with_bounds(5.0, 25.0)
            .with_moisture(12.0),
        Material::new("SS", analysis([89.0, 4.0, 1.5, 1.0, 0.2, 0.4, 0.2, 0.05, 0.01, 2.5]))
            .with_cost(85.0)
            .with_bounds(0.0, 10.0)
            .with_moisture(6.0),
        Material::new("CS", analysis([30.0, 4.5, 55.0, 5.0, 1.2, 0.5, 0.5, 0.5, 0.01, 0.5]))
            .with_cost(150.0)
            .with_bounds(0.0, 5.0)
            .with_moisture(3.0),
    ]
}

pub fn dust() -> DustStream {
    DustStream::new(analysis([10.6, 3.76, 2.23, 45.90, 0.54, 0.12, 0.39, 0.02, 0.02, 40.0]))
}

/// Coal fired with rice husk, bleaching earth and palm bunches.
pub fn fuel_mix() -> Vec<Fuel> {
    let ash = |values: [f64; 6]| {
        let oxides = [Oxide::SiO2, Oxide::Al2O3, Oxide::Fe2O3, Oxide::CaO, Oxide::K2O, Oxide::Na2O];
        oxides
            .into_iter()
            .zip(values)
            .chain([(Oxide::LOI, 0.0)])
            .collect::<Composition>()
    };
    vec![
        Fuel::new("Fine Coal", 4800.0, 14.0, 75.3)
            .with_sulfur(0.3)
            .with_composition(ash([11.87, 9.03, 51.37, 4.0, 0.20, 0.30])),
        Fuel::new("Sekam", 2500.0, 25.0, 19.5)
            .with_sulfur(0.3)
            .with_composition(ash([95.0, 0.17, 0.35, 0.91, 0.11, 0.43]))
            .alternative(),
        Fuel::new("SBE", 1800.0, 65.0, 1.2)
            .with_sulfur(0.5)
            .with_composition(ash([64.0, 16.0, 1.2, 1.2, 1.54, 2.25]))
            .alternative(),
        Fuel::new("Tankos", 3000.0, 11.0, 4.0)
            .with_sulfur(0.2)
            .with_composition(ash([40.0, 10.0, 2.0, 10.0, 0.11, 30.0]))
            .alternative(),
    ]
}

pub fn operation() -> OperationalConstants {
    OperationalConstants {
        stec: 800.0,
        clinker_tph: 342.0,
        kiln_feed_tph: 533.0,
        dust_ratio: 0.03,
        free_lime: 1.0,
        dust_route: DustRoute::Silo(0.10),
    }
}

pub fn quality_targets() -> QualityTargets {
    QualityTargets {
        lsf: Limits::between(95.5, 96.5),
        sm: Limits::between(2.28, 2.32),
        am: Limits::between(1.55, 1.60),
        na_eq_max: Some(0.60),
        c3s: Limits::between(58.0, 65.0),
    }
}
