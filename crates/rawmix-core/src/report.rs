//! Flat per-run record for tabular export.

use std::fmt;

use crate::fuel::FuelSummary;
use crate::material::Material;
use crate::operation::{DustRoute, OperationalConstants};
use crate::optimizer::SolvedBlend;
use crate::oxide::OxideVector;
use crate::quality::{Bogue, Moduli};
use crate::recompute::Recomputation;
use crate::targets::ObjectiveMode;

#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RawMeal,
    KilnFeed,
    Unignited,
    Clinker,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::RawMeal, Stage::KilnFeed, Stage::Unignited, Stage::Clinker];

    pub fn label(self) -> &'static str {
        match self {
            Stage::RawMeal => "Raw Meal",
            Stage::KilnFeed => "Kiln Feed",
            Stage::Unignited => "Unignited",
            Stage::Clinker => "Clinker",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One material in the blend.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRow {
    pub id: String,
    /// Dry-basis share, percent
    pub dry: f64,
    /// As-fed share after moisture correction, percent
    pub wet: f64,
    pub feed_tph: f64,
    pub cost_per_hour: f64,
}

/// One stage analysis with its moduli. The unignited stage carries none.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StageRow {
    pub stage: Stage,
    pub oxides: OxideVector<f64>,
    pub moduli: Option<Moduli>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DustFlows {
    pub loss_tph: f64,
    pub to_silo_tph: f64,
    pub to_kiln_tph: f64,
}

impl DustFlows {
    pub fn of(operation: &OperationalConstants) -> Self {
        let (to_silo_tph, to_kiln_tph) = match operation.dust_route {
            DustRoute::Silo(p) => (p * operation.kiln_feed_tph / (1.0 - p), 0.0),
            DustRoute::Kiln(p) => (0.0, p * operation.kiln_feed_tph),
        };
        Self {
            loss_tph: operation.dust_loss_tph(),
            to_silo_tph,
            to_kiln_tph,
        }
    }
}

/// Everything known about one blend, ready to tabulate.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct BlendReport {
    pub mode: Option<ObjectiveMode>,
    pub objective_value: Option<f64>,
    pub materials: Vec<MaterialRow>,
    /// Moisture of the blended meal, percent
    pub raw_meal_moisture: f64,
    pub total_feed_tph: f64,
    pub cost_per_hour: f64,
    pub stages: Vec<StageRow>,
    pub z: f64,
    pub bogue: Bogue,
    pub bogue_display: Bogue,
    pub dust: DustFlows,
    pub fuel: FuelSummary,
    pub binding_constraints: Vec<String>,
}

impl BlendReport {
    pub fn new(
        materials: &[Material],
        recomputation: &Recomputation,
        operation: &OperationalConstants,
        fuel: FuelSummary,
    ) -> Self {
        let proportions = &recomputation.proportions;
        let raw_meal_moisture: f64 = materials
            .iter()
            .zip(proportions)
            .map(|(m, p)| p / 100.0 * m.moisture)
            .sum();

        // Dry share rescaled by the moisture each material carries in
        let wet_index: Vec<f64> = materials
            .iter()
            .zip(proportions)
            .map(|(m, p)| {
                if m.moisture < 100.0 {
                    p * (100.0 - raw_meal_moisture) / (100.0 - m.moisture)
                } else {
                    0.0
                }
            })
            .collect();
        let wet_total: f64 = wet_index.iter().sum();

        let rows: Vec<MaterialRow> = materials
            .iter()
            .zip(proportions)
            .zip(&wet_index)
            .map(|((m, &dry), &index)| {
                let feed_tph = dry / 100.0 * operation.kiln_feed_tph;
                MaterialRow {
                    id: m.id.clone(),
                    dry,
                    wet: if wet_total > 0.0 { index / wet_total * 100.0 } else { 0.0 },
                    feed_tph,
                    cost_per_hour: feed_tph * m.cost,
                }
            })
            .collect();

        let r = recomputation;
        let stages = vec![
            StageRow {
                stage: Stage::RawMeal,
                oxides: r.raw_meal.clone(),
                moduli: Some(r.moduli.raw_meal),
            },
            StageRow {
                stage: Stage::KilnFeed,
                oxides: r.kiln_feed.clone(),
                moduli: Some(r.moduli.kiln_feed),
            },
            StageRow {
                stage: Stage::Unignited,
                oxides: r.unignited.clone(),
                moduli: None,
            },
            StageRow {
                stage: Stage::Clinker,
                oxides: r.clinker.clone(),
                moduli: Some(r.moduli.clinker),
            },
        ];

        Self {
            mode: None,
            objective_value: None,
            total_feed_tph: rows.iter().map(|row| row.feed_tph).sum(),
            cost_per_hour: rows.iter().map(|row| row.cost_per_hour).sum(),
            materials: rows,
            raw_meal_moisture,
            stages,
            z: r.z,
            bogue: r.bogue,
            bogue_display: r.bogue_display(),
            dust: DustFlows::of(operation),
            fuel,
            binding_constraints: Vec::new(),
        }
    }

    /// Attach what the solver knows about the blend
    pub fn with_solution(mut self, blend: &SolvedBlend) -> Self {
        self.mode = Some(blend.mode);
        self.objective_value = Some(blend.objective_value);
        self.binding_constraints = blend.analysis.binding_constraints.clone();
        self
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageRow> {
        self.stages.iter().find(|row| row.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use crate::fuel;
    use crate::oxide::Oxide;
    use crate::recompute::recompute;

    fn reference_report(proportions: &[f64]) -> BlendReport {
        let operation = defaults::operation();
        let materials = defaults::reference_materials();
        let summary = fuel::summarize(&defaults::fuel_mix(), &operation).unwrap();
        let r = recompute(&materials, proportions, &defaults::dust(), &summary.ash_load(), &operation).unwrap();
        BlendReport::new(&materials, &r, &operation, summary)
    }

    #[test]
    fn test_material_rows() {
        let report = reference_report(&[80.0, 14.0, 4.0, 2.0]);

        assert!((report.materials[0].feed_tph - 0.8 * 533.0).abs() < 1e-9);
        assert!((report.total_feed_tph - 533.0).abs() < 1e-9);
        let expected_cost = 533.0 * (0.80 * 45.0 + 0.14 * 60.0 + 0.04 * 85.0 + 0.02 * 150.0);
        assert!((report.cost_per_hour - expected_cost).abs() < 1e-6);

        let wet_total: f64 = report.materials.iter().map(|row| row.wet).sum();
        assert!((wet_total - 100.0).abs() < 1e-9);
        // Wet clay carries more water than the meal average, so its as-fed share grows
        assert!(report.materials[1].wet > report.materials[1].dry);
    }

    #[test]
    fn test_dust_flows_by_route() {
        let mut operation = defaults::operation();
        let silo = DustFlows::of(&operation);
        assert!((silo.loss_tph - 10.26).abs() < 1e-9);
        assert!((silo.to_silo_tph - 0.1 * 533.0 / 0.9).abs() < 1e-9);
        assert_eq!(silo.to_kiln_tph, 0.0);

        operation.dust_route = DustRoute::Kiln(0.05);
        let kiln = DustFlows::of(&operation);
        assert_eq!(kiln.to_silo_tph, 0.0);
        assert!((kiln.to_kiln_tph - 0.05 * 533.0).abs() < 1e-9);
    }

    #[test]
    fn test_stage_rows() {
        let report = reference_report(&[81.6, 13.9, 3.75, 0.75]);
        let labels: Vec<&str> = report.stages.iter().map(|row| row.stage.label()).collect();
        assert_eq!(labels, ["Raw Meal", "Kiln Feed", "Unignited", "Clinker"]);

        assert!(report.stage(Stage::Unignited).unwrap().moduli.is_none());
        let clinker = report.stage(Stage::Clinker).unwrap();
        assert_eq!(clinker.oxides[Oxide::LOI], 0.0);
        assert!(clinker.moduli.unwrap().lsf > 90.0);
        assert!(report.mode.is_none());
    }
}
