use std::path::Path;

use anyhow::{Context, bail};
use rawmix_core::{
    BlendOptimizer, DustStream, Fuel, FuelSummary, Material, ModelError, ObjectiveMode, OperationalConstants,
    QualityTargets, defaults, fuel,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A plant run as read from a JSON file. Everything except the materials
/// falls back to the reference plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub materials: Vec<Material>,
    #[serde(default = "defaults::dust")]
    pub dust: DustStream,
    #[serde(default = "defaults::fuel_mix")]
    pub fuels: Vec<Fuel>,
    #[serde(default = "defaults::operation")]
    pub operation: OperationalConstants,
    #[serde(default = "defaults::quality_targets")]
    pub targets: QualityTargets,
    #[serde(default)]
    pub objective: ObjectiveMode,
}

impl Scenario {
    pub fn reference() -> Self {
        Self {
            materials: defaults::reference_materials(),
            dust: defaults::dust(),
            fuels: defaults::fuel_mix(),
            operation: defaults::operation(),
            targets: defaults::quality_targets(),
            objective: ObjectiveMode::default(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&source).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(source: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn fuel_summary(&self) -> Result<FuelSummary, ModelError> {
        fuel::summarize(&self.fuels, &self.operation)
    }

    pub fn optimizer(&self, fuel: &FuelSummary, mode: ObjectiveMode) -> BlendOptimizer {
        BlendOptimizer::new(
            self.materials.clone(),
            self.dust.clone(),
            fuel.ash_load(),
            self.operation.clone(),
        )
        .with_targets(self.targets.clone())
        .with_mode(mode)
    }

    /// Parse `ID=share,ID=share,...` into material order. Materials not
    /// named get a zero share.
    pub fn proportions(&self, list: &str) -> anyhow::Result<Vec<f64>> {
        let mut proportions = vec![0.0; self.materials.len()];
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((id, value)) = entry.split_once('=') else {
                bail!("expected ID=share, got {entry:?}");
            };
            let id = id.trim();
            let index = self
                .materials
                .iter()
                .position(|m| m.id == id)
                .ok_or_else(|| ModelError::UnknownMaterial(id.to_string()))?;
            proportions[index] = value
                .trim()
                .parse::<f64>()
                .with_context(|| format!("share for {id}"))?;
        }

        let total: f64 = proportions.iter().sum();
        if (total - 100.0).abs() > 1e-6 {
            warn!(total, "proportions do not sum to 100");
        }
        Ok(proportions)
    }
}
