use std::fmt;

use crate::error::ModelError;

/// Clinker quality indices that can be targeted.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityIndex {
    Lsf,
    Sm,
    Am,
    NaEq,
    C3s,
}

impl QualityIndex {
    pub fn label(self) -> &'static str {
        match self {
            QualityIndex::Lsf => "LSF",
            QualityIndex::Sm => "SM",
            QualityIndex::Am => "AM",
            QualityIndex::NaEq => "NaEq",
            QualityIndex::C3s => "C3S",
        }
    }
}

impl fmt::Display for QualityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Optional lower and upper limit, in the index's natural units.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Limits {
    #[cfg_attr(feature = "serde", serde(default))]
    pub min: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max: Option<f64>,
}

impl Limits {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        self.min.is_none_or(|min| value >= min - tolerance)
            && self.max.is_none_or(|max| value <= max + tolerance)
    }

    fn validate(&self, index: QualityIndex) -> Result<(), ModelError> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(ModelError::BoundsConflict(format!(
                    "{index} limit {bound} is not finite"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ModelError::BoundsConflict(format!(
                    "{index} minimum {min} exceeds maximum {max}"
                )));
            }
        }
        Ok(())
    }
}

/// Clinker-basis quality window. Absent limits emit no constraint.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityTargets {
    #[cfg_attr(feature = "serde", serde(default))]
    pub lsf: Limits,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sm: Limits,
    #[cfg_attr(feature = "serde", serde(default))]
    pub am: Limits,
    /// Sodium equivalent only has an upper limit
    #[cfg_attr(feature = "serde", serde(default))]
    pub na_eq_max: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub c3s: Limits,
}

impl QualityTargets {
    /// No quality limits at all
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn limits(&self, index: QualityIndex) -> Limits {
        match index {
            QualityIndex::Lsf => self.lsf,
            QualityIndex::Sm => self.sm,
            QualityIndex::Am => self.am,
            QualityIndex::NaEq => Limits {
                min: None,
                max: self.na_eq_max,
            },
            QualityIndex::C3s => self.c3s,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.lsf.validate(QualityIndex::Lsf)?;
        self.sm.validate(QualityIndex::Sm)?;
        self.am.validate(QualityIndex::Am)?;
        self.limits(QualityIndex::NaEq).validate(QualityIndex::NaEq)?;
        self.c3s.validate(QualityIndex::C3s)
    }
}

/// What the optimizer minimizes once the quality window is met.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ObjectiveMode {
    /// Any feasible blend; material cost only breaks ties
    #[default]
    Feasibility,
    /// Cheapest feasible blend
    CostMinimization,
}

impl ObjectiveMode {
    /// Weight applied to the cost vector in feasibility mode
    pub const TIE_BREAK_WEIGHT: f64 = 1e-3;

    pub fn cost_weight(self) -> f64 {
        match self {
            ObjectiveMode::Feasibility => Self::TIE_BREAK_WEIGHT,
            ObjectiveMode::CostMinimization => 1.0,
        }
    }
}
