use crate::error::ModelError;

/// Where the collected kiln dust goes back into the process.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "mode", content = "fraction", rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DustRoute {
    /// Dust is blended into the meal silo; the fraction is the dust share of
    /// the kiln feed.
    Silo(f64),
    /// Dust is injected with the kiln feed; the fraction is dust per unit of
    /// raw meal.
    Kiln(f64),
}

impl DustRoute {
    /// Build a route from the two routing fractions, at most one of which
    /// may be positive. Zero on both sides means no dust is returned.
    pub fn from_fractions(p_silo: f64, p_kiln: f64) -> Result<Self, ModelError> {
        if p_silo > 0.0 && p_kiln > 0.0 {
            return Err(ModelError::InvalidConstants(format!(
                "dust cannot go to the silo ({p_silo}) and the kiln ({p_kiln}) at the same time"
            )));
        }
        let route = if p_silo > 0.0 {
            DustRoute::Silo(p_silo)
        } else {
            DustRoute::Kiln(p_kiln)
        };
        route.validate()?;
        Ok(route)
    }

    /// `(p_silo, p_kiln)`; the inactive side is always zero
    pub fn fractions(self) -> (f64, f64) {
        match self {
            DustRoute::Silo(p) => (p, 0.0),
            DustRoute::Kiln(p) => (0.0, p),
        }
    }

    pub fn validate(self) -> Result<(), ModelError> {
        match self {
            DustRoute::Silo(p) if !(0.0..1.0).contains(&p) => Err(ModelError::InvalidConstants(format!(
                "silo dust fraction {p} must be in [0, 1)"
            ))),
            DustRoute::Kiln(p) if !(0.0..=1.0).contains(&p) => Err(ModelError::InvalidConstants(format!(
                "kiln dust fraction {p} must be in [0, 1]"
            ))),
            _ => Ok(()),
        }
    }
}

/// Plant operating point, fixed for the duration of one optimization.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OperationalConstants {
    /// Specific thermal energy consumption, kcal per kg clinker
    pub stec: f64,
    /// Clinker production, t/h
    pub clinker_tph: f64,
    /// Kiln feed rate, t/h
    pub kiln_feed_tph: f64,
    /// Dust lost with the exhaust, as a fraction of clinker production
    pub dust_ratio: f64,
    /// Free lime in clinker, percent
    pub free_lime: f64,
    pub dust_route: DustRoute,
}

impl OperationalConstants {
    /// Dust leaving the kiln system, t/h
    pub fn dust_loss_tph(&self) -> f64 {
        self.dust_ratio * self.clinker_tph
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let positive = [
            ("STEC", self.stec),
            ("clinker production", self.clinker_tph),
            ("kiln feed rate", self.kiln_feed_tph),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ModelError::InvalidConstants(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.dust_ratio) {
            return Err(ModelError::InvalidConstants(format!(
                "dust ratio {} must be in [0, 1)",
                self.dust_ratio
            )));
        }
        if !(0.0..=100.0).contains(&self.free_lime) {
            return Err(ModelError::InvalidConstants(format!(
                "free lime {} must be a percentage",
                self.free_lime
            )));
        }
        self.dust_route.validate()
    }
}
