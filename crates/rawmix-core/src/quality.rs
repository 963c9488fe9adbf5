//! Quality moduli and Bogue phase estimates.
//!
//! The numerators and denominators are exposed generically so the constraint
//! builder can cross-multiply them over the unignited expressions.

use crate::expr::Linear;
use crate::oxide::{Oxide, OxideVector};

pub const LSF_SIO2: f64 = 2.8;
pub const LSF_AL2O3: f64 = 1.18;
pub const LSF_FE2O3: f64 = 0.65;

pub const NA_EQ_K2O: f64 = 0.658;

pub const C3S_CAO: f64 = 4.07;
pub const C3S_SIO2: f64 = 7.60;
pub const C3S_AL2O3: f64 = 6.72;
pub const C3S_FE2O3: f64 = 1.43;

pub const C3A_AL2O3: f64 = 2.65;
pub const C3A_FE2O3: f64 = 1.69;
pub const C4AF_FE2O3: f64 = 3.04;
pub const C2S_SIO2: f64 = 2.87;
pub const C2S_C3S: f64 = 0.7544;

/// `2.8·SiO2 + 1.18·Al2O3 + 0.65·Fe2O3`
pub fn lsf_denominator<T: Linear>(v: &OxideVector<T>) -> T {
    v[Oxide::SiO2].clone() * LSF_SIO2 + v[Oxide::Al2O3].clone() * LSF_AL2O3 + v[Oxide::Fe2O3].clone() * LSF_FE2O3
}

/// `Al2O3 + Fe2O3`
pub fn sm_denominator<T: Linear>(v: &OxideVector<T>) -> T {
    v[Oxide::Al2O3].clone() + v[Oxide::Fe2O3].clone()
}

/// `Na2O + 0.658·K2O`
pub fn na_eq<T: Linear>(v: &OxideVector<T>) -> T {
    v[Oxide::Na2O].clone() + v[Oxide::K2O].clone() * NA_EQ_K2O
}

/// Bogue C3S with the free lime already taken out of `cao_eff`.
pub fn c3s<T: Linear>(cao_eff: T, v: &OxideVector<T>) -> T {
    cao_eff * C3S_CAO
        - v[Oxide::SiO2].clone() * C3S_SIO2
        - v[Oxide::Al2O3].clone() * C3S_AL2O3
        - v[Oxide::Fe2O3].clone() * C3S_FE2O3
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

/// LSF, SM, AM and NaEq of one composition.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moduli {
    pub lsf: f64,
    pub sm: f64,
    pub am: f64,
    pub na_eq: f64,
}

impl Moduli {
    /// Ratios with a zero denominator are reported as 0.
    pub fn of(v: &OxideVector<f64>) -> Self {
        Self {
            lsf: 100.0 * ratio(v[Oxide::CaO], lsf_denominator(v)),
            sm: ratio(v[Oxide::SiO2], sm_denominator(v)),
            am: ratio(v[Oxide::Al2O3], v[Oxide::Fe2O3]),
            na_eq: na_eq(v),
        }
    }
}

/// Bogue phase estimate of a clinker, percent.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bogue {
    pub c3s: f64,
    pub c2s: f64,
    pub c3a: f64,
    pub c4af: f64,
}

impl Bogue {
    /// Unclamped phases; negative values mean the formula left its range.
    pub fn from_clinker(clinker: &OxideVector<f64>, free_lime: f64) -> Self {
        let c3s = c3s(clinker[Oxide::CaO] - free_lime, clinker);
        Self {
            c3s,
            c2s: C2S_SIO2 * clinker[Oxide::SiO2] - C2S_C3S * c3s,
            c3a: C3A_AL2O3 * clinker[Oxide::Al2O3] - C3A_FE2O3 * clinker[Oxide::Fe2O3],
            c4af: C4AF_FE2O3 * clinker[Oxide::Fe2O3],
        }
    }

    /// Negative phases shown as zero
    pub fn clamped(&self) -> Self {
        Self {
            c3s: self.c3s.max(0.0),
            c2s: self.c2s.max(0.0),
            c3a: self.c3a.max(0.0),
            c4af: self.c4af.max(0.0),
        }
    }
}
