//! Affine expressions over the blend proportions.
//!
//! The mass balance is written once against [`Linear`] and evaluated either
//! on plain `f64` proportions or on [`LinearExpr`] decision variables, so the
//! LP model and the reported compositions come from the same formulas.

use std::ops::{Add, Mul, Sub};

/// Values that support the affine operations used by the mass balance.
pub trait Linear:
    Clone + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self> + Add<f64, Output = Self>
{
    /// The additive identity with the same shape as `self`
    fn zero_like(&self) -> Self;
}

impl Linear for f64 {
    fn zero_like(&self) -> Self {
        0.0
    }
}

/// `Σ coefficients[i] · x[i] + constant`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpr {
    coefficients: Vec<f64>,
    constant: f64,
}

impl LinearExpr {
    pub fn zero(len: usize) -> Self {
        Self {
            coefficients: vec![0.0; len],
            constant: 0.0,
        }
    }

    pub fn constant(len: usize, value: f64) -> Self {
        Self {
            coefficients: vec![0.0; len],
            constant: value,
        }
    }

    /// The `index`-th decision variable
    pub fn variable(len: usize, index: usize) -> Self {
        let mut expr = Self::zero(len);
        expr.coefficients[index] = 1.0;
        expr
    }

    /// One variable per decision, in order
    pub fn variables(len: usize) -> Vec<Self> {
        (0..len).map(|i| Self::variable(len, i)).collect()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Substitute a concrete point
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        debug_assert_eq!(values.len(), self.coefficients.len());
        self.coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum::<f64>()
            + self.constant
    }
}

impl Linear for LinearExpr {
    fn zero_like(&self) -> Self {
        Self::zero(self.len())
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        debug_assert_eq!(self.len(), rhs.len());
        for (a, b) in self.coefficients.iter_mut().zip(&rhs.coefficients) {
            *a += b;
        }
        self.constant += rhs.constant;
        self
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(mut self, rhs: LinearExpr) -> LinearExpr {
        debug_assert_eq!(self.len(), rhs.len());
        for (a, b) in self.coefficients.iter_mut().zip(&rhs.coefficients) {
            *a -= b;
        }
        self.constant -= rhs.constant;
        self
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, k: f64) -> LinearExpr {
        for a in &mut self.coefficients {
            *a *= k;
        }
        self.constant *= k;
        self
    }
}

impl Add<f64> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, k: f64) -> LinearExpr {
        self.constant += k;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affine_arithmetic() {
        let x = LinearExpr::variable(2, 0);
        let y = LinearExpr::variable(2, 1);

        // 3x - 2y + 5
        let e = x * 3.0 - y * 2.0 + 5.0;
        assert_eq!(e.coefficients(), &[3.0, -2.0]);
        assert_eq!(e.constant_term(), 5.0);
        assert_eq!(e.evaluate(&[1.0, 4.0]), 0.0);
    }

    #[test]
    fn test_expression_matches_plain_arithmetic() {
        fn blend<T: Linear>(a: T, b: T) -> T {
            (a.clone() * 0.25 + b * 0.75) * 2.0 + 1.0 - a
        }

        let point = [12.0, 40.0];
        let vars = LinearExpr::variables(2);
        let symbolic = blend(vars[0].clone(), vars[1].clone());
        let numeric = blend(point[0], point[1]);

        assert!((symbolic.evaluate(&point) - numeric).abs() < 1e-12);
    }
}
