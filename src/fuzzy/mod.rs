//! Fuzzy Logic Building Blocks
//!
//! This module provides the pieces the inference engine is assembled from:
//! - Fuzzy truth values with min/max connectives
//! - Discretized universes of discourse
//! - Sampled membership functions (triangular and trapezoidal)
//! - Linguistic variables mapping labels to sampled curves

pub mod membership;
pub mod universe;
pub mod variable;

pub use membership::{build_mf, Breakpoints, MembershipCurve, Shape, ShapeKind};
pub use universe::Universe;
pub use variable::{Channel, LinguisticVariable};

use serde::{Deserialize, Serialize};

/// A fuzzy truth value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuzzyValue(f64);

impl FuzzyValue {
    pub const ZERO: FuzzyValue = FuzzyValue(0.0);
    pub const ONE: FuzzyValue = FuzzyValue(1.0);

    /// Clamp into [0, 1]. NaN is kept as-is so callers can detect it.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(value)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy AND (t-norm) - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self::new(self.0.min(other.0))
    }

    /// Fuzzy OR (t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self::new(self.0.max(other.0))
    }

    /// Fuzzy implication (Mamdani: min)
    pub fn implies_mamdani(&self, other: &Self) -> Self {
        self.and(other)
    }

    /// Whether the value is strictly positive
    pub fn fired(&self) -> bool {
        self.0 > 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl Default for FuzzyValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for FuzzyValue {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

impl From<bool> for FuzzyValue {
    fn from(b: bool) -> Self {
        Self::new(if b { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_value_operations() {
        let a = FuzzyValue::new(0.6);
        let b = FuzzyValue::new(0.4);

        assert!((a.and(&b).value() - 0.4).abs() < 0.001);
        assert!((a.or(&b).value() - 0.6).abs() < 0.001);
        assert!((a.implies_mamdani(&b).value() - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_fuzzy_value_clamps() {
        assert_eq!(FuzzyValue::new(1.7).value(), 1.0);
        assert_eq!(FuzzyValue::new(-0.2).value(), 0.0);
        assert!(FuzzyValue::new(f64::NAN).value().is_nan());
        assert!(!FuzzyValue::new(f64::NAN).is_finite());
    }

    #[test]
    fn test_fired() {
        assert!(!FuzzyValue::ZERO.fired());
        assert!(FuzzyValue::new(0.01).fired());
        assert!(FuzzyValue::from(true).fired());
    }
}
