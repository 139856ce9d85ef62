//! Membership function construction
//!
//! Membership functions are specified by three breakpoints `(a, b, c)`:
//! foot, peak, foot. A triangular shape uses them directly. A trapezoidal
//! shape widens the peak into a plateau `[b - w, b + w]` for a shoulder
//! width `w`, clamped so the plateau stays inside `[a, c]`.
//!
//! Breakpoints are never rejected. Points outside the universe are pulled
//! onto its boundary and out-of-order points are pushed forward so that
//! `a <= b <= c` always holds.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::universe::Universe;
use super::FuzzyValue;
use crate::error::{FuzzyError, FuzzyResult};

/// Shoulder width used when widening input terms into trapezoids
pub const INPUT_SHOULDER: f64 = 20.0;

/// Shoulder width used when widening output terms into trapezoids
pub const OUTPUT_SHOULDER: f64 = 5.0;

/// Membership function family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Triangular,
    Trapezoidal,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 2] = [ShapeKind::Triangular, ShapeKind::Trapezoidal];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Triangular => "triangular",
            ShapeKind::Trapezoidal => "trapezoidal",
        }
    }

    /// Label shown in the shape selector
    pub fn display_name(&self) -> &'static str {
        match self {
            ShapeKind::Triangular => "Triangular (trimf)",
            ShapeKind::Trapezoidal => "Trapezoidal (trapmf)",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        if s.starts_with("tri") {
            Some(ShapeKind::Triangular)
        } else if s.starts_with("trap") {
            Some(ShapeKind::Trapezoidal)
        } else {
            None
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Three control points: left foot, peak, right foot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Breakpoints {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Breakpoints {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Pull the points into `universe` and restore `a <= b <= c`.
    pub fn normalized(&self, universe: &Universe) -> Self {
        let a = universe.clamp(self.a);
        let b = universe.clamp(self.b).max(a);
        let c = universe.clamp(self.c).max(b);
        Self { a, b, c }
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }
}

impl From<[f64; 3]> for Breakpoints {
    fn from(p: [f64; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

impl From<Breakpoints> for [f64; 3] {
    fn from(p: Breakpoints) -> Self {
        [p.a, p.b, p.c]
    }
}

/// A piecewise-linear membership shape with ordered breakpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    /// Triangular: (left, peak, right)
    Triangle { a: f64, b: f64, c: f64 },
    /// Trapezoidal: (left, left_top, right_top, right)
    Trapezoid { a: f64, b: f64, c: f64, d: f64 },
}

impl Shape {
    /// Derive the shape of `kind` from three breakpoints.
    pub fn derive(kind: ShapeKind, points: Breakpoints, universe: &Universe, shoulder: f64) -> Self {
        let Breakpoints { a, b, c } = points.normalized(universe);
        match kind {
            ShapeKind::Triangular => Shape::Triangle { a, b, c },
            ShapeKind::Trapezoidal => {
                let w = shoulder.max(0.0);
                let left = if b > universe.min() + w { b - w } else { b };
                let right = if b < universe.max() - w { b + w } else { b };
                Shape::Trapezoid {
                    a,
                    b: left.max(a),
                    c: right.min(c),
                    d: c,
                }
            }
        }
    }

    /// Evaluate membership for a crisp value.
    ///
    /// A side whose foot coincides with the peak is a vertical edge: the
    /// foot itself already has membership 1.
    pub fn evaluate(&self, x: f64) -> FuzzyValue {
        let result = match *self {
            Shape::Triangle { a, b, c } => {
                if x < a || x > c {
                    0.0
                } else if x == b {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (c - x) / (c - b)
                }
            }
            Shape::Trapezoid { a, b, c, d } => {
                if x < a || x > d {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
        };

        FuzzyValue::new(result)
    }

    /// Get the core (where membership = 1)
    pub fn core(&self) -> (f64, f64) {
        match *self {
            Shape::Triangle { b, .. } => (b, b),
            Shape::Trapezoid { b, c, .. } => (b, c),
        }
    }

    /// Get the support bounds `[a, c]` / `[a, d]`
    pub fn support(&self) -> (f64, f64) {
        match *self {
            Shape::Triangle { a, c, .. } => (a, c),
            Shape::Trapezoid { a, d, .. } => (a, d),
        }
    }

    /// Sample the shape at every universe point
    pub fn sample(&self, universe: &Universe) -> MembershipCurve {
        MembershipCurve::from_values(
            universe.points().iter().map(|&x| self.evaluate(x).value()).collect(),
        )
    }
}

/// Build a sampled membership curve.
///
/// `shoulder` only matters for [`ShapeKind::Trapezoidal`].
pub fn build_mf(kind: ShapeKind, points: Breakpoints, universe: &Universe, shoulder: f64) -> MembershipCurve {
    Shape::derive(kind, points, universe, shoulder).sample(universe)
}

/// Degrees of membership aligned index-for-index with a universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipCurve(Vec<f64>);

impl MembershipCurve {
    /// An all-zero curve of `len` samples
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn into_values(self) -> Vec<f64> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest membership degree (0 for an empty curve)
    pub fn height(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    /// True when every sample is exactly zero
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&m| m == 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|m| m.is_finite())
    }

    /// Membership at `x`, interpolated over `universe`
    pub fn at(&self, universe: &Universe, x: f64) -> FuzzyValue {
        FuzzyValue::new(universe.interp(&self.0, x))
    }

    /// Elementwise `min(self, level)`: the curve cut at `level`
    pub fn clipped(&self, level: FuzzyValue) -> Self {
        let cap = level.value();
        Self(self.0.iter().map(|&m| m.min(cap)).collect())
    }

    /// Elementwise maximum with `other`, in place
    pub fn union_with(&mut self, other: &MembershipCurve) -> FuzzyResult<()> {
        if self.len() != other.len() {
            return Err(FuzzyError::curve_mismatch(self.len(), other.len()));
        }
        for (m, &o) in self.0.iter_mut().zip(other.0.iter()) {
            *m = m.max(o);
        }
        Ok(())
    }
}
