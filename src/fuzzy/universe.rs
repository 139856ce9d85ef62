//! Discretized universes of discourse

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, FuzzyResult};

/// Upper bound on the number of sample points in a universe
pub const MAX_SAMPLES: usize = 1 << 20;

/// An evenly spaced, inclusive sequence of sample points.
///
/// Every membership curve built over a universe has exactly one value per
/// sample point, index for index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UniverseSpec", into = "UniverseSpec")]
pub struct Universe {
    start: f64,
    end: f64,
    step: f64,
    points: Vec<f64>,
}

/// Serialized form of a universe: just the range and the step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct UniverseSpec {
    start: f64,
    end: f64,
    step: f64,
}

impl TryFrom<UniverseSpec> for Universe {
    type Error = crate::error::FuzzyError;

    fn try_from(spec: UniverseSpec) -> Result<Self, Self::Error> {
        Universe::new(spec.start, spec.end, spec.step)
    }
}

impl From<Universe> for UniverseSpec {
    fn from(u: Universe) -> Self {
        UniverseSpec { start: u.start, end: u.end, step: u.step }
    }
}

impl Universe {
    /// Build the universe `start, start + step, ..., end`.
    ///
    /// `end - start` must be a whole number of steps.
    pub fn new(start: f64, end: f64, step: f64) -> FuzzyResult<Self> {
        let invalid = |message: String| -> FuzzyResult<Self> {
            Err(FuzzyError::invalid_universe(message)
                .with_context("range", format!("{}..={} step {}", start, end, step)))
        };

        if !(start.is_finite() && end.is_finite() && step.is_finite()) {
            return invalid("universe bounds must be finite".to_string());
        }
        if step <= 0.0 {
            return invalid(format!("step must be positive, got {}", step));
        }
        if end < start {
            return invalid(format!("end {} precedes start {}", end, start));
        }

        let span = (end - start) / step;
        if span >= MAX_SAMPLES as f64 {
            return invalid(format!("universe would need more than {} samples", MAX_SAMPLES));
        }
        if (span - span.round()).abs() >= 1e-9 {
            return invalid(format!("range {}..={} is not a whole number of {} steps", start, end, step));
        }

        let count = span.round() as usize + 1;
        let points = (0..count).map(|i| start + i as f64 * step).collect();

        Ok(Self { start, end, step, points })
    }

    /// Color-intensity universe: 0..=255, step 1
    pub fn color_intensity() -> Self {
        Self::integer_range(0, 255)
    }

    /// Output-score universe: 0..=100, step 1
    pub fn output_score() -> Self {
        Self::integer_range(0, 100)
    }

    fn integer_range(start: i32, end: i32) -> Self {
        Self {
            start: start as f64,
            end: end as f64,
            step: 1.0,
            points: (start..=end).map(f64::from).collect(),
        }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.start
    }

    pub fn max(&self) -> f64 {
        self.end
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Clamp a value into `[min, max]`
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.start, self.end)
    }

    /// Linearly interpolate sampled `values` at `x`.
    ///
    /// Values outside the universe take the boundary sample. `values` must
    /// be aligned with this universe.
    pub fn interp(&self, values: &[f64], x: f64) -> f64 {
        debug_assert_eq!(values.len(), self.points.len());
        let last = values.len().saturating_sub(1);
        if values.is_empty() || x.is_nan() {
            return f64::NAN;
        }
        if x <= self.start {
            return values[0];
        }
        if x >= self.end {
            return values[last];
        }

        let pos = (x - self.start) / self.step;
        let i = (pos.floor() as usize).min(last);
        if i == last {
            return values[last];
        }
        let t = pos - i as f64;
        values[i] + t * (values[i + 1] - values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_canonical_universes() {
        let color = Universe::color_intensity();
        assert_eq!(color.len(), 256);
        assert_eq!(color.min(), 0.0);
        assert_eq!(color.max(), 255.0);

        let out = Universe::output_score();
        assert_eq!(out.len(), 101);
        assert_eq!(out.points()[100], 100.0);
    }

    #[test]
    fn test_new_matches_integer_range() {
        let u = Universe::new(0.0, 100.0, 1.0).unwrap();
        assert_eq!(u, Universe::output_score());
    }

    #[test]
    fn test_invalid_universes() {
        assert_eq!(Universe::new(0.0, 10.0, 0.0).unwrap_err().code, ErrorCode::InvalidUniverse);
        assert!(Universe::new(10.0, 0.0, 1.0).is_err());
        assert!(Universe::new(0.0, 10.0, 3.0).is_err());
        assert!(Universe::new(0.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_oversized_universe_is_rejected() {
        let err = Universe::new(0.0, 1e300, 1.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUniverse);
        assert!(Universe::new(0.0, MAX_SAMPLES as f64, 1.0).is_err());
        assert_eq!(Universe::new(0.0, (MAX_SAMPLES - 1) as f64, 1.0).unwrap().len(), MAX_SAMPLES);

        let json = r#"{"start":0.0,"end":1e300,"step":1.0}"#;
        assert!(serde_json::from_str::<Universe>(json).is_err());
    }

    #[test]
    fn test_interp_between_samples() {
        let u = Universe::new(0.0, 4.0, 1.0).unwrap();
        let values = [0.0, 0.5, 1.0, 0.5, 0.0];
        assert!((u.interp(&values, 1.5) - 0.75).abs() < 1e-12);
        assert_eq!(u.interp(&values, 2.0), 1.0);
    }

    #[test]
    fn test_interp_clamps_outside_range() {
        let u = Universe::new(0.0, 4.0, 1.0).unwrap();
        let values = [1.0, 0.5, 0.0, 0.0, 0.2];
        assert_eq!(u.interp(&values, -30.0), 1.0);
        assert_eq!(u.interp(&values, 400.0), 0.2);
        assert_eq!(u.interp(&values, 4.0), 0.2);
    }

    #[test]
    fn test_universe_serde_roundtrip_validates() {
        let json = r#"{"start":0.0,"end":10.0,"step":2.0}"#;
        let u: Universe = serde_json::from_str(json).unwrap();
        assert_eq!(u.len(), 6);

        let bad = r#"{"start":0.0,"end":10.0,"step":-1.0}"#;
        assert!(serde_json::from_str::<Universe>(bad).is_err());
    }
}
