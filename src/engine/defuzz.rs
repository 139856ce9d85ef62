//! Defuzzification
//!
//! All methods work on the sampled aggregate and return `None` when the
//! aggregate has no area: an all-zero set has no meaningful crisp value.

use serde::{Deserialize, Serialize};

use crate::fuzzy::{MembershipCurve, Universe};

/// Defuzzification method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefuzzificationMethod {
    /// Center of gravity
    #[default]
    Centroid,
    /// Bisector of area
    Bisector,
    /// Mean of maximum
    #[serde(rename = "mom")]
    MeanOfMaximum,
}

impl DefuzzificationMethod {
    pub const ALL: [DefuzzificationMethod; 3] = [
        DefuzzificationMethod::Centroid,
        DefuzzificationMethod::Bisector,
        DefuzzificationMethod::MeanOfMaximum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefuzzificationMethod::Centroid => "centroid",
            DefuzzificationMethod::Bisector => "bisector",
            DefuzzificationMethod::MeanOfMaximum => "mom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "centroid" | "cog" => Some(DefuzzificationMethod::Centroid),
            "bisector" => Some(DefuzzificationMethod::Bisector),
            "mom" | "mean_of_maximum" => Some(DefuzzificationMethod::MeanOfMaximum),
            _ => None,
        }
    }
}

/// Centroid of `aggregate`: `Σ x·μ(x) / Σ μ(x)` over the universe samples
pub fn defuzzify(aggregate: &MembershipCurve, universe: &Universe) -> Option<f64> {
    defuzzify_with(DefuzzificationMethod::Centroid, aggregate, universe)
}

/// Defuzzify `aggregate` with the given method
pub fn defuzzify_with(
    method: DefuzzificationMethod,
    aggregate: &MembershipCurve,
    universe: &Universe,
) -> Option<f64> {
    let xs = universe.points();
    let ms = aggregate.values();
    if xs.len() != ms.len() {
        return None;
    }

    let area: f64 = ms.iter().sum();
    if !area.is_finite() || area <= 0.0 {
        return None;
    }

    let crisp = match method {
        DefuzzificationMethod::Centroid => {
            let numerator: f64 = xs.iter().zip(ms).map(|(x, m)| x * m).sum();
            numerator / area
        }
        DefuzzificationMethod::Bisector => {
            let half_area = area / 2.0;
            let mut cumulative = 0.0;
            let mut found = universe.max();
            for (x, m) in xs.iter().zip(ms) {
                cumulative += m;
                if cumulative >= half_area {
                    found = *x;
                    break;
                }
            }
            found
        }
        DefuzzificationMethod::MeanOfMaximum => {
            let height = aggregate.height();
            let maxima: Vec<f64> = xs
                .iter()
                .zip(ms)
                .filter(|(_, m)| (height - **m).abs() <= f64::EPSILON)
                .map(|(x, _)| *x)
                .collect();
            maxima.iter().sum::<f64>() / maxima.len() as f64
        }
    };

    crisp.is_finite().then(|| universe.clamp(crisp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_universe() -> Universe {
        Universe::output_score()
    }

    fn spike_at(index: usize, len: usize) -> MembershipCurve {
        let mut values = vec![0.0; len];
        values[index] = 1.0;
        MembershipCurve::from_values(values)
    }

    #[test]
    fn test_centroid_of_spike() {
        let u = score_universe();
        assert_eq!(defuzzify(&spike_at(42, 101), &u), Some(42.0));
    }

    #[test]
    fn test_centroid_of_symmetric_set() {
        let u = score_universe();
        let values: Vec<f64> = (0..=100).map(|i| if (40..=60).contains(&i) { 0.7 } else { 0.0 }).collect();
        let c = defuzzify(&MembershipCurve::from_values(values), &u).unwrap();
        assert!((c - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_area_is_undefined() {
        let u = score_universe();
        for method in DefuzzificationMethod::ALL {
            assert_eq!(defuzzify_with(method, &MembershipCurve::zeros(101), &u), None);
        }
    }

    #[test]
    fn test_length_mismatch_is_undefined() {
        assert_eq!(defuzzify(&spike_at(0, 10), &score_universe()), None);
    }

    #[test]
    fn test_bisector() {
        let u = score_universe();
        let values: Vec<f64> = (0..=100).map(|i| if i <= 20 { 1.0 } else { 0.0 }).collect();
        let b = defuzzify_with(DefuzzificationMethod::Bisector, &MembershipCurve::from_values(values), &u);
        // 21 unit samples: the running sum first reaches 10.5 at x = 10
        assert_eq!(b, Some(10.0));
    }

    #[test]
    fn test_mean_of_maximum() {
        let u = score_universe();
        let mut values = vec![0.2; 101];
        values[30] = 0.9;
        values[70] = 0.9;
        let m = defuzzify_with(
            DefuzzificationMethod::MeanOfMaximum,
            &MembershipCurve::from_values(values),
            &u,
        );
        assert_eq!(m, Some(50.0));
    }

    #[test]
    fn test_method_names() {
        for method in DefuzzificationMethod::ALL {
            assert_eq!(DefuzzificationMethod::from_str(method.as_str()), Some(method));
        }
        assert_eq!(DefuzzificationMethod::from_str("median"), None);
        assert_eq!(
            serde_json::to_string(&DefuzzificationMethod::MeanOfMaximum).unwrap(),
            "\"mom\""
        );
    }
}
