//! Linguistic variables

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::membership::MembershipCurve;
use super::universe::Universe;
use super::FuzzyValue;
use crate::error::{FuzzyError, FuzzyResult};

/// The three input channels of an RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "Rojo")]
    Red,
    #[serde(rename = "Verde")]
    Green,
    #[serde(rename = "Azul")]
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Variable name, also the rule-set record field
    pub fn variable_name(&self) -> &'static str {
        match self {
            Channel::Red => "Rojo",
            Channel::Green => "Verde",
            Channel::Blue => "Azul",
        }
    }

    /// One-letter tag used in rule descriptions
    pub fn short(&self) -> &'static str {
        match self {
            Channel::Red => "R",
            Channel::Green => "G",
            Channel::Blue => "B",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variable_name())
    }
}

/// A linguistic variable: a universe plus labeled membership curves.
///
/// Terms keep insertion order, which is the order they are displayed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinguisticVariable {
    /// Variable name (e.g., "Rojo")
    pub name: String,
    /// Universe of discourse
    pub universe: Universe,
    /// Sampled curve per label
    terms: IndexMap<String, MembershipCurve>,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, universe: Universe) -> Self {
        Self {
            name: name.into(),
            universe,
            terms: IndexMap::new(),
        }
    }

    /// The same terms under another variable name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Add a term. The curve must be sampled over this variable's universe.
    pub fn add_term(&mut self, label: impl Into<String>, curve: MembershipCurve) -> FuzzyResult<()> {
        let label = label.into();
        if curve.len() != self.universe.len() {
            return Err(FuzzyError::curve_mismatch(self.universe.len(), curve.len())
                .with_context("variable", self.name.as_str())
                .with_context("label", label));
        }
        if self.terms.contains_key(&label) {
            return Err(FuzzyError::invalid_catalog(format!(
                "duplicate label '{}' in variable {}",
                label, self.name
            )));
        }
        self.terms.insert(label, curve);
        Ok(())
    }

    pub fn term(&self, label: &str) -> Option<&MembershipCurve> {
        self.terms.get(label)
    }

    /// Like [`term`](Self::term) but reports unknown labels as errors
    pub fn require(&self, label: &str) -> FuzzyResult<&MembershipCurve> {
        self.terms
            .get(label)
            .ok_or_else(|| FuzzyError::unknown_label(&self.name, label))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.terms.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &MembershipCurve)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Degree of membership of `value` in `label`
    pub fn membership(&self, label: &str, value: f64) -> FuzzyResult<FuzzyValue> {
        Ok(self.require(label)?.at(&self.universe, value))
    }

    /// Fuzzify a crisp value - get membership for all terms
    pub fn fuzzify(&self, value: f64) -> IndexMap<String, FuzzyValue> {
        self.terms
            .iter()
            .map(|(name, curve)| (name.clone(), curve.at(&self.universe, value)))
            .collect()
    }

    /// Get the term with highest membership for a value.
    ///
    /// Ties go to the earliest term. Returns `None` when no term has
    /// positive membership.
    pub fn dominant_term(&self, value: f64) -> Option<(&str, FuzzyValue)> {
        let mut best: Option<(&str, FuzzyValue)> = None;
        for (name, curve) in &self.terms {
            let m = curve.at(&self.universe, value);
            if !m.fired() {
                continue;
            }
            match best {
                Some((_, current)) if current.value() >= m.value() => {}
                _ => best = Some((name.as_str(), m)),
            }
        }
        best
    }
}
