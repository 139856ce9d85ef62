//! Rule table
//!
//! A rule names one input level per channel and one output color:
//!
//! ```text
//! IF R=Bajo AND G=Alto AND B=Bajo → Verde
//! ```
//!
//! Rules are independent and equally weighted. Their order only matters for
//! display; aggregation is a running maximum.

pub mod loader;

pub use loader::{build_rules, load_rules_from_file, parse_rules, LoadReport, RejectedRule, Rejection, RuleRecord};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fuzzy::{Channel, FuzzyValue};

/// How antecedent degrees are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    /// Fuzzy AND (minimum)
    #[default]
    And,
    /// Fuzzy OR (maximum)
    Or,
}

impl Connective {
    pub fn combine(&self, degrees: &[FuzzyValue]) -> FuzzyValue {
        match self {
            Connective::And => degrees.iter().fold(FuzzyValue::ONE, |acc, d| acc.and(d)),
            Connective::Or => degrees.iter().fold(FuzzyValue::ZERO, |acc, d| acc.or(d)),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// One antecedent/consequent pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// Input label per channel, in Red, Green, Blue order
    pub antecedent: [String; 3],
    /// Output label
    pub consequent: String,
    #[serde(default)]
    pub connective: Connective,
}

impl Rule {
    /// A conjunctive rule
    pub fn new(
        red: impl Into<String>,
        green: impl Into<String>,
        blue: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            antecedent: [red.into(), green.into(), blue.into()],
            consequent: output.into(),
            connective: Connective::And,
        }
    }

    /// A disjunctive rule: fires as strongly as its best-matching channel
    pub fn any_of(
        red: impl Into<String>,
        green: impl Into<String>,
        blue: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            connective: Connective::Or,
            ..Self::new(red, green, blue, output)
        }
    }

    /// The safety rule used when a rule set is empty:
    /// `Rojo=Bajo OR Verde=Bajo OR Azul=Bajo → Azul`
    pub fn fallback() -> Self {
        Self::any_of("Bajo", "Bajo", "Bajo", "Azul")
    }

    pub fn label(&self, channel: Channel) -> &str {
        &self.antecedent[channel.index()]
    }

    /// Human-readable form, e.g. `IF R=Bajo AND G=Alto AND B=Bajo → Verde`
    pub fn describe(&self) -> String {
        let joiner = format!(" {} ", self.connective.keyword());
        let conditions: Vec<String> = Channel::ALL
            .iter()
            .map(|c| format!("{}={}", c.short(), self.label(*c)))
            .collect();
        format!("IF {} → {}", conditions.join(&joiner), self.consequent)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// An ordered sequence of rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// A rule set holding only [`Rule::fallback`]
    pub fn fallback() -> Self {
        Self::from_rules(vec![Rule::fallback()])
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn as_slice(&self) -> &[Rule] {
        &self.rules
    }

    /// One-line description of the rule set for status displays
    pub fn summary(&self, name: &str, input_terms: usize) -> String {
        format!(
            "Active rule set: {} ({} rules, 3 variables, {} terms each)",
            name,
            self.len(),
            input_terms
        )
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::from_rules(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let rule = Rule::new("Bajo", "Alto", "Bajo", "Verde");
        assert_eq!(rule.describe(), "IF R=Bajo AND G=Alto AND B=Bajo → Verde");
        assert_eq!(
            Rule::fallback().to_string(),
            "IF R=Bajo OR G=Bajo OR B=Bajo → Azul"
        );
    }

    #[test]
    fn test_label_by_channel() {
        let rule = Rule::new("Alto", "MedioBajo", "Bajo", "Naranja");
        assert_eq!(rule.label(Channel::Red), "Alto");
        assert_eq!(rule.label(Channel::Green), "MedioBajo");
        assert_eq!(rule.label(Channel::Blue), "Bajo");
    }

    #[test]
    fn test_connectives() {
        let degrees = [FuzzyValue::new(0.2), FuzzyValue::new(0.9), FuzzyValue::new(0.5)];
        assert_eq!(Connective::And.combine(&degrees).value(), 0.2);
        assert_eq!(Connective::Or.combine(&degrees).value(), 0.9);
    }

    #[test]
    fn test_rule_set_basics() {
        let set: RuleSet = vec![
            Rule::new("Bajo", "Bajo", "Bajo", "Azul"),
            Rule::new("Alto", "Alto", "Alto", "Magenta"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).map(|r| r.consequent.as_str()), Some("Magenta"));
        assert!(set.summary("rules_30.json", 4).contains("2 rules"));
        assert!(RuleSet::new().is_empty());
        assert_eq!(RuleSet::fallback().as_slice(), &[Rule::fallback()]);
    }
}
