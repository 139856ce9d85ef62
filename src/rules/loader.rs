//! JSON rule-set loader
//!
//! Rule-set files are arrays of records keyed by variable name:
//!
//! ```json
//! [
//!   {"Rojo": "Bajo", "Verde": "Bajo", "Azul": "Bajo", "OUTPUT": "Azul"},
//!   {"Rojo": "Alto", "Verde": "Alto", "Azul": "Alto", "OUTPUT": "Magenta"}
//! ]
//! ```
//!
//! Each record is checked against the catalog. Records with unknown labels
//! or missing fields are dropped and reported; the rest load normally.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Rule, RuleSet};
use crate::catalog::Catalog;
use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::fuzzy::Channel;

/// Why a record was not turned into a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum Rejection {
    #[error("record is not an object with Rojo/Verde/Azul/OUTPUT fields: {message}")]
    Malformed { message: String },

    #[error("missing field {field}")]
    MissingField { field: String },

    #[error("unknown {variable} label '{label}'")]
    UnknownLabel { variable: String, label: String },
}

/// One rule-set record as it appears in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(rename = "Rojo")]
    pub red: Option<String>,
    #[serde(rename = "Verde")]
    pub green: Option<String>,
    #[serde(rename = "Azul")]
    pub blue: Option<String>,
    #[serde(rename = "OUTPUT")]
    pub output: Option<String>,
}

impl RuleRecord {
    pub fn new(red: &str, green: &str, blue: &str, output: &str) -> Self {
        Self {
            red: Some(red.to_string()),
            green: Some(green.to_string()),
            blue: Some(blue.to_string()),
            output: Some(output.to_string()),
        }
    }

    fn channel(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Red => self.red.as_deref(),
            Channel::Green => self.green.as_deref(),
            Channel::Blue => self.blue.as_deref(),
        }
    }

    /// Validate against `catalog` and build the rule
    pub fn to_rule(&self, catalog: &Catalog) -> Result<Rule, Rejection> {
        let mut labels: [String; 3] = Default::default();
        for channel in Channel::ALL {
            let label = self.channel(channel).ok_or_else(|| Rejection::MissingField {
                field: channel.variable_name().to_string(),
            })?;
            if !catalog.has_input_label(label) {
                return Err(Rejection::UnknownLabel {
                    variable: channel.variable_name().to_string(),
                    label: label.to_string(),
                });
            }
            labels[channel.index()] = label.to_string();
        }

        let output = self.output.as_deref().ok_or_else(|| Rejection::MissingField {
            field: "OUTPUT".to_string(),
        })?;
        if !catalog.has_output_label(output) {
            return Err(Rejection::UnknownLabel {
                variable: "OUTPUT".to_string(),
                label: output.to_string(),
            });
        }

        let [red, green, blue] = labels;
        Ok(Rule::new(red, green, blue, output))
    }
}

/// A record that was dropped during loading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRule {
    /// Zero-based position in the file
    pub index: usize,
    /// The raw record
    pub record: serde_json::Value,
    pub reason: Rejection,
}

/// Outcome of loading a rule set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub rules: RuleSet,
    pub rejected: Vec<RejectedRule>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Turn raw JSON records into validated rules
pub fn build_rules(records: Vec<serde_json::Value>, catalog: &Catalog) -> LoadReport {
    let mut report = LoadReport::default();

    for (index, value) in records.into_iter().enumerate() {
        let parsed = serde_json::from_value::<RuleRecord>(value.clone())
            .map_err(|e| Rejection::Malformed { message: e.to_string() })
            .and_then(|record| record.to_rule(catalog));

        match parsed {
            Ok(rule) => report.rules.push(rule),
            Err(reason) => {
                warn!(index, record = %value, %reason, "dropping rule");
                report.rejected.push(RejectedRule { index, record: value, reason });
            }
        }
    }

    debug!(
        loaded = report.rules.len(),
        rejected = report.rejected.len(),
        "rule set built"
    );
    report
}

/// Parse a rule-set document
pub fn parse_rules(json: &str, catalog: &Catalog) -> FuzzyResult<LoadReport> {
    let records: Vec<serde_json::Value> = serde_json::from_str(json).map_err(|e| {
        FuzzyError::from(e).with_hint("rule sets are JSON arrays of {Rojo, Verde, Azul, OUTPUT} records")
    })?;
    Ok(build_rules(records, catalog))
}

/// Read and parse a rule-set file
pub fn load_rules_from_file(path: &Path, catalog: &Catalog) -> FuzzyResult<LoadReport> {
    let content = fs::read_to_string(path).map_err(|e| {
        let err = FuzzyError::from(e).with_context("path", path.display().to_string());
        if err.code == ErrorCode::RuleSetNotFound {
            err.with_hint("check the [rules] dir setting or pass --rules")
        } else {
            err
        }
    })?;

    parse_rules(&content, catalog).map_err(|e| e.with_context("path", path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RULES_100: &str = include_str!("../../rules_data/rules_100.json");
    const RULES_60: &str = include_str!("../../rules_data/rules_60.json");
    const RULES_30: &str = include_str!("../../rules_data/rules_30.json");

    #[test]
    fn test_fixture_sizes() {
        let catalog = Catalog::canonical();
        for (doc, expected) in [(RULES_100, 64), (RULES_60, 38), (RULES_30, 19)] {
            let report = parse_rules(doc, &catalog).unwrap();
            assert!(report.is_clean());
            assert_eq!(report.rules.len(), expected);
        }
    }

    #[test]
    fn test_fixture_corner_rules() {
        let report = parse_rules(RULES_30, &Catalog::canonical()).unwrap();
        let first = report.rules.get(0).unwrap();
        assert_eq!(first, &Rule::new("Bajo", "Bajo", "Bajo", "Azul"));
        let last = report.rules.get(report.rules.len() - 1).unwrap();
        assert_eq!(last, &Rule::new("Alto", "Alto", "Alto", "Magenta"));
    }

    #[test]
    fn test_unknown_labels_are_dropped() {
        let doc = r#"[
            {"Rojo": "Bajo", "Verde": "Bajo", "Azul": "Bajo", "OUTPUT": "Azul"},
            {"Rojo": "Altisimo", "Verde": "Bajo", "Azul": "Bajo", "OUTPUT": "Rojo"},
            {"Rojo": "Alto", "Verde": "Alto", "Azul": "Alto", "OUTPUT": "Blanco"},
            {"Rojo": "Alto", "Verde": "Bajo", "Azul": "Bajo", "OUTPUT": "Rojo"}
        ]"#;
        let report = parse_rules(doc, &Catalog::canonical()).unwrap();

        assert_eq!(report.rules.len(), 2);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].index, 1);
        assert_eq!(
            report.rejected[0].reason,
            Rejection::UnknownLabel { variable: "Rojo".into(), label: "Altisimo".into() }
        );
        assert_eq!(
            report.rejected[1].reason,
            Rejection::UnknownLabel { variable: "OUTPUT".into(), label: "Blanco".into() }
        );
    }

    #[test]
    fn test_missing_fields_and_malformed_records() {
        let doc = r#"[
            {"Rojo": "Bajo", "Verde": "Bajo", "OUTPUT": "Azul"},
            "not a record",
            {"Rojo": "Bajo", "Verde": "Bajo", "Azul": "Bajo"}
        ]"#;
        let report = parse_rules(doc, &Catalog::canonical()).unwrap();

        assert!(report.rules.is_empty());
        assert_eq!(
            report.rejected[0].reason,
            Rejection::MissingField { field: "Azul".into() }
        );
        assert!(matches!(report.rejected[1].reason, Rejection::Malformed { .. }));
        assert_eq!(
            report.rejected[2].reason,
            Rejection::MissingField { field: "OUTPUT".into() }
        );
    }

    #[test]
    fn test_document_errors() {
        let catalog = Catalog::canonical();
        assert_eq!(parse_rules("{", &catalog).unwrap_err().code, ErrorCode::InvalidJson);
        assert_eq!(
            parse_rules(r#"{"Rojo": "Bajo"}"#, &catalog).unwrap_err().code,
            ErrorCode::InvalidJson
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", RULES_30).unwrap();
        let report = load_rules_from_file(file.path(), &Catalog::canonical()).unwrap();
        assert_eq!(report.rules.len(), 19);

        let missing = load_rules_from_file(Path::new("/nonexistent/rules.json"), &Catalog::canonical());
        let err = missing.unwrap_err();
        assert_eq!(err.code, ErrorCode::RuleSetNotFound);
        assert!(err.hint.is_some());
    }
}
