//! Vocabulary tables
//!
//! A [`Catalog`] is pure data: the label -> breakpoint tables for the input
//! levels and for the output colors. The canonical revision is compiled in;
//! alternatives can be loaded from TOML or JSON files with the same shape:
//!
//! ```toml
//! inputs = [
//!     { label = "Bajo", points = [0, 0, 85] },
//!     { label = "Alto", points = [170, 255, 255] },
//! ]
//! outputs = [
//!     { label = "Azul", points = [0, 15, 15] },
//! ]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::fuzzy::Breakpoints;

/// Input levels, shared by the Red, Green and Blue variables
pub const INPUT_LEVELS: &[(&str, [f64; 3])] = &[
    ("Bajo", [0.0, 0.0, 85.0]),
    ("MedioBajo", [0.0, 85.0, 170.0]),
    ("MedioAlto", [85.0, 170.0, 255.0]),
    ("Alto", [170.0, 255.0, 255.0]),
];

/// Output colors over the 0..=100 score scale
pub const OUTPUT_COLORS: &[(&str, [f64; 3])] = &[
    ("Rojo", [90.0, 100.0, 100.0]),
    ("Naranja", [75.0, 90.0, 90.0]),
    ("Amarillo", [60.0, 75.0, 75.0]),
    ("VerdeLima", [45.0, 60.0, 60.0]),
    ("Verde", [30.0, 45.0, 45.0]),
    ("Cian", [15.0, 30.0, 30.0]),
    ("Azul", [0.0, 15.0, 15.0]),
    ("Magenta", [0.0, 100.0, 100.0]),
];

/// One labeled entry of a vocabulary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSpec {
    pub label: String,
    pub points: Breakpoints,
}

impl TermSpec {
    pub fn new(label: impl Into<String>, points: impl Into<Breakpoints>) -> Self {
        Self {
            label: label.into(),
            points: points.into(),
        }
    }
}

/// Input and output vocabularies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub inputs: Vec<TermSpec>,
    pub outputs: Vec<TermSpec>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::canonical()
    }
}

impl Catalog {
    /// The compiled-in vocabulary (4 input levels, 8 output colors)
    pub fn canonical() -> Self {
        let table = |rows: &[(&str, [f64; 3])]| {
            rows.iter().map(|(label, p)| TermSpec::new(*label, *p)).collect()
        };
        Self {
            inputs: table(INPUT_LEVELS),
            outputs: table(OUTPUT_COLORS),
        }
    }

    /// Load a catalog file. `.json` files are read as JSON, anything else
    /// as TOML.
    pub fn load_from_file(path: &Path) -> FuzzyResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FuzzyError::from(e)
                .with_code(ErrorCode::InvalidCatalog)
                .with_context("path", path.display().to_string())
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let catalog = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        };
        catalog.map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn from_toml(content: &str) -> FuzzyResult<Self> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json(content: &str) -> FuzzyResult<Self> {
        let catalog: Catalog = serde_json::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check that both tables are non-empty, labels are unique within a
    /// table and every breakpoint is finite.
    pub fn validate(&self) -> FuzzyResult<()> {
        for (name, table) in [("inputs", &self.inputs), ("outputs", &self.outputs)] {
            if table.is_empty() {
                return Err(FuzzyError::invalid_catalog(format!("{} table is empty", name)));
            }
            let mut seen = HashSet::new();
            for term in table {
                if !seen.insert(term.label.as_str()) {
                    return Err(FuzzyError::invalid_catalog(format!(
                        "duplicate label '{}' in {} table",
                        term.label, name
                    )));
                }
                if !term.points.is_finite() {
                    return Err(FuzzyError::invalid_catalog(format!(
                        "label '{}' has non-finite breakpoints",
                        term.label
                    ))
                    .with_hint("breakpoints must be plain numbers"));
                }
            }
        }
        Ok(())
    }

    pub fn has_input_label(&self, label: &str) -> bool {
        self.inputs.iter().any(|t| t.label == label)
    }

    pub fn has_output_label(&self, label: &str) -> bool {
        self.outputs.iter().any(|t| t.label == label)
    }

    pub fn input_labels(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|t| t.label.as_str())
    }

    pub fn output_labels(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|t| t.label.as_str())
    }

    pub fn to_toml(&self) -> FuzzyResult<String> {
        toml::to_string_pretty(self).map_err(|e| FuzzyError::internal(e.to_string()))
    }
}
