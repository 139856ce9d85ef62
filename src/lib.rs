//! chromafuzz - Mamdani fuzzy classification of RGB colors
//!
//! Maps a crisp `(r, g, b)` triple in `[0, 255]³` to a score in `[0, 100]`
//! and the output color label that best describes it.
//!
//! # Architecture
//!
//! - [`fuzzy`] - Universes, membership curves and linguistic variables
//! - [`catalog`] - The label -> breakpoint vocabulary tables
//! - [`rules`] - Rules, rule sets and the JSON rule-set loader
//! - [`engine`] - Model assembly, inference, defuzzification and per-rule
//!   explanations
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - Structured errors with codes and hints
//!
//! # Example
//!
//! ```rust
//! use chromafuzz::{assemble, Rule, RuleSet, ShapeKind};
//!
//! let rules = RuleSet::from_rules(vec![
//!     Rule::new("Bajo", "Bajo", "Bajo", "Azul"),
//!     Rule::new("Alto", "Alto", "Alto", "Magenta"),
//! ]);
//! let model = assemble(rules, ShapeKind::Triangular).unwrap();
//!
//! let result = model.infer(0.0, 0.0, 0.0);
//! assert_eq!(result.label.as_deref(), Some("Azul"));
//! assert!(result.score.unwrap() < 15.0);
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod rules;

// Vocabulary
pub use catalog::{Catalog, TermSpec};

// Fuzzy primitives
pub use fuzzy::{
    build_mf, Breakpoints, Channel, FuzzyValue, LinguisticVariable, MembershipCurve, Shape, ShapeKind, Universe,
};

// Rules
pub use rules::{load_rules_from_file, parse_rules, Connective, LoadReport, Rule, RuleSet};

// Inference
pub use engine::{
    aggregate, assemble, defuzzify, defuzzify_with, explain_all, explain_rule, fired_explanations, infer,
    DefuzzificationMethod, InferenceModel, InferenceResult, InferenceStatus, ModelSettings, RuleExplanation,
};

// Configuration
pub use config::{ChromaConfig, ConfigError, LogLevel, OutputFormat};

// Errors
pub use error::{ErrorCode, FuzzyError, FuzzyResult};
