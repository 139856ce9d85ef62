//! Configuration System for chromafuzz
//!
//! Provides a flexible configuration system supporting:
//! - TOML configuration files
//! - Environment variable overrides
//! - Named rule sets
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./chromafuzz.toml` - Project-local configuration
//! 2. `~/.config/chromafuzz/config.toml` - User configuration (XDG)
//! 3. `~/.chromafuzz/config.toml` - User configuration (legacy)
//! 4. `/etc/chromafuzz/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `CHROMAFUZZ_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `CHROMAFUZZ_FORMAT` - Default output format (text, json)
//! - `CHROMAFUZZ_SHAPE` - Membership function shape (triangular, trapezoidal)
//! - `CHROMAFUZZ_RULES_DIR` - Directory holding rule-set files
//! - `CHROMAFUZZ_RULE_SET` - Name of the default rule set
//! - `CHROMAFUZZ_WORKERS` - Threads for rule explanations (0 = auto)
//!
//! # Example Configuration
//!
//! ```toml
//! # chromafuzz.toml
//!
//! [general]
//! format = "text"
//! log_level = "normal"
//!
//! [model]
//! shape = "trapezoidal"
//! defuzzification = "centroid"
//!
//! [rules]
//! dir = "rules_data"
//! default = "rules_60"
//!
//! [[rules.sets]]
//! name = "mine"
//! label = "Hand-tuned"
//! file = "mine.json"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::engine::{DefuzzificationMethod, ModelSettings};
use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::fuzzy::membership::{INPUT_SHOULDER, OUTPUT_SHOULDER};
use crate::fuzzy::ShapeKind;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChromaConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Membership and defuzzification settings
    pub model: ModelConfig,
    /// Rule-set locations
    pub rules: RulesConfig,
    /// Explanation settings
    pub diagnostics: DiagnosticsConfig,
}

/// General configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format
    pub format: OutputFormat,
    /// Logging level
    pub log_level: LogLevel,
}

/// Model configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub shape: ShapeKind,
    /// Input trapezoid half-plateau
    pub input_shoulder: f64,
    /// Output trapezoid half-plateau
    pub output_shoulder: f64,
    pub defuzzification: DefuzzificationMethod,
    /// Vocabulary file replacing the compiled-in catalog
    pub catalog: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Triangular,
            input_shoulder: INPUT_SHOULDER,
            output_shoulder: OUTPUT_SHOULDER,
            defuzzification: DefuzzificationMethod::Centroid,
            catalog: None,
        }
    }
}

/// A named rule-set file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetEntry {
    pub name: String,
    /// Human-readable label for listings
    #[serde(default)]
    pub label: String,
    /// File name, relative to `rules.dir` unless absolute
    pub file: PathBuf,
}

impl RuleSetEntry {
    fn new(name: &str, label: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            file: PathBuf::from(file),
        }
    }
}

/// Rule-set configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Directory holding rule-set files
    pub dir: PathBuf,
    /// Set used when none is named
    pub default: String,
    pub sets: Vec<RuleSetEntry>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("rules_data"),
            default: "rules_100".to_string(),
            sets: vec![
                RuleSetEntry::new("rules_100", "Cobertura 100% (64 reglas)", "rules_100.json"),
                RuleSetEntry::new("rules_60", "Cobertura 60% (38 reglas)", "rules_60.json"),
                RuleSetEntry::new("rules_30", "Cobertura 30% (19 reglas)", "rules_30.json"),
            ],
        }
    }
}

/// Diagnostics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Worker threads for rule explanations (0 = one per CPU)
    pub workers: usize,
}

// ============================================================================
// Enums
// ============================================================================

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Most verbose tracing level that gets printed
    pub fn max_level(&self) -> tracing::Level {
        match self {
            LogLevel::Quiet => tracing::Level::ERROR,
            LogLevel::Normal => tracing::Level::WARN,
            LogLevel::Verbose => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }

    /// Adjust by `-v` / `-q` counts from the command line
    pub fn adjusted(self, verbose: u8, quiet: u8) -> Self {
        let rank = self as i16 + i16::from(verbose) - i16::from(quiet);
        match rank.clamp(0, 3) {
            0 => LogLevel::Quiet,
            1 => LogLevel::Normal,
            2 => LogLevel::Verbose,
            _ => LogLevel::Debug,
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl ChromaConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the first file found, then apply
    /// environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Config file search paths, in priority order
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./chromafuzz.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("chromafuzz").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".chromafuzz").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/chromafuzz/config.toml"));

        paths
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("CHROMAFUZZ_LOG_LEVEL").and_then(|v| LogLevel::from_str(&v)) {
            self.general.log_level = level;
        }

        if let Some(format) = lookup("CHROMAFUZZ_FORMAT").and_then(|v| OutputFormat::from_str(&v)) {
            self.general.format = format;
        }

        if let Some(shape) = lookup("CHROMAFUZZ_SHAPE").and_then(|v| ShapeKind::from_str(&v)) {
            self.model.shape = shape;
        }

        if let Some(dir) = lookup("CHROMAFUZZ_RULES_DIR") {
            self.rules.dir = PathBuf::from(dir);
        }

        if let Some(name) = lookup("CHROMAFUZZ_RULE_SET") {
            self.rules.default = name;
        }

        if let Some(workers) = lookup("CHROMAFUZZ_WORKERS").and_then(|v| v.parse::<usize>().ok()) {
            self.diagnostics.workers = workers;
        }
    }

    /// Look up a rule set by name
    pub fn rule_set(&self, name: &str) -> Result<&RuleSetEntry, ConfigError> {
        self.rules
            .sets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownRuleSet(name.to_string()))
    }

    /// Resolve a rule set's file path. `None` picks the default set.
    pub fn rule_set_path(&self, name: Option<&str>) -> Result<PathBuf, ConfigError> {
        let entry = self.rule_set(name.unwrap_or(&self.rules.default))?;
        if entry.file.is_absolute() {
            Ok(entry.file.clone())
        } else {
            Ok(self.rules.dir.join(&entry.file))
        }
    }

    /// Model settings from the `[model]` section
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            shape: self.model.shape,
            input_shoulder: self.model.input_shoulder,
            output_shoulder: self.model.output_shoulder,
            defuzzification: self.model.defuzzification,
        }
    }

    /// The configured catalog, or the canonical one
    pub fn catalog(&self) -> FuzzyResult<Catalog> {
        match &self.model.catalog {
            Some(path) => Catalog::load_from_file(path),
            None => Ok(Catalog::canonical()),
        }
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))
    }

    /// Generate a commented default configuration file
    pub fn default_config_content() -> &'static str {
        r#"# chromafuzz configuration file

[general]
# Output format: text, json
format = "text"
# Logging level: quiet, normal, verbose, debug
log_level = "normal"

[model]
# Membership function shape: triangular, trapezoidal
shape = "triangular"
# Trapezoid plateau half-widths
input_shoulder = 20.0
output_shoulder = 5.0
# Defuzzification: centroid, bisector, mom
defuzzification = "centroid"
# Vocabulary table replacing the built-in one (TOML or JSON)
# catalog = "catalog.toml"

[rules]
# Directory holding rule-set files
dir = "rules_data"
# Rule set used when none is given
default = "rules_100"

[[rules.sets]]
name = "rules_100"
label = "Cobertura 100% (64 reglas)"
file = "rules_100.json"

[[rules.sets]]
name = "rules_60"
label = "Cobertura 60% (38 reglas)"
file = "rules_60.json"

[[rules.sets]]
name = "rules_30"
label = "Cobertura 30% (19 reglas)"
file = "rules_30.json"

[diagnostics]
# Threads for --explain (0 = one per CPU)
workers = 0
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    IoError(PathBuf, String),
    ParseError(PathBuf, String),
    SerializeError(String),
    UnknownRuleSet(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "IO error reading {}: {}", path.display(), msg)
            }
            ConfigError::ParseError(path, msg) => {
                write!(f, "Parse error in {}: {}", path.display(), msg)
            }
            ConfigError::SerializeError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            ConfigError::UnknownRuleSet(name) => {
                write!(f, "Unknown rule set: {}", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for FuzzyError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::IoError(..) => ErrorCode::ConfigNotFound,
            ConfigError::ParseError(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::SerializeError(_) => ErrorCode::ConfigError,
            ConfigError::UnknownRuleSet(_) => ErrorCode::UnknownRuleSet,
        };
        let fuzzy = FuzzyError::config(err.to_string()).with_code(code);
        match err {
            ConfigError::UnknownRuleSet(_) => fuzzy.with_hint("run `chromafuzz rules` to list configured sets"),
            _ => fuzzy,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
