//! Structured Error Handling for chromafuzz
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured error reports (JSON-friendly)
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - Parse errors - rule-set or catalog files that are not valid JSON/TOML
//! - Model errors - malformed universes, catalogs and inference failures
//! - Rule errors - unknown labels and rejected rule records
//! - Validation errors - out-of-range model settings
//! - Config errors - configuration files and settings
//!
//! Core operations resolve most failures locally (clamped breakpoints,
//! dropped rules, undefined results). A `FuzzyError` only escapes from
//! file-level loading and from the fallible `try_*` entry points.
//!
//! # Example
//!
//! ```rust,ignore
//! use chromafuzz::error::{FuzzyError, ErrorCode};
//!
//! fn check_channel(value: f64) -> Result<(), FuzzyError> {
//!     if !value.is_finite() {
//!         return Err(FuzzyError::numeric("channel value is not finite")
//!             .with_context("value", value.to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Parse errors (1xxx)
    /// Generic parse error
    ParseError = 1000,
    /// Invalid JSON document
    InvalidJson = 1001,
    /// Invalid TOML document
    InvalidToml = 1002,

    // Model errors (2xxx)
    /// Generic model error
    ModelError = 2000,
    /// Universe with a bad range or step
    InvalidUniverse = 2001,
    /// Vocabulary table is empty or inconsistent
    InvalidCatalog = 2002,
    /// Non-finite value produced or consumed during inference
    NumericFailure = 2003,
    /// Curves of different lengths combined
    CurveMismatch = 2004,

    // Rule errors (3xxx)
    /// Label not present in the variable's vocabulary
    UnknownLabel = 3001,
    /// Rule-set file not found
    RuleSetNotFound = 3003,

    // Validation errors (5xxx)
    /// Generic validation error
    ValidationError = 5000,
    /// Setting outside its allowed range
    InvalidValue = 5001,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Unknown named rule set
    UnknownRuleSet = 7003,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
    /// File access denied
    FileAccessDenied = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidJson => "Invalid JSON",
            ErrorCode::InvalidToml => "Invalid TOML",

            ErrorCode::ModelError => "Model error",
            ErrorCode::InvalidUniverse => "Invalid universe",
            ErrorCode::InvalidCatalog => "Invalid catalog",
            ErrorCode::NumericFailure => "Numeric failure",
            ErrorCode::CurveMismatch => "Curve length mismatch",

            ErrorCode::UnknownLabel => "Unknown label",
            ErrorCode::RuleSetNotFound => "Rule set not found",

            ErrorCode::ValidationError => "Validation error",
            ErrorCode::InvalidValue => "Invalid value",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::UnknownRuleSet => "Unknown rule set",

            ErrorCode::InternalError => "Internal error",
            ErrorCode::FileAccessDenied => "File access denied",
        }
    }

    /// Error category name, derived from the code range
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "parse",
            2 => "model",
            3 => "rules",
            5 => "validation",
            7 => "config",
            _ => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}: {}", self.code(), self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for chromafuzz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FuzzyError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    /// Create a model error
    pub fn model(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelError, message)
    }

    /// Create an invalid universe error
    pub fn invalid_universe(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidUniverse, message)
    }

    /// Create an invalid catalog error
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCatalog, message)
    }

    /// Create a numeric failure error
    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NumericFailure, message)
    }

    /// Create a curve length mismatch error
    pub fn curve_mismatch(left: usize, right: usize) -> Self {
        Self::new(
            ErrorCode::CurveMismatch,
            format!("cannot combine curves of length {} and {}", left, right),
        )
    }

    /// Create an unknown label error
    pub fn unknown_label(variable: &str, label: &str) -> Self {
        Self::new(
            ErrorCode::UnknownLabel,
            format!("'{}' is not a term of variable {}", label, variable),
        )
        .with_context("variable", variable)
        .with_context("label", label)
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Check whether the error comes from bad user-supplied data
    /// (files, labels, values) rather than from the engine itself
    pub fn is_input_error(&self) -> bool {
        matches!(self.code.category(), "parse" | "rules" | "validation" | "config")
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for FuzzyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FuzzyError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for FuzzyError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::RuleSetNotFound,
            ErrorKind::PermissionDenied => ErrorCode::FileAccessDenied,
            _ => ErrorCode::InternalError,
        };
        FuzzyError::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for FuzzyError {
    fn from(err: serde_json::Error) -> Self {
        FuzzyError::parse(err.to_string())
            .with_code(ErrorCode::InvalidJson)
            .with_context("format", "JSON")
            .with_context("line", err.line().to_string())
    }
}

impl From<toml::de::Error> for FuzzyError {
    fn from(err: toml::de::Error) -> Self {
        FuzzyError::parse(err.to_string())
            .with_code(ErrorCode::InvalidToml)
            .with_context("format", "TOML")
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using FuzzyError
pub type FuzzyResult<T> = Result<T, FuzzyError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a FuzzyError with context from the current location
#[macro_export]
macro_rules! fuzzy_error {
    ($code:expr, $msg:expr) => {
        $crate::error::FuzzyError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::FuzzyError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! fuzzy_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::fuzzy_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::fuzzy_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! fuzzy_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::fuzzy_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::fuzzy_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FuzzyError::validation("test error");
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "test error");
    }

    #[test]
    fn test_unknown_label_carries_context() {
        let err = FuzzyError::unknown_label("Rojo", "Altisimo");
        assert_eq!(err.code, ErrorCode::UnknownLabel);
        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.fields.get("variable"), Some(&"Rojo".to_string()));
        assert_eq!(ctx.fields.get("label"), Some(&"Altisimo".to_string()));
        assert!(err.message.contains("Altisimo"));
    }

    #[test]
    fn test_error_with_cause() {
        let err = FuzzyError::model("cannot assemble")
            .with_cause("catalog is empty")
            .with_cause("no output terms");

        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.causes.len(), 2);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(ErrorCode::InvalidJson.category(), "parse");
        assert_eq!(ErrorCode::NumericFailure.category(), "model");
        assert_eq!(ErrorCode::UnknownLabel.category(), "rules");
        assert_eq!(ErrorCode::UnknownRuleSet.category(), "config");
        assert_eq!(ErrorCode::InternalError.category(), "internal");
    }

    #[test]
    fn test_is_input_error() {
        assert!(FuzzyError::unknown_label("Azul", "x").is_input_error());
        assert!(FuzzyError::parse("bad json").is_input_error());
        assert!(!FuzzyError::numeric("NaN").is_input_error());
        assert!(!FuzzyError::internal("bug").is_input_error());
    }

    #[test]
    fn test_error_to_json() {
        let err = FuzzyError::numeric("centroid is NaN");
        let json = err.to_json();
        assert!(json.contains("NUMERIC_FAILURE"));
        assert!(json.contains("centroid is NaN"));
    }

    #[test]
    fn test_error_display() {
        let err = FuzzyError::parse("expected array")
            .at("rules_100.json:1")
            .with_cause("found object")
            .with_hint("Rule sets are JSON arrays of records");

        let display = err.to_string();
        assert!(display.contains("[1000]"));
        assert!(display.contains("expected array"));
        assert!(display.contains("rules_100.json:1"));
        assert!(display.contains("found object"));
        assert!(display.contains("Rule sets are JSON arrays"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("[{");
        let err: FuzzyError = parse.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidJson);
        assert!(err.is_input_error());
    }

    #[test]
    fn test_io_not_found_maps_to_rule_set_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FuzzyError = io.into();
        assert_eq!(err.code, ErrorCode::RuleSetNotFound);
    }

    #[test]
    fn test_macros_record_location() {
        fn check(v: f64) -> FuzzyResult<f64> {
            fuzzy_ensure!(v.is_finite(), ErrorCode::NumericFailure, "value {} is not finite", v);
            Ok(v)
        }

        assert!(check(1.0).is_ok());
        let err = check(f64::NAN).unwrap_err();
        assert_eq!(err.code, ErrorCode::NumericFailure);
        let loc = err.context.unwrap().location.unwrap();
        assert!(loc.contains("error.rs"));
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::UnknownLabel.to_string(), "E3001: Unknown label");
    }
}
