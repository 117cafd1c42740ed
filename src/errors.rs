// src/errors.rs
use thiserror::Error;

use crate::models::core::{CanonicalField, RecordKey};

/// A record whose source shape could not produce a required canonical field.
/// The record goes to the exceptions channel; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key}: {field}: {reason}")]
pub struct SchemaMismatchError {
    pub key: RecordKey,
    /// Source column (or canonical field) the failure is about.
    pub field: String,
    pub reason: String,
}

impl SchemaMismatchError {
    pub fn new(key: RecordKey, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Reason text as written to the exceptions table.
    pub fn reason_text(&self) -> String {
        format!("{}: {}", self.field, self.reason)
    }
}

/// A non-empty input value that normalized to empty. Non-fatal; the field
/// is treated as absent in scoring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} value '{raw_value}' {reason}; treated as absent")]
pub struct NormalizationWarning {
    pub field: CanonicalField,
    pub raw_value: String,
    pub reason: &'static str,
}

/// Invalid matching configuration. Fatal, raised before any record is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("weight for {field} must be finite and non-negative, got {weight}")]
    InvalidWeight { field: &'static str, weight: f64 },

    #[error("at least one field weight must be positive")]
    ZeroTotalWeight,

    #[error("match threshold must lie in [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("weak link margin must lie in [0, 1], got {0}")]
    MarginOutOfRange(f64),

    #[error("parallelism must be at least 1")]
    ZeroParallelism,

    #[error("unknown blocking strategy '{0}' (expected soundex_birth_year, extended or exhaustive)")]
    UnknownBlockingStrategy(String),

    #[error("environment variable {var} has invalid value '{value}'")]
    InvalidEnvValue { var: String, value: String },

    #[error("scorer model is invalid: {0}")]
    InvalidModel(String),
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum DedupeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("scoring worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DedupeResult<T> = Result<T, DedupeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_reason_cites_field() {
        let err = SchemaMismatchError::new(
            RecordKey::new("hospital", "7"),
            "address",
            "not a JSON object",
        );
        assert_eq!(err.reason_text(), "address: not a JSON object");
        assert_eq!(err.to_string(), "hospital/7: address: not a JSON object");
    }

    #[test]
    fn test_configuration_error_converts_into_dedupe_error() {
        let err: DedupeError = ConfigurationError::ThresholdOutOfRange(1.5).into();
        assert!(matches!(
            err,
            DedupeError::Configuration(ConfigurationError::ThresholdOutOfRange(_))
        ));
        assert!(err.to_string().contains("1.5"));
    }
}
