//! Error types for Stratum
//!
//! Provides a unified error handling system across all generator crates.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for generator operations
pub type StratumResult<T> = Result<T, StratumError>;

/// Core error type for the Stratum migration generator
#[derive(Error, Debug)]
pub enum StratumError {
    // ========== Descriptor Errors ==========
    #[error("duplicate table name '{table}' (entities '{first}' and '{second}')")]
    DuplicateTableName {
        table: String,
        first: String,
        second: String,
    },

    #[error("entity discovery failed: {0}")]
    Discovery(String),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("validation failed: {0}")]
    Validation(String),

    // ========== SQL Parsing Errors ==========
    #[error("failed to parse SQL file {file}: {reason}")]
    SqlParse { file: PathBuf, reason: String },

    #[error("no previous schema found for table '{0}'")]
    MissingPriorSchema(String),

    // ========== IO Errors ==========
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    // ========== Generic Errors ==========
    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Custom(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StratumError {
    /// Create a custom error with the given message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a parse error for a specific SQL file
    pub fn sql_parse(file: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SqlParse {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recovered locally (logged, never aborts a run)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SqlParse { .. } | Self::MissingPriorSchema(_))
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for StratumError {
    fn from(err: serde_json::Error) -> Self {
        StratumError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StratumError::MissingPriorSchema("users".to_string());
        assert_eq!(err.to_string(), "no previous schema found for table 'users'");
    }

    #[test]
    fn test_duplicate_table_display() {
        let err = StratumError::DuplicateTableName {
            table: "user".to_string(),
            first: "User".to_string(),
            second: "user".to_string(),
        };
        assert!(err.to_string().contains("duplicate table name 'user'"));
    }

    #[test]
    fn test_error_is_recoverable() {
        let recoverable = StratumError::sql_parse("V1__a.sql", "bad body");
        let not_recoverable = StratumError::internal("boom");

        assert!(recoverable.is_recoverable());
        assert!(!not_recoverable.is_recoverable());
    }

    #[test]
    fn test_custom_error() {
        let err = StratumError::custom("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }
}
