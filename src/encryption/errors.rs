//! Encrypted-field error types
//!
//! Error codes:
//! - AERO_ENCRYPTED_FIELD_CONFLICT (REJECT)
//! - AERO_ENCRYPTED_FIELD_CONFIG_INVALID (REJECT)
//!
//! Document validation has no error code; `ValidationFailure` only explains
//! a negative verdict.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type for loading an encrypted-field configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Raised when a set of encrypted-field declarations cannot be compiled.
///
/// Compilation is all-or-nothing: no predicate exists for a schema that
/// produced this error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Two declarations name the same path, or one is a prefix of the other
    #[error("Encrypted fields conflict: {}", .paths.join(", "))]
    EncryptedFieldConflict { paths: Vec<String> },
}

impl CompileError {
    pub(crate) fn conflict(existing: impl Into<String>, incoming: impl Into<String>) -> Self {
        CompileError::EncryptedFieldConflict {
            paths: vec![existing.into(), incoming.into()],
        }
    }

    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::EncryptedFieldConflict { .. } => "AERO_ENCRYPTED_FIELD_CONFLICT",
        }
    }

    /// Returns the conflicting paths
    pub fn paths(&self) -> &[String] {
        match self {
            CompileError::EncryptedFieldConflict { paths } => paths,
        }
    }
}

/// Raised when an encrypted-field configuration cannot be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read encrypted fields from '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not a valid encryptedFields document
    #[error("Invalid encrypted fields document: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A declared path is empty or contains an empty segment
    #[error("Invalid encrypted field path '{0}'")]
    InvalidPath(String),
}

impl ConfigError {
    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        "AERO_ENCRYPTED_FIELD_CONFIG_INVALID"
    }
}

/// First declared path at which a document breaks the encrypted-field schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{path}': expected {expected}, got {actual}")]
pub struct ValidationFailure {
    /// Dotted path of the offending value
    pub path: String,
    /// What the schema requires there
    pub expected: String,
    /// What the document holds there
    pub actual: String,
}

impl ValidationFailure {
    pub fn new(path: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_names_both_paths() {
        let err = CompileError::conflict("a", "a.b");
        assert_eq!(err.paths(), &["a".to_string(), "a.b".to_string()]);
        assert_eq!(err.code(), "AERO_ENCRYPTED_FIELD_CONFLICT");

        let display = err.to_string();
        assert!(display.contains("a, a.b"));
    }

    #[test]
    fn test_config_error_code() {
        let err = ConfigError::InvalidPath("a..b".into());
        assert_eq!(err.code(), "AERO_ENCRYPTED_FIELD_CONFIG_INVALID");
        assert!(err.to_string().contains("a..b"));
    }

    #[test]
    fn test_validation_failure_display() {
        let failure = ValidationFailure::new("a.b.c", "encrypted string", "string");
        assert_eq!(failure.to_string(), "field 'a.b.c': expected encrypted string, got string");
    }
}
