//! Encrypted-field configuration loading
//!
//! Reads the `encryptedFields` document of a collection:
//!
//! ```json
//! {
//!   "fields": [
//!     {"path": "patient.ssn", "bsonType": "string", "keyId": "..."},
//!     {"path": "patient.age", "bsonType": "int"}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::observability::{log_event_with_fields, Event};

use super::compiler;
use super::errors::{CompileResult, ConfigError, ConfigResult};
use super::schema::EncryptedSchema;
use super::types::EncryptedField;

/// Declared encrypted fields of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFieldConfig {
    #[serde(default)]
    pub fields: Vec<EncryptedField>,
}

impl EncryptedFieldConfig {
    pub fn new(fields: Vec<EncryptedField>) -> Self {
        Self { fields }
    }

    /// Parses and structurally validates a configuration document.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: EncryptedFieldConfig = serde_json::from_str(content)?;
        config.validate_structure()?;
        Ok(config)
    }

    /// Reads a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;

        let field_count = config.fields.len().to_string();
        let display = path.display().to_string();
        log_event_with_fields(
            Event::EncryptedSchemaLoaded,
            &[("fields", field_count.as_str()), ("path", display.as_str())],
        );

        Ok(config)
    }

    /// Rejects empty paths and empty segments.
    ///
    /// Overlapping paths are a compile-time conflict and are not checked here.
    pub fn validate_structure(&self) -> ConfigResult<()> {
        for field in &self.fields {
            if field.segments().any(str::is_empty) {
                return Err(ConfigError::InvalidPath(field.path.clone()));
            }
        }
        Ok(())
    }

    /// Compiles the declared fields.
    pub fn compile(&self) -> CompileResult<EncryptedSchema> {
        compiler::compile(&self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::BsonType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_encrypted_fields_document() {
        let config = EncryptedFieldConfig::from_json_str(
            r#"{"fields": [
                {"path": "a.b.c", "bsonType": "string", "keyId": "deadbeef-0000-0000-0000-0000deadbeef"},
                {"path": "c", "bsonType": "array"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[1].bson_type, BsonType::Array);
        assert!(config.compile().is_ok());
    }

    #[test]
    fn test_missing_fields_is_empty_schema() {
        let config = EncryptedFieldConfig::from_json_str("{}").unwrap();
        assert!(config.fields.is_empty());
        assert!(config.compile().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_empty_segments() {
        for bad in ["", "a..b", ".a", "a."] {
            let content = format!(r#"{{"fields": [{{"path": "{}", "bsonType": "int"}}]}}"#, bad);
            let err = EncryptedFieldConfig::from_json_str(&content).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPath(ref p) if p == bad), "path {:?}", bad);
        }
    }

    #[test]
    fn test_rejects_unknown_type_name() {
        let err = EncryptedFieldConfig::from_json_str(
            r#"{"fields": [{"path": "a", "bsonType": "varchar"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson(_)));
    }

    #[test]
    fn test_conflict_surfaces_at_compile_not_load() {
        let config = EncryptedFieldConfig::from_json_str(
            r#"{"fields": [{"path": "a", "bsonType": "int"}, {"path": "a.b", "bsonType": "int"}]}"#,
        )
        .unwrap();
        assert!(config.compile().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"fields": [{{"path": "ssn", "bsonType": "string"}}]}}"#).unwrap();

        let config = EncryptedFieldConfig::load(file.path()).unwrap();
        assert_eq!(config.fields[0].path, "ssn");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EncryptedFieldConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(err.code(), "AERO_ENCRYPTED_FIELD_CONFIG_INVALID");
    }
}
