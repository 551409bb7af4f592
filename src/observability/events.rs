//! Observable events emitted by the encrypted-field schema compiler

use std::fmt;

/// Events emitted while turning an encrypted-field declaration into a predicate.
///
/// Document evaluation emits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Encrypted-field schema file loaded from disk
    EncryptedSchemaLoaded,
    /// Encrypted-field schema compiled into a predicate tree
    EncryptedSchemaCompiled,
    /// Two declared encrypted paths overlap
    EncryptedFieldConflict,
}

impl Event {
    /// Returns the event name used as the log `event` key
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::EncryptedSchemaLoaded => "ENCRYPTED_SCHEMA_LOADED",
            Event::EncryptedSchemaCompiled => "ENCRYPTED_SCHEMA_COMPILED",
            Event::EncryptedFieldConflict => "ENCRYPTED_FIELD_CONFLICT",
        }
    }

    /// Returns true if this event reports a rejected schema
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::EncryptedFieldConflict)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
