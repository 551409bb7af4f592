//! Observability for the encrypted-field compiler
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on compilation or evaluation
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use aerodb_fle::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::EncryptedSchemaCompiled, &[("fields", "4")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an event with fields; failure events are logged at ERROR
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
