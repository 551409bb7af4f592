//! aerodb-fle - Encrypted-field schema compiler for aerodb collections
//!
//! Compiles a collection's declared encrypted fields into an implicit
//! validator and evaluates it against documents.

pub mod encryption;
pub mod matcher;
pub mod observability;
