//! Encrypted-field schema subsystem
//!
//! Compiles the declared encrypted fields of a collection into a predicate
//! that every stored document must satisfy: each declared path is either
//! absent or holds an encrypted payload of the declared original type.
//!
//! # Design Principles
//!
//! - Compilation is all-or-nothing; overlapping declarations are rejected
//! - Conflict verdicts do not depend on declaration order
//! - Arrays never appear on a declared path
//! - Evaluation is pure and total, and never fails
//! - No encryption, decryption, or key handling happens here

pub mod blob;
mod compiler;
mod config;
mod errors;
mod schema;
mod trie;
mod types;

pub use blob::{BinData, BlobDecodeError, FleBlobHeader, FLE_BLOB_HEADER_LEN};
pub use compiler::{compile, compile_trie, leaf_predicate};
pub use config::EncryptedFieldConfig;
pub use errors::{CompileError, CompileResult, ConfigError, ConfigResult, ValidationFailure};
pub use schema::EncryptedSchema;
pub use trie::{PathTrie, PathTrieNode};
pub use types::{BsonType, EncryptedBinDataType, EncryptedField};
