//! Predicate evaluation
//!
//! Evaluation is total: any document, however malformed, yields a boolean.
//! No coercion, no errors, no side effects.

use serde_json::Value;

use crate::encryption::{blob, BsonType, FleBlobHeader};

use super::expression::{FieldPath, PredicateNode};

/// Outcome of walking a dotted path through a document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// Some segment is absent or null, or the walk hit a scalar
    Missing,
    /// The full path resolved to a non-null value
    Present(&'a Value),
    /// The walk had to step into an array before the last segment
    ThroughArray,
}

/// Walks `path` through `document` one segment at a time.
pub fn resolve<'a>(document: &'a Value, path: &FieldPath) -> Resolved<'a> {
    let mut current = document;

    for segment in path.segments() {
        match current {
            Value::Array(_) => return Resolved::ThroughArray,
            Value::Object(map) if !blob::is_binary(current) => match map.get(segment) {
                None | Some(Value::Null) => return Resolved::Missing,
                Some(next) => current = next,
            },
            // Scalars and binaries have no fields
            _ => return Resolved::Missing,
        }
    }

    Resolved::Present(current)
}

/// Evaluates `node` against `document`.
pub fn evaluate(node: &PredicateNode, document: &Value) -> bool {
    match node {
        PredicateNode::AlwaysTrue => true,
        PredicateNode::And(children) => children.iter().all(|c| evaluate(c, document)),
        PredicateNode::Or(children) => children.iter().any(|c| evaluate(c, document)),
        PredicateNode::Not(inner) => !evaluate(inner, document),
        PredicateNode::NotExists(path) => matches!(resolve(document, path), Resolved::Missing),
        PredicateNode::TypeCheck { path, expected } => match resolve(document, path) {
            Resolved::Present(value) => is_encrypted_as(value, *expected),
            _ => false,
        },
        PredicateNode::IsObject(path) => match resolve(document, path) {
            Resolved::Present(value) => is_object(value),
            _ => false,
        },
        PredicateNode::IsNotArray(path) => match resolve(document, path) {
            Resolved::Present(value) => !value.is_array(),
            Resolved::Missing => true,
            Resolved::ThroughArray => false,
        },
        PredicateNode::ObjectMatch { path, subtree } => match resolve(document, path) {
            Resolved::Present(value) if is_object(value) => evaluate(subtree, value),
            _ => false,
        },
    }
}

/// An object in the document sense: binaries are objects only in their
/// Extended JSON spelling.
fn is_object(value: &Value) -> bool {
    value.is_object() && !blob::is_binary(value)
}

/// True if `value` is an encrypted binary of a stored FLE2 scheme whose
/// header records `expected` as the original type.
pub fn is_encrypted_as(value: &Value, expected: BsonType) -> bool {
    match FleBlobHeader::decode_value(value) {
        Ok(header) => {
            header.subtype.is_stored_fle2_value() && header.original_bson_type == expected.as_byte()
        }
        Err(_) => false,
    }
}

impl PredicateNode {
    /// Evaluates this tree against `document`
    pub fn matches(&self, document: &Value) -> bool {
        evaluate(self, document)
    }
}
