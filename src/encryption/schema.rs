//! Compiled encrypted-field schema
//!
//! Built once by `compile`, then shared read-only. Evaluation takes `&self`
//! and touches no interior state, so an `EncryptedSchema` behind an `Arc`
//! serves any number of concurrent validators.

use serde_json::Value;

use crate::matcher::{self, PredicateNode, Resolved};

use super::blob::{self, BinData, FleBlobHeader};
use super::errors::ValidationFailure;
use super::trie::{PathTrie, PathTrieNode};
use super::types::EncryptedField;

/// A compiled, immutable encrypted-field schema.
#[derive(Debug, Clone)]
pub struct EncryptedSchema {
    fields: Vec<EncryptedField>,
    trie: PathTrie,
    predicate: PredicateNode,
}

impl EncryptedSchema {
    pub(crate) fn new(fields: Vec<EncryptedField>, trie: PathTrie, predicate: PredicateNode) -> Self {
        Self {
            fields,
            trie,
            predicate,
        }
    }

    /// Returns true if every declared path in `document` is either absent
    /// or holds a correctly typed encrypted payload.
    pub fn matches(&self, document: &Value) -> bool {
        self.predicate.matches(document)
    }

    /// Same verdict as `matches`, explaining the first rejected path.
    ///
    /// Declared paths are visited in segment order.
    pub fn check(&self, document: &Value) -> Result<(), ValidationFailure> {
        for (name, child) in self.trie.root().children() {
            check_node(document, name, child, name)?;
        }
        Ok(())
    }

    /// The compiled predicate tree
    pub fn predicate(&self) -> &PredicateNode {
        &self.predicate
    }

    /// Fields as declared
    pub fn fields(&self) -> &[EncryptedField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the predicate as a match expression
    pub fn to_match_expression(&self) -> Value {
        matcher::to_match_expression(&self.predicate)
    }
}

fn check_node(
    parent: &Value,
    name: &str,
    node: &PathTrieNode,
    dotted: &str,
) -> Result<(), ValidationFailure> {
    let value = match matcher::resolve(parent, &matcher::FieldPath::single(name)) {
        Resolved::Missing => return Ok(()),
        Resolved::ThroughArray => {
            let parent_path = dotted.rsplit_once('.').map_or("$root", |(p, _)| p);
            return Err(ValidationFailure::new(parent_path, "object", "array"));
        }
        Resolved::Present(value) => value,
    };

    if let Some(field) = node.leaf() {
        if matcher::is_encrypted_as(value, field.bson_type) {
            return Ok(());
        }
        return Err(ValidationFailure::new(
            dotted,
            format!("encrypted {}", field.bson_type),
            describe(value),
        ));
    }

    match value {
        Value::Array(_) => Err(ValidationFailure::new(dotted, "object", "array")),
        Value::Object(_) if !blob::is_binary(value) => {
            for (child_name, child) in node.children() {
                let child_path = format!("{}.{}", dotted, child_name);
                check_node(value, child_name, child, &child_path)?;
            }
            Ok(())
        }
        // Scalars cannot contain encrypted leaves
        _ => Ok(()),
    }
}

/// Short description of what a document holds, for failure messages
fn describe(value: &Value) -> String {
    if blob::is_binary(value) {
        return match BinData::from_extended_json(value) {
            Ok(bin) if bin.subtype == blob::BIN_DATA_SUBTYPE_ENCRYPT => {
                match FleBlobHeader::decode(&bin.bytes) {
                    Ok(header) => match header.original_type() {
                        Some(t) => format!("encrypted {} (scheme {})", t, header.subtype.as_u8()),
                        None => format!(
                            "encrypted value of unknown type {} (scheme {})",
                            header.original_bson_type,
                            header.subtype.as_u8()
                        ),
                    },
                    Err(e) => format!("unreadable encrypted payload ({})", e),
                }
            }
            Ok(bin) => format!("binary subtype {}", bin.subtype),
            Err(e) => format!("malformed binary ({})", e),
        };
    }

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
