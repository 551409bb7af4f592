//! Encrypted-field schema compiler
//!
//! Turns the path trie into a predicate tree, bottom-up:
//!
//! - leaf `p` of type `T`:
//!   `Or(NotExists(p), TypeCheck(p, T))`
//! - intermediate `p` with compiled children `inner`:
//!   `Or(NotExists(p), And(Or(Not(IsObject(p)), ObjectMatch(p, And(inner))), IsNotArray(p)))`
//! - root: `And` of the top-level children, `AlwaysTrue` when nothing is declared
//!
//! Paths below an `ObjectMatch` are relative to the matched sub-object, so
//! every compiled path is a single segment.
//!
//! A scalar sitting where an intermediate object is expected cannot hide an
//! encrypted leaf and is accepted. An array there always fails:
//! `IsNotArray` is checked on its own and not inferred from `IsObject`.

use crate::matcher::{FieldPath, PredicateNode};
use crate::observability::{log_event_with_fields, Event};

use super::errors::CompileResult;
use super::schema::EncryptedSchema;
use super::trie::{PathTrie, PathTrieNode};
use super::types::{BsonType, EncryptedField};

/// Compiles declared encrypted fields into a reusable schema.
///
/// # Errors
///
/// `EncryptedFieldConflict` if two declarations are duplicates or one is a
/// prefix of the other. No partial schema is produced.
pub fn compile(fields: &[EncryptedField]) -> CompileResult<EncryptedSchema> {
    let trie = PathTrie::build(fields).map_err(|err| {
        let paths = err.paths().join(", ");
        log_event_with_fields(Event::EncryptedFieldConflict, &[("paths", paths.as_str())]);
        err
    })?;

    let predicate = compile_trie(&trie);

    let field_count = trie.len().to_string();
    let node_count = predicate.node_count().to_string();
    log_event_with_fields(
        Event::EncryptedSchemaCompiled,
        &[("fields", field_count.as_str()), ("nodes", node_count.as_str())],
    );

    Ok(EncryptedSchema::new(fields.to_vec(), trie, predicate))
}

/// Compiles a built trie. The trie is conflict-free by construction.
pub fn compile_trie(trie: &PathTrie) -> PredicateNode {
    if trie.is_empty() {
        return PredicateNode::AlwaysTrue;
    }
    PredicateNode::And(compile_children(trie.root()))
}

fn compile_children(node: &PathTrieNode) -> Vec<PredicateNode> {
    node.children()
        .map(|(name, child)| compile_node(name, child))
        .collect()
}

fn compile_node(name: &str, node: &PathTrieNode) -> PredicateNode {
    match node.leaf() {
        Some(field) => leaf_predicate(name, field.bson_type),
        None => intermediate_predicate(name, PredicateNode::And(compile_children(node))),
    }
}

/// Predicate for one terminal field: absent, or encrypted with type `expected`.
pub fn leaf_predicate(name: &str, expected: BsonType) -> PredicateNode {
    let path = FieldPath::single(name);
    PredicateNode::Or(vec![
        PredicateNode::NotExists(path.clone()),
        PredicateNode::type_check(path, expected),
    ])
}

fn intermediate_predicate(name: &str, inner: PredicateNode) -> PredicateNode {
    let path = FieldPath::single(name);
    PredicateNode::Or(vec![
        PredicateNode::NotExists(path.clone()),
        PredicateNode::And(vec![
            PredicateNode::Or(vec![
                PredicateNode::not(PredicateNode::IsObject(path.clone())),
                PredicateNode::object_match(path.clone(), inner),
            ]),
            PredicateNode::IsNotArray(path),
        ]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::to_match_expression;
    use serde_json::json;
    use uuid::Uuid;

    fn field(path: &str, t: BsonType) -> EncryptedField {
        EncryptedField::new(Uuid::nil(), path, t)
    }

    #[test]
    fn test_empty_compiles_to_always_true() {
        let schema = compile(&[]).unwrap();
        assert_eq!(schema.predicate(), &PredicateNode::AlwaysTrue);
    }

    #[test]
    fn test_leaf_predicate_shape() {
        let node = leaf_predicate("foo", BsonType::String);
        assert_eq!(
            node,
            PredicateNode::Or(vec![
                PredicateNode::NotExists(FieldPath::single("foo")),
                PredicateNode::type_check(FieldPath::single("foo"), BsonType::String),
            ])
        );
    }

    #[test]
    fn test_flat_fields_compile_to_conjunction_of_leaves() {
        let schema = compile(&[field("foo", BsonType::String), field("bar", BsonType::String)]).unwrap();
        assert_eq!(
            schema.predicate(),
            &PredicateNode::And(vec![
                leaf_predicate("bar", BsonType::String),
                leaf_predicate("foo", BsonType::String),
            ])
        );
    }

    #[test]
    fn test_nested_fields_render() {
        let schema = compile(&[field("a.b", BsonType::Int)]).unwrap();

        let leaf = json!({"$or": [
            {"b": {"$not": {"$exists": true}}},
            {"b": {"$_internalSchemaBinDataFLE2EncryptedType": [16]}}
        ]});
        let expected = json!({"$and": [
            {"$or": [
                {"a": {"$not": {"$exists": true}}},
                {"$and": [
                    {"$or": [
                        {"a": {"$not": {"$_internalSchemaType": [3]}}},
                        {"a": {"$_internalSchemaObjectMatch": {"$and": [leaf]}}}
                    ]},
                    {"a": {"$not": {"$_internalSchemaType": [4]}}}
                ]}
            ]}
        ]});

        assert_eq!(to_match_expression(schema.predicate()), expected);
    }

    #[test]
    fn test_compiled_paths_are_single_segments() {
        fn check(node: &PredicateNode) {
            use crate::matcher::NodeShape;
            match node.shape() {
                NodeShape::AlwaysTrue => {}
                NodeShape::And(c) | NodeShape::Or(c) => c.iter().for_each(check),
                NodeShape::Not(inner) => check(inner),
                NodeShape::Field(fp) => {
                    assert_eq!(fp.path.len(), 1);
                    if let Some(sub) = fp.subtree {
                        check(sub);
                    }
                }
            }
        }

        let schema = compile(&[
            field("a.b.c", BsonType::String),
            field("a.b.d", BsonType::Int),
            field("a.x.y", BsonType::Bool),
        ])
        .unwrap();
        check(schema.predicate());
    }

    #[test]
    fn test_conflict_is_reported() {
        let err = compile(&[field("a.b", BsonType::Int), field("a", BsonType::String)]).unwrap_err();
        assert_eq!(err.paths(), &["a".to_string(), "a.b".to_string()]);
    }
}
